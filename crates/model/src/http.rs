//! Shared HTTP transport for provider adapters.
//!
//! `HttpProvider` wraps a `reqwest::Client` with pre-configured headers and
//! endpoint URL. Provides `json()` for one-shot calls and `open_stream()`
//! for event streams; both wrap non-2xx responses with the provider name.

use reqwest::{
    Client, Method, RequestBuilder, Response,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use sbcore::{Result, api_error};
use serde::{Serialize, de::DeserializeOwned};

/// Shared HTTP transport.
///
/// Holds a `reqwest::Client`, pre-built headers (auth + content-type),
/// and the target endpoint URL.
#[derive(Clone, Debug)]
pub struct HttpProvider {
    client: Client,
    headers: HeaderMap,
    endpoint: String,
}

impl HttpProvider {
    /// Create a provider with Bearer token authentication.
    pub fn bearer(client: Client, key: &str, endpoint: &str) -> Result<Self> {
        let mut headers = json_headers();
        headers.insert(header::AUTHORIZATION, format!("Bearer {key}").parse()?);
        Ok(Self {
            client,
            headers,
            endpoint: endpoint.to_owned(),
        })
    }

    /// Create a provider without authentication.
    pub fn no_auth(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            headers: json_headers(),
            endpoint: endpoint.to_owned(),
        }
    }

    /// Create a provider with a custom header for authentication.
    ///
    /// Used by providers that don't use Bearer tokens (Anthropic uses
    /// `x-api-key`, Google `x-goog-api-key`).
    pub fn custom_header(
        client: Client,
        header_name: &'static str,
        header_value: &str,
        endpoint: &str,
    ) -> Result<Self> {
        Self::no_auth(client, endpoint).with_header(header_name, header_value)
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Result<Self> {
        self.headers
            .insert(HeaderName::from_static(name), value.parse::<HeaderValue>()?);
        Ok(self)
    }

    /// The same transport aimed at another endpoint.
    pub fn at(&self, endpoint: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            headers: self.headers.clone(),
            endpoint: endpoint.into(),
        }
    }

    /// A POST request to the endpoint with the configured headers.
    pub fn request(&self, body: &impl Serialize) -> RequestBuilder {
        self.request_with(self.headers.clone(), body)
    }

    fn request_with(&self, headers: HeaderMap, body: &impl Serialize) -> RequestBuilder {
        if let Ok(body) = serde_json::to_string(body) {
            tracing::trace!("request: {body}");
        }
        self.client
            .request(Method::POST, &self.endpoint)
            .headers(headers)
            .json(body)
    }

    /// Send a request and return the raw response, whatever its status.
    pub async fn send(&self, body: &impl Serialize) -> Result<Response> {
        Ok(self.request(body).send().await?)
    }

    /// Send a non-streaming request and deserialize the response as JSON.
    pub async fn json<T: DeserializeOwned>(&self, provider: &str, body: &impl Serialize) -> Result<T> {
        let response = self.send(body).await?;
        if !response.status().is_success() {
            return Err(api_error(provider, response).await);
        }

        let text = response.text().await?;
        tracing::trace!("response: {text}");
        serde_json::from_str(&text).map_err(Into::into)
    }

    /// Send a streaming request and return the raw response, whatever its
    /// status.
    pub async fn send_stream(&self, body: &impl Serialize) -> Result<Response> {
        let mut headers = self.headers.clone();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        Ok(self.request_with(headers, body).send().await?)
    }

    /// Open an event stream.
    pub async fn open_stream(&self, provider: &str, body: &impl Serialize) -> Result<Response> {
        let response = self.send_stream(body).await?;
        if !response.status().is_success() {
            return Err(api_error(provider, response).await);
        }
        Ok(response)
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get a reference to the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// Join an endpoint root and a path without doubling slashes.
pub fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
