//! OpenAI Responses API provider.
//!
//! Takes a flat `input` array instead of chat messages and streams
//! semantic events discriminated by their `type` field.

use crate::http::{self, HttpProvider};
use reqwest::Client;
use sbcore::{AdapterBase, AdapterConfig, ProviderId, Result};
use std::time::Duration;
pub use {
    provider::STREAM_CEILING,
    request::{InputContent, InputItem, InputPart, Request},
};

mod provider;
mod request;

/// The Responses API endpoint.
pub const ENDPOINT: &str = "https://api.openai.com/v1/responses";

/// The Responses adapter.
#[derive(Clone, Debug)]
pub struct Responses {
    base: AdapterBase,
    http: HttpProvider,
    ceiling: Duration,
}

impl Responses {
    /// Create an adapter targeting the OpenAI API, or the configured root.
    pub fn new(client: Client, config: AdapterConfig) -> Result<Self> {
        let endpoint = match config.base_url.as_deref() {
            Some(base) => http::join(base, "responses"),
            None => ENDPOINT.to_owned(),
        };
        let http = HttpProvider::bearer(client, &config.api_key, &endpoint)?;
        Ok(Self {
            base: AdapterBase::new(ProviderId::OpenAiResponses, config),
            http,
            ceiling: STREAM_CEILING,
        })
    }

    /// Replace the hard ceiling for a whole streamed response.
    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        self.http.endpoint()
    }

    /// The shared adapter state.
    pub fn base(&self) -> &AdapterBase {
        &self.base
    }
}
