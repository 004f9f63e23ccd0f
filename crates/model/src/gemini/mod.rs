//! Google Gemini provider.
//!
//! The Generative Language API names the assistant role `model`, has no
//! system role, and addresses the model in the URL path rather than the
//! body.

use crate::http::{self, HttpProvider};
use reqwest::Client;
use sbcore::{AdapterBase, AdapterConfig, ProviderId, Result};
pub use request::{Content, GenerationConfig, InlineData, Part, Request};

mod provider;
mod request;

/// The Generative Language API root.
pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The Gemini adapter.
#[derive(Clone, Debug)]
pub struct Gemini {
    base: AdapterBase,
    http: HttpProvider,
    /// Keyed by the URL query alone, so it carries no auth header.
    stream: HttpProvider,
    root: String,
}

impl Gemini {
    /// Create an adapter targeting the Google API, or the configured root.
    pub fn new(client: Client, config: AdapterConfig) -> Result<Self> {
        let root = config
            .base_url
            .as_deref()
            .unwrap_or(BASE_URL)
            .trim_end_matches('/')
            .to_owned();
        let stream = HttpProvider::no_auth(client.clone(), &root);
        let http = HttpProvider::custom_header(client, "x-goog-api-key", &config.api_key, &root)?;
        Ok(Self {
            base: AdapterBase::new(ProviderId::Google, config),
            http,
            stream,
            root,
        })
    }

    /// The one-shot endpoint for a model.
    pub fn generate_url(&self, model: &str) -> String {
        http::join(&self.root, &format!("models/{model}:generateContent"))
    }

    /// The SSE endpoint for a model.
    pub fn stream_url(&self, model: &str) -> String {
        http::join(
            &self.root,
            &format!(
                "models/{model}:streamGenerateContent?alt=sse&key={}",
                self.base.api_key()
            ),
        )
    }

    /// The shared adapter state.
    pub fn base(&self) -> &AdapterBase {
        &self.base
    }
}
