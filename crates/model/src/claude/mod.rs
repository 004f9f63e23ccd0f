//! Claude (Anthropic) provider.
//!
//! Implements the Anthropic Messages API, which differs from the OpenAI
//! chat completions format in message structure, error bodies, and
//! streaming events.

use crate::http::{self, HttpProvider};
use reqwest::Client;
use sbcore::{AdapterBase, AdapterConfig, ProviderId, Result};
use std::time::Duration;
pub use {
    provider::EVENT_TIMEOUT,
    request::{Block, ClaudeContent, ClaudeMessage, Request, Source},
    stream::{CumulativeText, StreamFailure},
};

mod provider;
mod request;
mod stream;

/// The Anthropic Messages API endpoint.
pub const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// The Anthropic API version header value.
const API_VERSION: &str = "2023-06-01";

/// Output token limit sent when none is configured.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Models that reject document blocks.
pub const LEGACY_MODELS: [&str; 2] = ["claude-3-haiku-20240307", "claude-3-sonnet-20240229"];

/// Whether a model accepts document blocks.
pub fn supports_documents(model: &str) -> bool {
    !LEGACY_MODELS.contains(&model)
}

/// Backoff for overloaded responses on the send path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Wait after the first failure; each later wait doubles.
    pub base: Duration,
}

impl RetryPolicy {
    /// The wait after the `attempt`th failure (1-based): `base * 2^(attempt - 1)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base: Duration::from_secs(1),
        }
    }
}

/// The Claude adapter.
#[derive(Clone, Debug)]
pub struct Claude {
    base: AdapterBase,
    http: HttpProvider,
    retry: RetryPolicy,
    event_timeout: Duration,
}

impl Claude {
    /// Create an adapter targeting the Anthropic API, or the configured
    /// endpoint root.
    pub fn new(client: Client, config: AdapterConfig) -> Result<Self> {
        let endpoint = match config.base_url.as_deref() {
            Some(base) => http::join(base, "messages"),
            None => ENDPOINT.to_owned(),
        };
        let http = HttpProvider::custom_header(client, "x-api-key", &config.api_key, &endpoint)?
            .with_header("anthropic-version", API_VERSION)?;
        Ok(Self {
            base: AdapterBase::new(ProviderId::Claude, config),
            http,
            retry: RetryPolicy::default(),
            event_timeout: provider::EVENT_TIMEOUT,
        })
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the longest wait for the next stream event.
    pub fn with_event_timeout(mut self, timeout: Duration) -> Self {
        self.event_timeout = timeout;
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
