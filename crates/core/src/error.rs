//! Error taxonomy for the adapter layer.

use reqwest::{Response, StatusCode};
use serde_json::Value;

/// Result alias used across the adapter layer.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by adapters, the factory, and the transport.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-2xx response from a vendor, wrapped by the shared helper.
    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// Non-2xx response from the Anthropic Messages API.
    #[error("Anthropic API error: {status} - {message}")]
    Claude {
        status: u16,
        message: String,
        /// The typed `error.type` from the body, if any.
        kind: Option<String>,
    },

    /// The factory has no adapter registered under this id.
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// A fatal, already classified stream failure.
    #[error("{0}")]
    Stream(String),

    /// No data arrived within the allowed window.
    #[error("{provider} did not respond within {secs}s")]
    Timeout { provider: String, secs: u64 },

    /// Invalid configuration (missing key, bad header value, ...).
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

impl Error {
    /// The HTTP status carried by this error, if it came from a vendor.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Claude { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Best-effort error message from a vendor error body.
///
/// Looks at `error.message`, then `message`, then falls back to the
/// canonical status text.
pub fn error_message(body: &Value, status: StatusCode) -> String {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
        .map(str::to_owned)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_owned()
        })
}

/// Parse a response body as JSON, substituting `{}` when it is not JSON.
pub fn error_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::Object(Default::default()))
}

/// Turn a non-2xx response into [`Error::Api`].
pub async fn api_error(provider: &str, response: Response) -> Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    tracing::trace!("{provider} error body: {text}");
    let body = error_body(&text);
    Error::Api {
        provider: provider.to_owned(),
        status: status.as_u16(),
        message: error_message(&body, status),
    }
}
