//! SSE event parsing for the Anthropic streaming Messages API.
//!
//! Anthropic streaming events differ from OpenAI's format:
//! - `message_start` carries the model and input usage
//! - `content_block_delta` carries incremental text
//! - `message_delta` carries the stop reason and output usage
//! - `message_stop` ends the message
//! - `error` reports a failure mid-stream

use compact_str::CompactString;
use sbcore::Error;
use serde::Deserialize;

/// A raw SSE event from the Anthropic streaming API.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Initial message metadata.
    MessageStart { message: MessageMeta },
    /// Begin a content block.
    ContentBlockStart { content_block: ContentBlock },
    /// Incremental content within a block.
    ContentBlockDelta { delta: BlockDelta },
    /// End of a content block.
    ContentBlockStop {},
    /// Final message delta (stop reason + usage).
    MessageDelta {
        delta: MessageDeltaBody,
        #[serde(default)]
        usage: Option<OutputUsage>,
    },
    /// End of message.
    MessageStop,
    /// Keep-alive.
    Ping,
    /// A failure reported by the API.
    Error { error: ErrorBody },
    /// Catch-all for unknown event types.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct MessageMeta {
    pub model: CompactString,
    #[serde(default)]
    pub usage: Option<InputUsage>,
}

#[derive(Debug, Deserialize)]
pub struct InputUsage {
    #[serde(default)]
    pub input_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockDelta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct MessageDeltaBody {
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OutputUsage {
    #[serde(default)]
    pub output_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Reduces text deltas to what has not been emitted yet.
///
/// Some proxies send the whole text so far instead of the increment. The
/// shape is decided once per stream: a second delta that strictly extends
/// the accumulated text locks the stream into cumulative mode, anything
/// else passes every later delta through untouched.
#[derive(Debug, Default)]
pub struct CumulativeText {
    seen: String,
    mode: DeltaMode,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum DeltaMode {
    #[default]
    Undecided,
    Cumulative,
    Incremental,
}

impl CumulativeText {
    /// The new part of `delta`, or `None` if nothing is new.
    pub fn push(&mut self, delta: &str) -> Option<String> {
        let extends = delta.starts_with(self.seen.as_str());
        let fresh = match self.mode {
            DeltaMode::Undecided if self.seen.is_empty() => delta,
            DeltaMode::Undecided if extends && delta.len() > self.seen.len() => {
                self.mode = DeltaMode::Cumulative;
                &delta[self.seen.len()..]
            }
            DeltaMode::Cumulative if extends => &delta[self.seen.len()..],
            DeltaMode::Undecided | DeltaMode::Cumulative => {
                self.mode = DeltaMode::Incremental;
                delta
            }
            DeltaMode::Incremental => delta,
        };
        if fresh.is_empty() {
            return None;
        }
        let fresh = fresh.to_owned();
        self.seen.push_str(&fresh);
        Some(fresh)
    }

    /// Whether any text was emitted.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// A classified stream failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFailure {
    Overloaded,
    RateLimited,
    Authentication,
    Network,
    Other(String),
}

impl StreamFailure {
    /// Classify an `error` event. First match wins: overload, rate limit,
    /// authentication, network.
    pub fn classify(kind: Option<&str>, message: &str) -> Self {
        let kind = kind.unwrap_or_default();
        let lower = message.to_ascii_lowercase();
        if kind == "overloaded_error" || lower.contains("overloaded") {
            Self::Overloaded
        } else if kind == "rate_limit_error" || lower.contains("rate limit") {
            Self::RateLimited
        } else if matches!(kind, "authentication_error" | "permission_error")
            || lower.contains("api key")
            || lower.contains("authentication")
        {
            Self::Authentication
        } else if lower.contains("network") || lower.contains("connection") || lower.contains("timeout") {
            Self::Network
        } else {
            Self::Other(message.to_owned())
        }
    }

    /// The user-facing message.
    pub fn message(&self) -> String {
        match self {
            Self::Overloaded => {
                "Claude is currently overloaded. Please try again in a moment.".into()
            }
            Self::RateLimited => {
                "Claude rate limit reached. Please wait before sending more messages.".into()
            }
            Self::Authentication => {
                "Anthropic authentication failed. Check your API key.".into()
            }
            Self::Network => {
                "Network error while streaming from Claude. Check your connection.".into()
            }
            Self::Other(message) => format!("Claude stream error: {message}"),
        }
    }
}

impl From<StreamFailure> for Error {
    fn from(failure: StreamFailure) -> Self {
        Error::Stream(failure.message())
    }
}
