//! Normalized responses

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The result of a one-shot send.
///
/// Adapters either return plain text or a structured completion; callers
/// read both through [`SendResponse::text`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SendResponse {
    /// Bare response text.
    Text(String),
    /// Response text plus model, usage and metadata.
    Completion(Completion),
}

impl SendResponse {
    /// The response text.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Completion(completion) => &completion.response,
        }
    }

    /// The model that produced the response, if reported.
    pub fn model_used(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Completion(completion) => completion.model_used.as_deref(),
        }
    }

    /// Token usage, if reported.
    pub fn usage(&self) -> Option<&Usage> {
        match self {
            Self::Text(_) => None,
            Self::Completion(completion) => completion.usage.as_ref(),
        }
    }

    /// Citations, if the provider returned any.
    pub fn citations(&self) -> &[Citation] {
        match self {
            Self::Completion(Completion {
                metadata: Some(meta),
                ..
            }) => &meta.citations,
            _ => &[],
        }
    }
}

impl From<String> for SendResponse {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Completion> for SendResponse {
    fn from(completion: Completion) -> Self {
        Self::Completion(completion)
    }
}

/// A structured completion.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Completion {
    /// The response text.
    pub response: String,

    /// The concrete model id reported by the vendor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<CompactString>,

    /// Token usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Citations and raw provider metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Usage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,

    /// Number of tokens in the completion
    pub completion_tokens: u32,

    /// Total number of tokens used
    pub total_tokens: u32,
}

impl Usage {
    /// Build usage from prompt and completion counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Extra response metadata.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResponseMetadata {
    /// Sources cited by the response, 1-indexed in result order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,

    /// Raw provider-specific fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_metadata: Option<Value>,
}

/// A cited source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Citation {
    /// 1-based position in the result list.
    pub index: usize,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}
