//! Chat completions request body.

use super::OpenAI;
use sbcore::{
    Attachment, AttachmentKind, Prompt,
    registry::{self, TokenParam},
};
use serde::Serialize;

/// Temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// OpenAI-compatible chat completions request body.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// The model identifier.
    pub model: String,
    /// System prompt, history, then the new user turn.
    pub messages: Vec<ChatMessage>,
    /// Temperature.
    pub temperature: f64,
    /// Whether to stream the response.
    pub stream: bool,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Maximum tokens to generate, for models that reject `max_tokens`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    /// Top-p sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Ask for search citations (Perplexity).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_citations: Option<bool>,
}

/// A chat message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: Content,
}

impl ChatMessage {
    fn text(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Content::Text(content.into()),
        }
    }
}

/// Message content: a plain string, or parts when media is attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<Part>),
}

/// A structured content part.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl OpenAI {
    /// Build the request body for a turn.
    pub fn request(&self, prompt: &Prompt, stream: bool) -> Request {
        let model = self.base.model(prompt.model.as_deref());
        let profile = registry::profile(&model);
        let params = self.base.parameters();

        let mut messages = vec![ChatMessage::text("system", self.base.system_prompt())];
        messages.extend(
            self.base
                .format_history(&prompt.history, prompt.resumption.as_ref())
                .into_iter()
                .map(|turn| ChatMessage::text(turn.role.as_str(), turn.content)),
        );
        messages.push(ChatMessage {
            role: "user",
            content: self.user_content(&prompt.message.content, &prompt.attachments, profile.vision),
        });

        let temperature = profile
            .fixed_temperature
            .or(params.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);
        let (max_tokens, max_completion_tokens) = match profile.token_param {
            TokenParam::MaxTokens => (params.max_tokens, None),
            TokenParam::MaxCompletionTokens => (None, params.max_tokens),
        };

        Request {
            model,
            messages,
            temperature,
            stream,
            max_tokens,
            max_completion_tokens,
            top_p: params.top_p,
            return_citations: self.vendor.citations.then_some(true),
        }
    }

    /// The user turn. Stays a plain string unless usable media is attached
    /// and both vendor and model accept it.
    fn user_content(&self, text: &str, attachments: &[Attachment], vision: bool) -> Content {
        if attachments.is_empty() {
            return Content::Text(text.to_owned());
        }
        if !self.vendor.attachments || !vision {
            tracing::debug!(
                "{} model lacks vision, dropping {} attachment(s)",
                self.vendor.name(),
                attachments.len()
            );
            return Content::Text(text.to_owned());
        }

        let mut parts = vec![Part::Text {
            text: text.to_owned(),
        }];
        for attachment in attachments {
            match attachment.kind {
                AttachmentKind::Image => match attachment.data_uri() {
                    Some(url) => parts.push(Part::ImageUrl {
                        image_url: ImageUrl { url },
                    }),
                    None => tracing::warn!("skipping image without inline data: {}", attachment.uri),
                },
                AttachmentKind::Document => parts.push(Part::Text {
                    text: format!(
                        "[Document \"{}\" ({}) is attached, but {} cannot read document attachments.]",
                        attachment.label(),
                        attachment.mime_type,
                        self.vendor.name()
                    ),
                }),
            }
        }

        if parts.len() == 1 {
            return Content::Text(text.to_owned());
        }
        Content::Parts(parts)
    }
}
