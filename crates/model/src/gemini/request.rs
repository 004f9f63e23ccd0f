//! Request body for the Gemini `generateContent` API.

use super::Gemini;
use sbcore::{Attachment, AttachmentKind, Prompt, Role};
use serde::Serialize;

/// Sampling defaults applied when nothing is configured.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 0.95;
pub const DEFAULT_TOP_K: u32 = 40;

/// Reply injected after a custom system prompt.
const SYSTEM_ACK: &str = "Understood. I will follow these instructions.";

/// The request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

/// A conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    /// `user` or `model`.
    pub role: &'static str,
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: &'static str, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::Text(text.into())],
        }
    }
}

/// A content part.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl Gemini {
    /// Build the request body for a turn.
    pub fn request(&self, prompt: &Prompt) -> Request {
        let params = self.base.parameters();
        let mut contents = Vec::new();
        if !self.base.has_default_system_prompt() {
            contents.push(Content::text(
                "user",
                format!("System: {}", self.base.system_prompt()),
            ));
            contents.push(Content::text("model", SYSTEM_ACK));
        }

        contents.extend(
            self.base
                .format_history(&prompt.history, prompt.resumption.as_ref())
                .into_iter()
                .map(|turn| {
                    let role = match turn.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    };
                    Content::text(role, turn.content)
                }),
        );
        contents.push(Content {
            role: "user",
            parts: user_parts(&prompt.message.content, &prompt.attachments),
        });

        Request {
            contents,
            generation_config: GenerationConfig {
                temperature: params.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                top_p: params.top_p.unwrap_or(DEFAULT_TOP_P),
                top_k: params.top_k.unwrap_or(DEFAULT_TOP_K),
                max_output_tokens: params.max_tokens,
            },
        }
    }
}

/// Text first, then inline media. Only PDFs survive among documents.
fn user_parts(text: &str, attachments: &[Attachment]) -> Vec<Part> {
    let mut parts = vec![Part::Text(text.to_owned())];
    for attachment in attachments {
        if attachment.kind == AttachmentKind::Document && !attachment.is_pdf() {
            tracing::debug!(
                "Google accepts only PDF documents, dropping {} ({})",
                attachment.label(),
                attachment.mime_type
            );
            continue;
        }
        match attachment.payload() {
            Some(data) => parts.push(Part::InlineData(InlineData {
                mime_type: attachment.mime_type.clone(),
                data: data.into_owned(),
            })),
            None => tracing::warn!("skipping attachment without inline data: {}", attachment.uri),
        }
    }
    parts
}
