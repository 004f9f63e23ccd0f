//! Request body for the Anthropic Messages API.

use super::{Claude, DEFAULT_MAX_TOKENS, supports_documents};
use sbcore::{Attachment, AttachmentKind, Prompt};
use serde::Serialize;

/// The request body for the Anthropic Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// The model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// System prompt (top-level, not in messages array).
    pub system: String,
    /// History then the new user turn.
    pub messages: Vec<ClaudeMessage>,
    /// Whether to stream the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Top-p sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Top-k sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// A message in Anthropic format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaudeMessage {
    pub role: &'static str,
    pub content: ClaudeContent,
}

/// Plain text, or content blocks when media is attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClaudeContent {
    Text(String),
    Blocks(Vec<Block>),
}

/// A content block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Text { text: String },
    Image { source: Source },
    Document { source: Source },
}

/// An inline base64 source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub media_type: String,
    pub data: String,
}

impl Source {
    fn base64(attachment: &Attachment) -> Option<Self> {
        Some(Self {
            kind: "base64",
            media_type: attachment.mime_type.clone(),
            data: attachment.payload()?.into_owned(),
        })
    }
}

impl Claude {
    /// Build the request body for a turn.
    pub fn request(&self, prompt: &Prompt, stream: bool) -> Request {
        let model = self.base.model(prompt.model.as_deref());
        let params = self.base.parameters();

        let mut messages: Vec<_> = self
            .base
            .format_history(&prompt.history, prompt.resumption.as_ref())
            .into_iter()
            .map(|turn| ClaudeMessage {
                role: turn.role.as_str(),
                content: ClaudeContent::Text(turn.content),
            })
            .collect();
        messages.push(ClaudeMessage {
            role: "user",
            content: user_content(
                &prompt.message.content,
                &prompt.attachments,
                supports_documents(&model),
            ),
        });

        Request {
            max_tokens: params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            model,
            system: self.base.system_prompt().to_owned(),
            messages,
            stream: stream.then_some(true),
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
        }
    }
}

/// Media blocks first, then the text. Documents are left out entirely when
/// the model cannot read them.
fn user_content(text: &str, attachments: &[Attachment], documents: bool) -> ClaudeContent {
    let mut blocks = Vec::with_capacity(attachments.len() + 1);
    for attachment in attachments {
        let Some(source) = Source::base64(attachment) else {
            tracing::warn!("skipping attachment without inline data: {}", attachment.uri);
            continue;
        };
        match attachment.kind {
            AttachmentKind::Image => blocks.push(Block::Image { source }),
            AttachmentKind::Document if documents => blocks.push(Block::Document { source }),
            AttachmentKind::Document => {
                tracing::debug!("model cannot read documents, omitting {}", attachment.label())
            }
        }
    }

    if blocks.is_empty() {
        return ClaudeContent::Text(text.to_owned());
    }
    blocks.push(Block::Text {
        text: text.to_owned(),
    });
    ClaudeContent::Blocks(blocks)
}
