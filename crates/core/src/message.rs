//! Conversation messages as produced by the calling layer.

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    /// The human user.
    #[default]
    User,
    /// An assistant (any provider).
    Ai,
}

/// A message in the conversation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    /// Stable message id, used to detect duplicates when resuming.
    pub id: CompactString,

    /// Display name of the sender.
    pub sender: String,

    /// Whether the sender was the user or an assistant.
    pub sender_type: SenderType,

    /// Plain text content.
    pub content: String,

    /// When the message was produced.
    pub timestamp: DateTime<Utc>,

    /// Attached media, already pre-processed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,

    /// Opaque metadata owned by the calling layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Message {
    /// Create a new user message.
    pub fn user(id: impl Into<CompactString>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sender: "You".into(),
            sender_type: SenderType::User,
            content: content.into(),
            timestamp: Utc::now(),
            attachments: Vec::new(),
            metadata: None,
        }
    }

    /// Create a new assistant message.
    pub fn ai(
        id: impl Into<CompactString>,
        sender: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            sender_type: SenderType::Ai,
            content: content.into(),
            timestamp: Utc::now(),
            attachments: Vec::new(),
            metadata: None,
        }
    }
}

/// The kind of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Document,
}

/// A pre-processed attachment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Attachment {
    /// Image or document.
    pub kind: AttachmentKind,

    /// Source uri; may be a `data:` uri.
    pub uri: String,

    /// MIME type of the payload.
    pub mime_type: String,

    /// Base64 payload, if the pre-processor already produced it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,

    /// Original file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Original file size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl Attachment {
    /// Create an image attachment from a base64 payload.
    pub fn image(mime_type: impl Into<String>, base64: impl Into<String>) -> Self {
        Self::inline(AttachmentKind::Image, mime_type.into(), base64.into())
    }

    /// Create a document attachment from a base64 payload.
    pub fn document(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        base64: impl Into<String>,
    ) -> Self {
        let mut attachment = Self::inline(AttachmentKind::Document, mime_type.into(), base64.into());
        attachment.file_name = Some(file_name.into());
        attachment
    }

    fn inline(kind: AttachmentKind, mime_type: String, base64: String) -> Self {
        Self {
            kind,
            uri: format!("data:{mime_type};base64,{base64}"),
            mime_type,
            base64: Some(base64),
            file_name: None,
            file_size: None,
        }
    }

    /// The base64 payload for inline embedding.
    ///
    /// Prefers the explicit `base64` field, then a `data:` uri whose payload
    /// decodes. Returns `None` when the attachment cannot be inlined.
    pub fn payload(&self) -> Option<Cow<'_, str>> {
        if let Some(data) = self.base64.as_deref().filter(|d| !d.is_empty()) {
            return Some(Cow::Borrowed(data));
        }

        let rest = self.uri.strip_prefix("data:")?;
        let (meta, data) = rest.split_once(',')?;
        if !meta.ends_with(";base64") || STANDARD.decode(data).is_err() {
            return None;
        }
        Some(Cow::Borrowed(data))
    }

    /// The payload as a `data:` uri.
    pub fn data_uri(&self) -> Option<String> {
        self.payload()
            .map(|data| format!("data:{};base64,{data}", self.mime_type))
    }

    /// Whether this is a PDF document.
    pub fn is_pdf(&self) -> bool {
        self.mime_type.eq_ignore_ascii_case("application/pdf")
    }

    /// File name or a generic label.
    pub fn label(&self) -> &str {
        self.file_name.as_deref().unwrap_or("document")
    }
}

/// Context for re-anchoring an interrupted turn.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResumptionContext {
    /// The prompt whose answer was interrupted.
    pub original_prompt: Message,

    /// Whether the caller is resuming.
    pub is_resuming: bool,
}

/// The role of a formatted history turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// The lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A formatted history turn, ready for a vendor request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
