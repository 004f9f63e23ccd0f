//! The adapter contract shared by every provider.

use crate::{Attachment, Citation, Message, Personality, ResumptionContext, Result, SendResponse, Usage};
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tokio_util::sync::CancellationToken;

/// A trait for provider adapters
pub trait Adapter: Sized + Clone {
    /// What this adapter and its configured model can honor.
    ///
    /// Recomputed on every call; implementations must not cache results
    /// that depend on the selected model.
    fn capabilities(&self) -> Capabilities;

    /// Swap the persona for subsequent requests, or clear it.
    fn set_personality(&mut self, personality: Option<Personality>);

    /// Send a turn and wait for the full response.
    fn send(&self, prompt: &Prompt) -> impl Future<Output = Result<SendResponse>> + Send;

    /// Send a turn and stream text chunks as they arrive.
    ///
    /// The stream is finite and not restartable. It ends after yielding an
    /// error.
    fn stream(
        &self,
        prompt: Prompt,
        options: StreamOptions,
    ) -> impl Stream<Item = Result<String>> + Send;
}

/// Declared capabilities of an adapter + model pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Capabilities {
    pub streaming: bool,
    pub attachments: bool,
    pub supports_images: bool,
    pub supports_documents: bool,
    pub function_calling: bool,
    pub system_prompt: bool,
    /// Maximum output tokens.
    pub max_tokens: u32,
    /// Context window in tokens.
    pub context_window: u32,
}

/// One conversational turn to send.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// The new user message.
    pub message: Message,

    /// Prior conversation, oldest first.
    pub history: Vec<Message>,

    /// Attachments for the new message.
    pub attachments: Vec<Attachment>,

    /// Set when re-anchoring an interrupted turn.
    pub resumption: Option<ResumptionContext>,

    /// Model override for this turn only.
    pub model: Option<String>,
}

impl Prompt {
    /// Create a prompt with no history.
    pub fn new(message: Message) -> Self {
        let attachments = message.attachments.clone();
        Self {
            message,
            history: Vec::new(),
            attachments,
            resumption: None,
            model: None,
        }
    }

    /// Set the history.
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    /// Set the attachments.
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Set the resumption context.
    pub fn with_resumption(mut self, resumption: ResumptionContext) -> Self {
        self.resumption = Some(resumption);
        self
    }

    /// Override the model for this turn.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Provider events surfaced alongside streamed text.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The vendor accepted the request.
    Started { model: String },
    /// Sources cited by the response.
    Citations(Vec<Citation>),
    /// Final token usage.
    Usage(Usage),
    /// The vendor finished generating.
    Finished { reason: Option<String> },
}

/// Callback receiving [`StreamEvent`]s.
#[derive(Clone)]
pub struct EventSink(Arc<dyn Fn(StreamEvent) + Send + Sync>);

impl EventSink {
    pub fn new(f: impl Fn(StreamEvent) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn emit(&self, event: StreamEvent) {
        (self.0)(event)
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventSink")
    }
}

/// Options for a streaming call.
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    /// Cancelling this token ends the stream and closes the transport.
    pub cancel: Option<CancellationToken>,

    /// Receives provider events.
    pub on_event: Option<EventSink>,
}

impl StreamOptions {
    /// Attach a cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Attach an event callback.
    pub fn on_event(mut self, f: impl Fn(StreamEvent) + Send + Sync + 'static) -> Self {
        self.on_event = Some(EventSink::new(f));
        self
    }

    /// Emit an event if a sink is attached.
    pub fn emit(&self, event: StreamEvent) {
        if let Some(sink) = &self.on_event {
            sink.emit(event);
        }
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}
