//! Core abstractions for the Switchboard provider adapter layer.
//!
//! This crate holds the provider-neutral pieces: the data model, the
//! [`Adapter`] contract and the helpers every adapter shares, the static
//! model registry, SSE parsing, and the handoff that turns a transport task
//! into a pull-based text stream.

pub use {
    adapter::{Adapter, Capabilities, EventSink, Prompt, StreamEvent, StreamOptions},
    base::{AdapterBase, DEBATE_PROMPT, DEFAULT_PROMPT, HISTORY_WINDOW, truncate},
    config::{AdapterConfig, Parameters, Personality},
    error::{Error, Result, api_error, error_body, error_message},
    message::{Attachment, AttachmentKind, Message, ResumptionContext, Role, SenderType, Turn},
    registry::ProviderId,
    response::{Citation, Completion, ResponseMetadata, SendResponse, Usage},
};
pub use tokio_util::sync::CancellationToken;

mod adapter;
mod base;
mod config;
mod error;
pub mod handoff;
mod message;
pub mod registry;
mod response;
pub mod sse;
