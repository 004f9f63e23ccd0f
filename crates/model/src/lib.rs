//! Provider adapters for Switchboard.
//!
//! Concrete adapters for each vendor wire protocol, the [`Provider`] enum
//! that dispatches over them, and the [`AdapterFactory`] callers use to
//! obtain one.

pub use {
    claude::Claude,
    cohere::Cohere,
    demo::{Demo, SeedTable, SeededResponses},
    factory::{AdapterFactory, CapabilityCache, Mode},
    gemini::Gemini,
    http::HttpProvider,
    mock::Mock,
    openai::OpenAI,
    provider::Provider,
    responses::Responses,
};

pub mod claude;
pub mod cohere;
pub mod demo;
mod factory;
pub mod gemini;
pub mod http;
pub mod mock;
pub mod openai;
mod provider;
pub mod responses;
