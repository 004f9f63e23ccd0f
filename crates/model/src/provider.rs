//! Unified `Provider` enum with enum dispatch over concrete adapters.

use crate::{
    claude::Claude, cohere::Cohere, demo::Demo, gemini::Gemini, mock::Mock, openai::OpenAI,
    responses::Responses,
};
use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use sbcore::{Adapter, Capabilities, Personality, Prompt, Result, SendResponse, StreamOptions};

/// Any adapter the factory can produce.
///
/// Callers hold a `Provider` and treat every vendor uniformly; streaming
/// clones the adapter into the returned stream so it owns its state.
#[derive(Clone, Debug)]
pub enum Provider {
    /// OpenAI-compatible chat completions (OpenAI, Mistral, Together,
    /// DeepSeek, Grok, Perplexity).
    OpenAI(OpenAI),
    /// Anthropic Messages API.
    Claude(Claude),
    /// Google Generative Language API.
    Gemini(Gemini),
    /// OpenAI Responses API.
    Responses(Responses),
    /// Cohere v1 chat.
    Cohere(Cohere),
    /// Network-free demo double.
    Demo(Demo),
    /// Random canned replies.
    Mock(Mock),
}

impl Provider {
    /// Whether this is the demo adapter.
    pub fn is_demo(&self) -> bool {
        matches!(self, Self::Demo(_))
    }
}

impl Adapter for Provider {
    fn capabilities(&self) -> Capabilities {
        match self {
            Self::OpenAI(p) => p.capabilities(),
            Self::Claude(p) => p.capabilities(),
            Self::Gemini(p) => p.capabilities(),
            Self::Responses(p) => p.capabilities(),
            Self::Cohere(p) => p.capabilities(),
            Self::Demo(p) => p.capabilities(),
            Self::Mock(p) => p.capabilities(),
        }
    }

    fn set_personality(&mut self, personality: Option<Personality>) {
        match self {
            Self::OpenAI(p) => p.set_personality(personality),
            Self::Claude(p) => p.set_personality(personality),
            Self::Gemini(p) => p.set_personality(personality),
            Self::Responses(p) => p.set_personality(personality),
            Self::Cohere(p) => p.set_personality(personality),
            Self::Demo(p) => p.set_personality(personality),
            Self::Mock(p) => p.set_personality(personality),
        }
    }

    async fn send(&self, prompt: &Prompt) -> Result<SendResponse> {
        match self {
            Self::OpenAI(p) => p.send(prompt).await,
            Self::Claude(p) => p.send(prompt).await,
            Self::Gemini(p) => p.send(prompt).await,
            Self::Responses(p) => p.send(prompt).await,
            Self::Cohere(p) => p.send(prompt).await,
            Self::Demo(p) => p.send(prompt).await,
            Self::Mock(p) => p.send(prompt).await,
        }
    }

    fn stream(
        &self,
        prompt: Prompt,
        options: StreamOptions,
    ) -> impl Stream<Item = Result<String>> + Send {
        let this = self.clone();
        try_stream! {
            match this {
                Provider::OpenAI(p) => {
                    let mut stream = std::pin::pin!(p.stream(prompt, options));
                    while let Some(chunk) = stream.next().await {
                        yield chunk?;
                    }
                }
                Provider::Claude(p) => {
                    let mut stream = std::pin::pin!(p.stream(prompt, options));
                    while let Some(chunk) = stream.next().await {
                        yield chunk?;
                    }
                }
                Provider::Gemini(p) => {
                    let mut stream = std::pin::pin!(p.stream(prompt, options));
                    while let Some(chunk) = stream.next().await {
                        yield chunk?;
                    }
                }
                Provider::Responses(p) => {
                    let mut stream = std::pin::pin!(p.stream(prompt, options));
                    while let Some(chunk) = stream.next().await {
                        yield chunk?;
                    }
                }
                Provider::Cohere(p) => {
                    let mut stream = std::pin::pin!(p.stream(prompt, options));
                    while let Some(chunk) = stream.next().await {
                        yield chunk?;
                    }
                }
                Provider::Demo(p) => {
                    let mut stream = std::pin::pin!(p.stream(prompt, options));
                    while let Some(chunk) = stream.next().await {
                        yield chunk?;
                    }
                }
                Provider::Mock(p) => {
                    let mut stream = std::pin::pin!(p.stream(prompt, options));
                    while let Some(chunk) = stream.next().await {
                        yield chunk?;
                    }
                }
            }
        }
    }
}

macro_rules! impl_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Provider {
                fn from(adapter: $variant) -> Self {
                    Self::$variant(adapter)
                }
            }
        )*
    };
}

impl_from!(OpenAI, Claude, Gemini, Responses, Cohere, Demo, Mock);
