//! Mock adapter for development and tests.

use futures_core::Stream;
use rand::{Rng, seq::IndexedRandom};
use sbcore::{
    Adapter, AdapterBase, AdapterConfig, Capabilities, Completion, Personality, Prompt,
    ProviderId, Result, SendResponse, StreamOptions, Usage,
};
use std::{ops::RangeInclusive, time::Duration};

/// Replies the mock picks from.
pub const REPLIES: [&str; 5] = [
    "That is an interesting question. Let me think about it for a moment.",
    "Here is one way to look at it, though there are others.",
    "I would approach this step by step, starting with the basics.",
    "There are good arguments on both sides of this one.",
    "Short answer: it depends on what you are optimizing for.",
];

/// A canned-reply adapter with a random delay.
#[derive(Debug, Clone)]
pub struct Mock {
    base: AdapterBase,
    delay_ms: RangeInclusive<u64>,
}

impl Mock {
    /// Create a mock that waits 500 to 1500 ms per reply.
    pub fn new(config: AdapterConfig) -> Self {
        let provider = config.provider.parse().unwrap_or(ProviderId::Demo);
        Self {
            base: AdapterBase::new(provider, config),
            delay_ms: 500..=1500,
        }
    }

    /// Replace the delay range, in milliseconds.
    pub fn with_delay_ms(mut self, delay_ms: RangeInclusive<u64>) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    fn roll(&self) -> (Duration, String, Usage) {
        let mut rng = rand::rng();
        let delay = Duration::from_millis(rng.random_range(self.delay_ms.clone()));
        let reply = REPLIES.choose(&mut rng).copied().unwrap_or_default();
        let usage = Usage::new(rng.random_range(10..=200), rng.random_range(20..=400));
        (delay, reply.to_owned(), usage)
    }
}

impl Adapter for Mock {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: false,
            attachments: false,
            supports_images: false,
            supports_documents: false,
            function_calling: false,
            system_prompt: true,
            max_tokens: 4_096,
            context_window: 8_192,
        }
    }

    fn set_personality(&mut self, personality: Option<Personality>) {
        self.base.set_personality(personality);
    }

    async fn send(&self, prompt: &Prompt) -> Result<SendResponse> {
        let (delay, response, usage) = self.roll();
        tokio::time::sleep(delay).await;
        Ok(Completion {
            response,
            model_used: Some(self.base.model(prompt.model.as_deref()).into()),
            usage: Some(usage),
            metadata: None,
        }
        .into())
    }

    /// The whole reply as a single chunk.
    fn stream(
        &self,
        prompt: Prompt,
        _options: StreamOptions,
    ) -> impl Stream<Item = Result<String>> + Send {
        let this = self.clone();
        async_stream::try_stream! {
            let response = this.send(&prompt).await?;
            yield response.text().to_owned();
        }
    }
}
