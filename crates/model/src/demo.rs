//! Network-free demo adapter.
//!
//! Stands in for every provider while demo mode is active. Replies come
//! from a [`SeededResponses`] source when it has one for the provider,
//! otherwise from a fixed template, so the same input always produces the
//! same output.

use futures_core::Stream;
use sbcore::{
    Adapter, AdapterBase, AdapterConfig, Capabilities, Completion, Personality, Prompt,
    ProviderId, Result, SendResponse, StreamEvent, StreamOptions, Usage, truncate,
};
use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};

/// Placeholder key filled in when the config has none.
pub const DEMO_KEY: &str = "demo-key";

/// Delay between streamed words.
pub const DEFAULT_PACE: Duration = Duration::from_millis(40);

/// Characters of the prompt echoed back.
const ECHO_CHARS: usize = 80;

/// Canned replies keyed by provider.
pub trait SeededResponses: Send + Sync {
    /// The seeded reply for this provider and prompt, if any.
    fn lookup(&self, provider: &str, prompt: &Prompt) -> Option<String>;
}

/// A fixed table of replies, one per provider id.
#[derive(Debug, Clone, Default)]
pub struct SeedTable {
    replies: BTreeMap<String, String>,
}

impl SeedTable {
    /// Seed a reply for a provider id.
    pub fn with(mut self, provider: impl Into<String>, reply: impl Into<String>) -> Self {
        self.replies.insert(provider.into(), reply.into());
        self
    }
}

impl SeededResponses for SeedTable {
    fn lookup(&self, provider: &str, _prompt: &Prompt) -> Option<String> {
        self.replies.get(provider).cloned()
    }
}

/// The demo adapter.
#[derive(Clone)]
pub struct Demo {
    base: AdapterBase,
    /// The provider id as requested, possibly unknown.
    requested: String,
    seeds: Option<Arc<dyn SeededResponses>>,
    pace: Duration,
}

impl fmt::Debug for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Demo")
            .field("requested", &self.requested)
            .field("seeded", &self.seeds.is_some())
            .field("pace", &self.pace)
            .finish()
    }
}

impl Demo {
    /// Create a demo adapter impersonating `config.provider`.
    ///
    /// Fills in a placeholder key and model when they are missing.
    pub fn new(mut config: AdapterConfig) -> Self {
        let provider = config.provider.parse().unwrap_or(ProviderId::Demo);
        if config.api_key.trim().is_empty() {
            config.api_key = DEMO_KEY.into();
        }
        if config.model.as_deref().is_none_or(|m| m.trim().is_empty()) {
            config.model = Some(provider.default_model().into());
        }
        Self {
            requested: config.provider.clone(),
            base: AdapterBase::new(provider, config),
            seeds: None,
            pace: DEFAULT_PACE,
        }
    }

    /// Consult `seeds` before composing a reply.
    pub fn with_seeds(mut self, seeds: Arc<dyn SeededResponses>) -> Self {
        self.seeds = Some(seeds);
        self
    }

    /// Set the delay between streamed words.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// The shared adapter state.
    pub fn base(&self) -> &AdapterBase {
        &self.base
    }

    /// The provider name shown in replies.
    fn display_name(&self) -> &str {
        match self.base.provider {
            ProviderId::Demo => &self.requested,
            provider => provider.display_name(),
        }
    }

    /// The reply for a prompt: seeded if available, templated otherwise.
    pub fn reply(&self, prompt: &Prompt) -> String {
        if let Some(reply) = self
            .seeds
            .as_ref()
            .and_then(|seeds| seeds.lookup(&self.requested, prompt))
        {
            return reply;
        }

        let name = self.display_name();
        let speaker = match self.base.persona() {
            Some(persona) => format!("{name} as {persona}"),
            None => name.to_owned(),
        };
        let mut reply = format!(
            "[Demo] {speaker} here. You said: \"{}\"\n\n\
             Here is a simulated answer:\n\
             - This reply was generated offline.\n\
             - No request was sent to {name}.\n\
             - Turn off demo mode and add an API key for real answers.",
            truncate(prompt.message.content.trim(), ECHO_CHARS)
        );
        match prompt.attachments.len() {
            0 => {}
            1 => reply.push_str("\n\n(1 attachment received; demo mode does not read it.)"),
            n => reply.push_str(&format!(
                "\n\n({n} attachments received; demo mode does not read them.)"
            )),
        }
        reply
    }
}

/// Split text into words that keep their trailing whitespace, so the
/// pieces concatenate back to the input.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(char::is_whitespace)
}

impl Adapter for Demo {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            attachments: true,
            supports_images: true,
            supports_documents: true,
            function_calling: false,
            system_prompt: true,
            max_tokens: 4_096,
            context_window: 128_000,
        }
    }

    fn set_personality(&mut self, personality: Option<Personality>) {
        self.base.set_personality(personality);
    }

    async fn send(&self, prompt: &Prompt) -> Result<SendResponse> {
        let response = self.reply(prompt);
        let completion_tokens = words(&response).count() as u32;
        let prompt_tokens = words(&prompt.message.content).count() as u32;
        Ok(Completion {
            response,
            model_used: Some(self.base.model(prompt.model.as_deref()).into()),
            usage: Some(Usage::new(prompt_tokens, completion_tokens)),
            metadata: None,
        }
        .into())
    }

    fn stream(
        &self,
        prompt: Prompt,
        options: StreamOptions,
    ) -> impl Stream<Item = Result<String>> + Send {
        let reply = self.reply(&prompt);
        let model = self.base.model(prompt.model.as_deref());
        let pace = self.pace;
        async_stream::stream! {
            options.emit(StreamEvent::Started { model });
            for (i, word) in words(&reply).enumerate() {
                if i > 0 && !pace.is_zero() {
                    tokio::time::sleep(pace).await;
                }
                if options.is_cancelled() {
                    tracing::debug!("demo stream cancelled");
                    return;
                }
                yield Ok(word.to_owned());
            }
            options.emit(StreamEvent::Finished {
                reason: Some("stop".into()),
            });
        }
    }
}
