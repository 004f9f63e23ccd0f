//! Behavior shared by every adapter: system prompt derivation, history
//! windowing, and model resolution.

use crate::{
    AdapterConfig, Message, Parameters, Personality, ProviderId, ResumptionContext, SenderType,
    Turn, registry,
};

/// The number of most recent history messages sent with a turn.
pub const HISTORY_WINDOW: usize = 10;

/// The maximum number of characters quoted from an interrupted prompt.
pub const RESUME_QUOTE_CHARS: usize = 100;

/// Instruction used when the conversation is a debate.
pub const DEBATE_PROMPT: &str = "You are participating in a structured debate. Take a clear \
position, support it with reasoning and evidence, and respond directly to the opposing \
arguments. Stay concise and respectful.";

/// Instruction used when no persona is configured.
pub const DEFAULT_PROMPT: &str = "You are a helpful AI assistant.";

/// Configuration plus the helpers every adapter inherits.
#[derive(Debug, Clone)]
pub struct AdapterBase {
    /// The provider this adapter speaks for.
    pub provider: ProviderId,
    config: AdapterConfig,
}

impl AdapterBase {
    /// Wrap a configuration.
    pub fn new(provider: ProviderId, config: AdapterConfig) -> Self {
        Self { provider, config }
    }

    /// The configuration.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// The API key.
    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    /// Sampling parameters.
    pub fn parameters(&self) -> &Parameters {
        &self.config.parameters
    }

    /// The configured endpoint root override.
    pub fn base_url(&self) -> Option<&str> {
        self.config.base_url.as_deref()
    }

    /// Vendor name for messages.
    pub fn name(&self) -> &'static str {
        self.provider.display_name()
    }

    /// Swap or clear the persona.
    pub fn set_personality(&mut self, personality: Option<Personality>) {
        tracing::debug!(
            "{} personality -> {:?}",
            self.provider,
            personality.as_ref().map(|p| &p.name)
        );
        self.config.personality = personality;
    }

    /// The configured model resolved through the registry, without a
    /// per-turn override.
    pub fn configured_model(&self) -> String {
        registry::resolve_model(self.provider, self.config.model.as_deref())
    }

    /// The concrete model for a turn: override, then configured model, then
    /// provider default.
    pub fn model(&self, requested: Option<&str>) -> String {
        let requested = requested
            .filter(|m| !m.trim().is_empty())
            .or(self.config.model.as_deref());
        registry::resolve_model(self.provider, requested)
    }

    /// Debate mode beats persona, persona beats the default.
    pub fn system_prompt(&self) -> &str {
        if self.config.debate_mode {
            return DEBATE_PROMPT;
        }

        self.config
            .personality
            .as_ref()
            .and_then(|p| p.system_prompt.as_deref())
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_PROMPT)
    }

    /// Whether [`Self::system_prompt`] is the generic default.
    pub fn has_default_system_prompt(&self) -> bool {
        self.system_prompt() == DEFAULT_PROMPT
    }

    /// The persona name, if any.
    pub fn persona(&self) -> Option<&str> {
        self.config.personality.as_ref().map(|p| p.name.as_str())
    }

    /// Format history for a request.
    ///
    /// When resuming, a note quoting the original prompt comes first, then
    /// the prompt itself unless it is already in the window. The last
    /// [`HISTORY_WINDOW`] messages follow; empty ones are dropped.
    pub fn format_history(
        &self,
        history: &[Message],
        resumption: Option<&ResumptionContext>,
    ) -> Vec<Turn> {
        let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
        let mut turns = Vec::with_capacity(recent.len() + 2);

        if let Some(ctx) = resumption.filter(|ctx| ctx.is_resuming) {
            let original = &ctx.original_prompt;
            turns.push(Turn::assistant(format!(
                "[Continuing my previous response to: \"{}\"]",
                truncate(&original.content, RESUME_QUOTE_CHARS)
            )));
            if !recent.iter().any(|m| m.id == original.id) {
                turns.push(Turn::user(original.content.clone()));
            }
        }

        turns.extend(
            recent
                .iter()
                .filter(|m| !m.content.trim().is_empty())
                .map(|m| match m.sender_type {
                    SenderType::User => Turn::user(m.content.clone()),
                    SenderType::Ai => Turn::assistant(m.content.clone()),
                }),
        );
        turns
    }
}

/// Truncate to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}
