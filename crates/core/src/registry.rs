//! Static model registry.
//!
//! Maps providers to their default and free-tier models, resolves
//! version-agnostic aliases such as `claude-latest`, and describes the
//! per-model wire quirks that cannot be expressed as provider capabilities.
//! Pure lookup, no I/O.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Known providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    /// Anthropic Messages API.
    Claude,
    /// OpenAI chat completions.
    OpenAi,
    /// OpenAI Responses API.
    OpenAiResponses,
    /// Google Generative Language API.
    Google,
    Perplexity,
    Mistral,
    Cohere,
    Together,
    DeepSeek,
    Grok,
    /// Network-free demo provider.
    Demo,
}

impl ProviderId {
    /// Every provider, in display order.
    pub const ALL: [ProviderId; 11] = [
        Self::Claude,
        Self::OpenAi,
        Self::OpenAiResponses,
        Self::Google,
        Self::Perplexity,
        Self::Mistral,
        Self::Cohere,
        Self::Together,
        Self::DeepSeek,
        Self::Grok,
        Self::Demo,
    ];

    /// The canonical id string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::OpenAi => "openai",
            Self::OpenAiResponses => "openai-responses",
            Self::Google => "google",
            Self::Perplexity => "perplexity",
            Self::Mistral => "mistral",
            Self::Cohere => "cohere",
            Self::Together => "together",
            Self::DeepSeek => "deepseek",
            Self::Grok => "grok",
            Self::Demo => "demo",
        }
    }

    /// The vendor name used in error messages and demo replies.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Anthropic",
            Self::OpenAi => "OpenAI",
            Self::OpenAiResponses => "OpenAI Responses",
            Self::Google => "Google",
            Self::Perplexity => "Perplexity",
            Self::Mistral => "Mistral",
            Self::Cohere => "Cohere",
            Self::Together => "Together",
            Self::DeepSeek => "DeepSeek",
            Self::Grok => "Grok",
            Self::Demo => "Demo",
        }
    }

    /// The default model for this provider.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Claude => "claude-sonnet-4-20250514",
            Self::OpenAi | Self::OpenAiResponses => "gpt-4o",
            Self::Google => "gemini-2.5-flash",
            Self::Perplexity => "sonar-pro",
            Self::Mistral => "mistral-large-latest",
            Self::Cohere => "command-r-plus",
            Self::Together => "meta-llama/Llama-3.3-70B-Instruct-Turbo",
            Self::DeepSeek => "deepseek-chat",
            Self::Grok => "grok-3",
            Self::Demo => "demo-model",
        }
    }

    /// The model offered on the free tier.
    pub fn free_model(&self) -> &'static str {
        match self {
            Self::Claude => "claude-3-5-haiku-20241022",
            Self::OpenAi | Self::OpenAiResponses => "gpt-4o-mini",
            Self::Google => "gemini-2.5-flash-lite",
            Self::Perplexity => "sonar",
            Self::Mistral => "mistral-small-latest",
            Self::Cohere => "command-r",
            Self::Together => "meta-llama/Llama-3.3-70B-Instruct-Turbo-Free",
            Self::DeepSeek => "deepseek-chat",
            Self::Grok => "grok-3-mini",
            Self::Demo => "demo-model",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_ascii_lowercase();
        Ok(match id.as_str() {
            "claude" | "anthropic" => Self::Claude,
            "openai" | "chatgpt" => Self::OpenAi,
            "openai-responses" | "openai_responses" => Self::OpenAiResponses,
            "google" | "gemini" => Self::Google,
            "perplexity" => Self::Perplexity,
            "mistral" => Self::Mistral,
            "cohere" => Self::Cohere,
            "together" => Self::Together,
            "deepseek" => Self::DeepSeek,
            "grok" | "xai" => Self::Grok,
            "demo" => Self::Demo,
            _ => return Err(s.to_owned()),
        })
    }
}

/// Alias → concrete model id.
pub const ALIASES: &[(&str, &str)] = &[
    ("claude-latest", "claude-sonnet-4-20250514"),
    ("claude-opus-latest", "claude-opus-4-20250514"),
    ("claude-haiku-latest", "claude-3-5-haiku-20241022"),
    ("gpt-latest", "gpt-4o"),
    ("gpt-mini-latest", "gpt-4o-mini"),
    ("gpt-5-latest", "gpt-5"),
    ("o1-latest", "o1"),
    ("gemini-latest", "gemini-2.5-pro"),
    ("gemini-flash-latest", "gemini-2.5-flash"),
    ("sonar-latest", "sonar-pro"),
    ("mistral-latest", "mistral-large-latest"),
    ("command-latest", "command-r-plus"),
    ("llama-latest", "meta-llama/Llama-3.3-70B-Instruct-Turbo"),
    ("deepseek-latest", "deepseek-chat"),
    ("grok-latest", "grok-3"),
];

/// Resolve an alias to its concrete model id; unknown names pass through.
pub fn resolve_alias(model: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == model)
        .map(|(_, id)| *id)
        .unwrap_or(model)
}

/// Resolve the model for a request: alias lookup, falling back to the
/// provider default when nothing was requested.
pub fn resolve_model(provider: ProviderId, requested: Option<&str>) -> String {
    let model = match requested.map(str::trim).filter(|m| !m.is_empty()) {
        Some(model) => resolve_alias(model),
        None => provider.default_model(),
    };
    tracing::debug!("resolved {provider} model {requested:?} -> {model}");
    model.to_owned()
}

/// The name of the output-token limit field on chat-completions wires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenParam {
    /// `max_tokens`
    MaxTokens,
    /// `max_completion_tokens`
    MaxCompletionTokens,
}

impl TokenParam {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxTokens => "max_tokens",
            Self::MaxCompletionTokens => "max_completion_tokens",
        }
    }
}

/// Wire-format quirks of a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelProfile {
    /// A temperature the vendor requires regardless of configuration.
    pub fixed_temperature: Option<f64>,
    /// Which field carries the output-token limit.
    pub token_param: TokenParam,
    /// Whether the model accepts image input.
    pub vision: bool,
}

impl ModelProfile {
    const STANDARD: Self = Self {
        fixed_temperature: None,
        token_param: TokenParam::MaxTokens,
        vision: true,
    };

    const REASONING: Self = Self {
        fixed_temperature: Some(1.0),
        token_param: TokenParam::MaxCompletionTokens,
        vision: true,
    };

    const REASONING_TEXT: Self = Self {
        vision: false,
        ..Self::REASONING
    };

    const TEXT: Self = Self {
        vision: false,
        ..Self::STANDARD
    };
}

/// Model id prefix → profile. First match wins, so narrower prefixes come
/// first.
const PROFILES: &[(&str, ModelProfile)] = &[
    ("o1-mini", ModelProfile::REASONING_TEXT),
    ("o1-preview", ModelProfile::REASONING_TEXT),
    ("o1", ModelProfile::REASONING),
    ("o3-mini", ModelProfile::REASONING_TEXT),
    ("o3", ModelProfile::REASONING),
    ("o4-mini", ModelProfile::REASONING),
    ("gpt-5", ModelProfile::REASONING),
    ("gpt-3.5", ModelProfile::TEXT),
    ("deepseek-", ModelProfile::TEXT),
    ("sonar", ModelProfile::TEXT),
    ("mistral-large", ModelProfile::TEXT),
    ("codestral", ModelProfile::TEXT),
    ("open-mistral", ModelProfile::TEXT),
    ("command", ModelProfile::TEXT),
    ("grok-3", ModelProfile::TEXT),
    ("meta-llama/Llama-3.3", ModelProfile::TEXT),
];

/// Look up the wire profile for a concrete model id.
pub fn profile(model: &str) -> ModelProfile {
    PROFILES
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, profile)| *profile)
        .unwrap_or(ModelProfile::STANDARD)
}
