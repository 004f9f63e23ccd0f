//! Adapter configuration

use serde::{Deserialize, Serialize};

/// Per-adapter configuration, owned by the caller.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdapterConfig {
    /// The provider id, e.g. `claude` or `openai`.
    pub provider: String,

    /// The API key for the provider.
    #[serde(default)]
    pub api_key: String,

    /// The model id or alias. Falls back to the provider default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// The assistant persona.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<Personality>,

    /// Sampling parameters.
    #[serde(default)]
    pub parameters: Parameters,

    /// Whether the conversation is a debate.
    #[serde(default)]
    pub debate_mode: bool,

    /// Override for the vendor endpoint root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl AdapterConfig {
    /// Create a new configuration for the given provider.
    pub fn new(provider: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            api_key: api_key.into(),
            model: None,
            personality: None,
            parameters: Parameters::default(),
            debate_mode: false,
            base_url: None,
        }
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the endpoint root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the persona.
    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = Some(personality);
        self
    }
}

/// Sampling parameters. Unset fields are never sent unless the vendor
/// requires a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct Parameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// An assistant persona.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Personality {
    /// Persona id.
    pub id: String,

    /// Display name, e.g. "Socrates".
    pub name: String,

    /// Instructions that replace the default system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}
