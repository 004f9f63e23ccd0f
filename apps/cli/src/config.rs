//! Configuration for the CLI

use anyhow::{Context, Result};
use model::{AdapterFactory, Mode};
use sbcore::{AdapterConfig, Parameters, Personality};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf, sync::LazyLock};

static CONFIG: LazyLock<PathBuf> = LazyLock::new(|| {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".config/switchboard.toml")
});

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// The provider used when none is given on the command line
    pub provider: String,

    /// Serve every request from the offline demo adapter
    #[serde(default)]
    pub demo: bool,

    /// The model or alias; falls back to the provider default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Sampling parameters
    #[serde(default)]
    pub parameters: Parameters,

    /// The assistant persona
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<Personality>,

    /// The API keys, by provider id
    #[serde(default)]
    pub key: BTreeMap<String, String>,

    /// Endpoint root overrides, by provider id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub base_url: BTreeMap<String, String>,
}

impl Config {
    /// Load the configuration from the file
    pub fn load() -> Result<Self> {
        let text = std::fs::read_to_string(CONFIG.as_path()).with_context(|| {
            format!(
                "failed to read {}, run `switchboard generate` first",
                CONFIG.display()
            )
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Load the configuration, or the defaults if the file is missing
    pub fn load_or_default() -> Result<Self> {
        if CONFIG.exists() {
            Self::load()
        } else {
            Ok(Self::default())
        }
    }

    /// Save the configuration to the file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = CONFIG.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(CONFIG.as_path(), toml::to_string(self)?)?;
        tracing::info!("Configuration saved to {}", CONFIG.display());
        Ok(())
    }

    /// The adapter configuration for a provider
    pub fn adapter(&self, provider: &str, model: Option<&str>) -> AdapterConfig {
        let mut config = AdapterConfig::new(
            provider,
            self.key.get(provider).cloned().unwrap_or_default(),
        );
        config.model = model.map(str::to_owned).or_else(|| {
            (provider == self.provider)
                .then(|| self.model.clone())
                .flatten()
        });
        config.parameters = self.parameters;
        config.personality = self.personality.clone();
        config.base_url = self.base_url.get(provider).cloned();
        config
    }

    /// The adapter factory, in demo mode if requested here or by `demo`
    pub fn factory(&self, demo: bool) -> AdapterFactory {
        let mode = if demo || self.demo {
            Mode::demo()
        } else {
            Mode::Live
        };
        AdapterFactory::new(Default::default(), mode)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: "claude".into(),
            demo: false,
            model: None,
            parameters: Parameters::default(),
            personality: None,
            key: [
                ("claude".to_string(), "YOUR_API_KEY".to_string()),
                ("openai".to_string(), "YOUR_API_KEY".to_string()),
            ]
            .into_iter()
            .collect::<_>(),
            base_url: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_config_for_default_provider() {
        let mut config = Config {
            model: Some("claude-latest".into()),
            ..Config::default()
        };
        config
            .base_url
            .insert("claude".into(), "http://localhost:9000/v1".into());

        let adapter = config.adapter("claude", None);
        assert_eq!(adapter.api_key, "YOUR_API_KEY");
        assert_eq!(adapter.model.as_deref(), Some("claude-latest"));
        assert_eq!(adapter.base_url.as_deref(), Some("http://localhost:9000/v1"));

        let other = config.adapter("mistral", None);
        assert!(other.api_key.is_empty());
        assert!(other.model.is_none());
        assert_eq!(
            config.adapter("mistral", Some("mistral-small-latest")).model.as_deref(),
            Some("mistral-small-latest")
        );
    }

    #[test]
    fn config_round_trips_through_toml() {
        let text = toml::to_string(&Config::default()).unwrap();
        let config: Config = toml::from_str(&text).unwrap();
        assert_eq!(config.provider, "claude");
        assert!(!config.demo);
        assert_eq!(config.key.len(), 2);
    }

    #[test]
    fn demo_flag_selects_demo_mode() {
        let config = Config::default();
        assert!(matches!(config.factory(true).mode(), Mode::Demo { .. }));
        assert!(matches!(config.factory(false).mode(), Mode::Live));
    }
}
