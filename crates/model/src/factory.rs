//! `AdapterFactory` resolves provider ids to adapters; `CapabilityCache`
//! memoizes capabilities for callers that want it.

use crate::{
    Provider,
    claude::Claude,
    cohere::Cohere,
    demo::{Demo, SeededResponses},
    gemini::Gemini,
    mock::Mock,
    openai::{self, OpenAI},
    responses::Responses,
};
use compact_str::{CompactString, format_compact};
use parking_lot::RwLock;
use reqwest::Client;
use sbcore::{Adapter, AdapterConfig, Capabilities, Error, ProviderId, Result};
use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

/// How the factory builds adapters.
#[derive(Clone, Default)]
pub enum Mode {
    /// Real vendor adapters.
    #[default]
    Live,
    /// The demo adapter for every provider id.
    Demo {
        seeds: Option<Arc<dyn SeededResponses>>,
        pace: Option<Duration>,
    },
    /// The mock adapter for every provider id.
    Mock,
}

impl Mode {
    /// Demo mode without seeded replies.
    pub fn demo() -> Self {
        Self::Demo {
            seeds: None,
            pace: None,
        }
    }
}

impl fmt::Debug for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => f.write_str("Live"),
            Self::Demo { seeds, pace } => f
                .debug_struct("Demo")
                .field("seeded", &seeds.is_some())
                .field("pace", pace)
                .finish(),
            Self::Mock => f.write_str("Mock"),
        }
    }
}

/// The single seam through which callers obtain adapters.
///
/// Holds no per-provider state; every call builds a fresh adapter.
#[derive(Debug, Clone)]
pub struct AdapterFactory {
    client: Client,
    mode: Mode,
}

impl AdapterFactory {
    /// Create a factory sharing one HTTP client across adapters.
    pub fn new(client: Client, mode: Mode) -> Self {
        Self { client, mode }
    }

    /// A live factory with a default client.
    pub fn live() -> Self {
        Self::new(Client::new(), Mode::Live)
    }

    /// The active mode.
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Build the adapter for `config.provider`.
    pub fn create(&self, config: AdapterConfig) -> Result<Provider> {
        match &self.mode {
            Mode::Demo { seeds, pace } => {
                let mut demo = Demo::new(config);
                if let Some(seeds) = seeds {
                    demo = demo.with_seeds(seeds.clone());
                }
                if let Some(pace) = pace {
                    demo = demo.with_pace(*pace);
                }
                return Ok(demo.into());
            }
            Mode::Mock => return Ok(Mock::new(config).into()),
            Mode::Live => {}
        }

        let id: ProviderId = config.provider.parse().map_err(Error::UnknownProvider)?;
        tracing::debug!("creating {id} adapter");
        let client = self.client.clone();
        Ok(match id {
            ProviderId::Claude => Claude::new(client, config)?.into(),
            ProviderId::Google => Gemini::new(client, config)?.into(),
            ProviderId::OpenAiResponses => Responses::new(client, config)?.into(),
            ProviderId::Cohere => Cohere::new(client, config)?.into(),
            ProviderId::Demo => Demo::new(config).into(),
            id => match openai::vendor(id) {
                Some(vendor) => OpenAI::new(client, vendor, config)?.into(),
                None => return Err(Error::UnknownProvider(id.to_string())),
            },
        })
    }

    /// Build the adapter with `model` in place of the configured one.
    pub fn create_with_model(&self, mut config: AdapterConfig, model: &str) -> Result<Provider> {
        config.model = Some(model.to_owned());
        self.create(config)
    }

    /// Capabilities of a provider/model pair, via a throwaway adapter.
    pub fn capabilities(&self, config: AdapterConfig) -> Result<Capabilities> {
        Ok(self.create(config)?.capabilities())
    }
}

/// Capabilities keyed by `provider:model`.
///
/// Safe to share across tasks. Concurrent writers of the same key store
/// the same value, so the last write wins harmlessly.
#[derive(Debug, Default, Clone)]
pub struct CapabilityCache {
    entries: Arc<RwLock<HashMap<CompactString, Capabilities>>>,
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache key for a config: the canonical provider id and the
    /// resolved model, so aliases of either share an entry.
    pub fn key(config: &AdapterConfig) -> CompactString {
        match config.provider.parse::<ProviderId>() {
            Ok(id) => format_compact!(
                "{}:{}",
                id.as_str(),
                sbcore::registry::resolve_model(id, config.model.as_deref())
            ),
            Err(_) => format_compact!(
                "{}:{}",
                config.provider,
                config.model.as_deref().unwrap_or_default()
            ),
        }
    }

    /// Look up cached capabilities.
    pub fn get(&self, config: &AdapterConfig) -> Option<Capabilities> {
        self.entries.read().get(&Self::key(config)).copied()
    }

    /// Store capabilities for a config.
    pub fn insert(&self, config: &AdapterConfig, capabilities: Capabilities) {
        self.entries.write().insert(Self::key(config), capabilities);
    }

    /// Cached capabilities, computing and storing them through `factory`
    /// on a miss.
    pub fn get_or_load(
        &self,
        factory: &AdapterFactory,
        config: &AdapterConfig,
    ) -> Result<Capabilities> {
        if let Some(capabilities) = self.get(config) {
            return Ok(capabilities);
        }
        let capabilities = factory.capabilities(config.clone())?;
        self.insert(config, capabilities);
        Ok(capabilities)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
