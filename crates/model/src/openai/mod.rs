//! OpenAI-compatible provider.
//!
//! One executor for every vendor whose API is shaped like OpenAI chat
//! completions. Vendors differ only in the [`Vendor`] descriptor: endpoint
//! root, capability flags, and optional citation support. Per-model wire
//! quirks come from [`sbcore::registry::profile`].

use crate::http::{self, HttpProvider};
use reqwest::Client;
use sbcore::{AdapterBase, AdapterConfig, ProviderId, Result};
pub use request::{ChatMessage, Content, ImageUrl, Part, Request};

mod provider;
mod request;

/// Static description of an OpenAI-compatible vendor.
#[derive(Debug, PartialEq, Eq)]
pub struct Vendor {
    /// Registry id.
    pub id: ProviderId,
    /// Endpoint root; `/chat/completions` is appended.
    pub base_url: &'static str,
    /// Whether the vendor accepts image input at all.
    pub attachments: bool,
    /// Maximum output tokens.
    pub max_tokens: u32,
    /// Context window in tokens.
    pub context_window: u32,
    /// Whether responses carry search results to expose as citations.
    pub citations: bool,
}

impl Vendor {
    /// Vendor name for messages.
    pub fn name(&self) -> &'static str {
        self.id.display_name()
    }

    /// Build the authenticated transport for this vendor.
    pub fn transport(
        &self,
        client: Client,
        key: &str,
        base_url: Option<&str>,
    ) -> Result<HttpProvider> {
        let endpoint = http::join(base_url.unwrap_or(self.base_url), "chat/completions");
        HttpProvider::bearer(client, key, &endpoint)
    }
}

pub const OPENAI: Vendor = Vendor {
    id: ProviderId::OpenAi,
    base_url: "https://api.openai.com/v1",
    attachments: true,
    max_tokens: 16_384,
    context_window: 128_000,
    citations: false,
};

pub const MISTRAL: Vendor = Vendor {
    id: ProviderId::Mistral,
    base_url: "https://api.mistral.ai/v1",
    attachments: true,
    max_tokens: 8_192,
    context_window: 128_000,
    citations: false,
};

pub const TOGETHER: Vendor = Vendor {
    id: ProviderId::Together,
    base_url: "https://api.together.xyz/v1",
    attachments: true,
    max_tokens: 8_192,
    context_window: 131_072,
    citations: false,
};

pub const DEEPSEEK: Vendor = Vendor {
    id: ProviderId::DeepSeek,
    base_url: "https://api.deepseek.com/v1",
    attachments: false,
    max_tokens: 8_192,
    context_window: 64_000,
    citations: false,
};

pub const GROK: Vendor = Vendor {
    id: ProviderId::Grok,
    base_url: "https://api.x.ai/v1",
    attachments: true,
    max_tokens: 16_384,
    context_window: 131_072,
    citations: false,
};

pub const PERPLEXITY: Vendor = Vendor {
    id: ProviderId::Perplexity,
    base_url: "https://api.perplexity.ai",
    attachments: false,
    max_tokens: 8_192,
    context_window: 127_072,
    citations: true,
};

/// Every OpenAI-compatible vendor.
pub const VENDORS: [&Vendor; 6] = [&OPENAI, &MISTRAL, &TOGETHER, &DEEPSEEK, &GROK, &PERPLEXITY];

/// Look up the descriptor for a provider.
pub fn vendor(id: ProviderId) -> Option<&'static Vendor> {
    VENDORS.into_iter().find(|v| v.id == id)
}

/// The OpenAI-compatible adapter.
#[derive(Clone, Debug)]
pub struct OpenAI {
    base: AdapterBase,
    vendor: &'static Vendor,
    http: HttpProvider,
}

impl OpenAI {
    /// Create an adapter for the given vendor.
    pub fn new(client: Client, vendor: &'static Vendor, config: AdapterConfig) -> Result<Self> {
        let http = vendor.transport(client, &config.api_key, config.base_url.as_deref())?;
        Ok(Self {
            base: AdapterBase::new(vendor.id, config),
            vendor,
            http,
        })
    }

    /// Create an adapter targeting the OpenAI API.
    pub fn api(client: Client, config: AdapterConfig) -> Result<Self> {
        Self::new(client, &OPENAI, config)
    }

    /// The vendor descriptor.
    pub fn vendor(&self) -> &'static Vendor {
        self.vendor
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        self.http.endpoint()
    }

    /// The shared adapter state.
    pub fn base(&self) -> &AdapterBase {
        &self.base
    }
}
