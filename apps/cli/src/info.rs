//! Registry and capability listings

use super::Config;
use anyhow::Result;
use clap::Args;
use sbcore::{ProviderId, registry};

/// Print every provider's default and free-tier model, then the aliases.
pub fn print_models() {
    println!("{:<18} {:<44} FREE", "PROVIDER", "DEFAULT");
    for id in ProviderId::ALL {
        println!(
            "{:<18} {:<44} {}",
            id.as_str(),
            id.default_model(),
            id.free_model()
        );
    }

    println!("\n{:<22} MODEL", "ALIAS");
    for (alias, model) in registry::ALIASES {
        println!("{alias:<22} {model}");
    }
}

/// Capabilities command arguments
#[derive(Debug, Args)]
pub struct CapabilitiesCmd {
    /// The provider to inspect
    #[arg(short, long)]
    pub provider: String,

    /// The model or alias to inspect
    #[arg(short, long)]
    pub model: Option<String>,
}

impl CapabilitiesCmd {
    /// Run the capabilities command
    pub fn run(&self) -> Result<()> {
        let config = Config::load_or_default()?;
        let adapter = config.adapter(&self.provider, self.model.as_deref());
        let capabilities = config.factory(false).capabilities(adapter)?;
        println!("{}", serde_json::to_string_pretty(&capabilities)?);
        Ok(())
    }
}
