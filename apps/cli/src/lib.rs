//! Switchboard CLI

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};
pub use {
    chat::ChatCmd,
    config::Config,
    info::{CapabilitiesCmd, print_models},
};

mod chat;
mod config;
mod info;

/// Switchboard CLI
#[derive(Debug, Parser)]
#[command(name = "switchboard", version, about)]
pub struct App {
    /// Enable streaming mode
    #[arg(short, long, global = true)]
    pub stream: bool,

    /// Verbosity level (use -v, -vv, -vvv, etc.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chat with a provider
    Chat(chat::ChatCmd),

    /// List providers, default models and aliases
    Models,

    /// Show what a provider and model support
    Capabilities(info::CapabilitiesCmd),

    /// Generate the configuration file
    Generate,
}

impl App {
    /// Initialize tracing subscriber based on verbosity
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let directive = match self.verbose {
                0 => "info",
                1 => "switchboard=debug,switchboard_model=debug,switchboard_core=debug",
                2 => "switchboard=trace,switchboard_model=trace,switchboard_core=trace",
                3 => "debug",
                _ => "trace",
            };
            EnvFilter::new(directive)
        });

        fmt()
            .without_time()
            .with_env_filter(filter)
            .with_target(self.verbose != 0)
            .init();
    }
}
