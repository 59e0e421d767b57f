//! CLI command definitions and dispatch.

pub mod config;
pub mod greet;
pub mod profile;
pub mod roster;
pub mod session;
pub mod watch;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use plaza_core::config::AppConfig;
use plaza_core::error::AppError;
use plaza_presence::PresenceEngine;

/// Code Plaza presence administration
#[derive(Debug, Parser)]
#[command(name = "plaza-cli", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List everyone currently visible
    Roster,
    /// Profile management
    Profile(profile::ProfileArgs),
    /// Greet someone on behalf of an identity
    Greet(greet::GreetArgs),
    /// Send a heartbeat for an identity
    Touch(session::SessionArgs),
    /// Clear an identity's greetings for today
    Reset(session::SessionArgs),
    /// Stream roster changes until interrupted
    Watch,
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Roster => roster::execute(&self.config, self.format).await,
            Commands::Profile(args) => profile::execute(args, &self.config, self.format).await,
            Commands::Greet(args) => greet::execute(args, &self.config, self.format).await,
            Commands::Touch(args) => session::touch(args, &self.config).await,
            Commands::Reset(args) => session::reset(args, &self.config).await,
            Commands::Watch => watch::execute(&self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: build an engine over the configured store
pub async fn connect_engine(config_path: &str) -> Result<PresenceEngine, AppError> {
    let config = load_config(config_path)?;
    PresenceEngine::from_config(&config).await
}
