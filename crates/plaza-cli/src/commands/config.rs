//! Configuration CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use plaza_core::error::AppError;
use plaza_store::redis::client::mask_redis_url;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = super::load_config(config_path)?;
            if format == OutputFormat::Json {
                output::print_json(&config);
                return Ok(());
            }
            let p = &config.presence;
            println!("Configuration '{config_path}'");
            output::print_kv("Active threshold", &format!("{} min", p.active_threshold_minutes));
            output::print_kv("Sleep threshold", &format!("{} min", p.sleep_threshold_minutes));
            output::print_kv("Greeting exp", &p.greeting_exp.to_string());
            output::print_kv("Exp per level", &p.exp_per_level.to_string());
            output::print_kv("Store", &config.store.provider);
            if config.store.provider == "redis" {
                output::print_kv("Redis", &mask_redis_url(&config.store.redis.url));
            }
            output::print_kv(
                "Heartbeat",
                &format!("{} s", config.host.heartbeat_interval_seconds),
            );
            output::print_kv("State dir", &config.host.state_dir.display().to_string());
            output::print_kv("Log level", &config.logging.level);
        }
    }

    Ok(())
}
