//! Greeting command.

use clap::Args;

use crate::output::{self, OutputFormat};
use plaza_core::error::AppError;
use plaza_core::types::Identity;

/// Arguments for the greet command
#[derive(Debug, Args)]
pub struct GreetArgs {
    /// Identity doing the greeting
    pub uid: Identity,
    /// Identity being greeted
    pub greeted: Identity,
}

/// Execute the greet command
pub async fn execute(
    args: &GreetArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config_path).await?;

    match engine.greet(&args.uid, &args.greeted).await? {
        Some(result) => match format {
            OutputFormat::Json => output::print_json(&result),
            OutputFormat::Table => output::print_success(&format!(
                "'{}' greeted '{}': level {} ({} exp)",
                args.uid, args.greeted, result.level, result.exp
            )),
        },
        None => {
            if format == OutputFormat::Json {
                output::print_json(&serde_json::Value::Null);
            } else {
                output::print_warning("No experience awarded (no session, self-greeting, or already greeted today)");
            }
        }
    }

    Ok(())
}
