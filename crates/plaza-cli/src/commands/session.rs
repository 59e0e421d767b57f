//! Session maintenance commands.

use clap::Args;

use crate::output;
use plaza_core::error::AppError;
use plaza_core::types::Identity;

/// Arguments naming one identity
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Identity
    pub uid: Identity,
}

/// Record a heartbeat
pub async fn touch(args: &SessionArgs, config_path: &str) -> Result<(), AppError> {
    let engine = super::connect_engine(config_path).await?;
    engine.touch(&args.uid).await?;
    output::print_success(&format!("Heartbeat recorded for '{}'", args.uid));
    Ok(())
}

/// Clear today's greetings
pub async fn reset(args: &SessionArgs, config_path: &str) -> Result<(), AppError> {
    let engine = super::connect_engine(config_path).await?;
    if engine.session(&args.uid).await?.is_none() {
        output::print_warning(&format!("'{}' has no session", args.uid));
        return Ok(());
    }
    engine.reset_greetings(&args.uid).await?;
    output::print_success(&format!("Greetings reset for '{}'", args.uid));
    Ok(())
}
