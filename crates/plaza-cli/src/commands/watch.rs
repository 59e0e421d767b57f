//! Live roster stream.

use crate::output::{self, OutputFormat};
use plaza_core::error::AppError;

use super::roster::print_roster;

/// Print every roster emission until Ctrl-C
pub async fn execute(config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    let engine = super::connect_engine(config_path).await?;

    let subscription = engine
        .subscribe(move |roster| {
            if format == OutputFormat::Table {
                println!(
                    "── {} ──",
                    roster
                        .computed_at
                        .map(|t| t.format("%H:%M:%S").to_string())
                        .unwrap_or_default()
                );
            }
            print_roster(&roster, format);
        })
        .await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for Ctrl-C: {e}")))?;

    subscription.close().await;
    output::print_success("Stopped watching");
    Ok(())
}
