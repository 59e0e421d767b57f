//! Application configuration schemas.
//!
//! All configuration structs are deserialized from an optional TOML file
//! plus `PLAZA__`-prefixed environment variables via the `config` crate.
//! Every section carries serde defaults, so an empty file is valid.

pub mod host;
pub mod logging;
pub mod presence;
pub mod store;

use serde::{Deserialize, Serialize};

use self::host::HostConfig;
use self::logging::LoggingConfig;
use self::presence::PresenceConfig;
use self::store::StoreConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Liveness thresholds and leveling rules.
    #[serde(default)]
    pub presence: PresenceConfig,
    /// Backing store selection.
    #[serde(default)]
    pub store: StoreConfig,
    /// Session host settings.
    #[serde(default)]
    pub host: HostConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// The file is optional. Environment variables prefixed with `PLAZA__`
    /// override file values, using `__` as the section separator
    /// (`PLAZA__STORE__PROVIDER=redis`).
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("PLAZA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.validate()?;
        Ok(parsed)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        let p = &self.presence;
        if p.active_threshold_minutes == 0 {
            return Err(AppError::configuration(
                "presence.active_threshold_minutes must be positive",
            ));
        }
        if p.sleep_threshold_minutes <= p.active_threshold_minutes {
            return Err(AppError::configuration(
                "presence.sleep_threshold_minutes must exceed active_threshold_minutes",
            ));
        }
        if p.exp_per_level == 0 {
            return Err(AppError::configuration(
                "presence.exp_per_level must be positive",
            ));
        }
        if self.host.heartbeat_interval_seconds == 0 {
            return Err(AppError::configuration(
                "host.heartbeat_interval_seconds must be positive",
            ));
        }
        Ok(())
    }
}
