//! Database configuration from the environment.
//!
//! Values are read from environment variables with fallback to defaults.
//!
//! | Variable                     | Default        |
//! |------------------------------|----------------|
//! | `BAZAAR_DATABASE_PATH`       | `./bazaar.db`  |
//! | `BAZAAR_DB_MAX_CONNECTIONS`  | `5`            |
//! | `BAZAAR_DB_BUSY_TIMEOUT_MS`  | `5000`         |

use std::env;
use std::time::Duration;

use crate::pool::DbConfig;

pub const DATABASE_PATH_VAR: &str = "BAZAAR_DATABASE_PATH";
pub const MAX_CONNECTIONS_VAR: &str = "BAZAAR_DB_MAX_CONNECTIONS";
pub const BUSY_TIMEOUT_VAR: &str = "BAZAAR_DB_BUSY_TIMEOUT_MS";

impl DbConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds a config from any variable source.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = lookup(DATABASE_PATH_VAR).unwrap_or_else(|| "./bazaar.db".to_string());

        let max_connections: u32 = lookup(MAX_CONNECTIONS_VAR)
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue(MAX_CONNECTIONS_VAR.to_string()))?;

        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(MAX_CONNECTIONS_VAR.to_string()));
        }

        let busy_timeout_ms: u64 = lookup(BUSY_TIMEOUT_VAR)
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue(BUSY_TIMEOUT_VAR.to_string()))?;

        Ok(DbConfig::new(path)
            .max_connections(max_connections)
            .busy_timeout(Duration::from_millis(busy_timeout_ms)))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
