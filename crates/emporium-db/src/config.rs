//! Service configuration.
//!
//! Loaded from environment variables with fallback to defaults.
//!
//! | Variable                        | Default         |
//! |---------------------------------|-----------------|
//! | `EMPORIUM_DATABASE_PATH`        | `./emporium.db` |
//! | `EMPORIUM_DB_MAX_CONNECTIONS`   | `5`             |
//! | `EMPORIUM_RESET_TOKEN_TTL_SECS` | `3600`          |
//!
//! The reset-token TTL must lie in `1..=MAX_RESET_TOKEN_TTL_SECS`.
//! | `EMPORIUM_LOG_FILTER`           | `info`          |

use chrono::Duration;
use emporium_core::{TokenLifecycle, DEFAULT_RESET_TOKEN_TTL_SECS, MAX_RESET_TOKEN_TTL_SECS};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

use crate::pool::DbConfig;

/// Runtime configuration for the database layer and services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// SQLite file path
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Password-reset token validity window
    pub reset_token_ttl_secs: i64,

    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            database_path: PathBuf::from("./emporium.db"),
            max_connections: 5,
            reset_token_ttl_secs: DEFAULT_RESET_TOKEN_TTL_SECS,
            log_filter: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServiceConfig::default();

        let config = ServiceConfig {
            database_path: lookup("EMPORIUM_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_or(&lookup, "EMPORIUM_DB_MAX_CONNECTIONS", defaults.max_connections)?,

            reset_token_ttl_secs: parse_or(
                &lookup,
                "EMPORIUM_RESET_TOKEN_TTL_SECS",
                defaults.reset_token_ttl_secs,
            )?,

            log_filter: lookup("EMPORIUM_LOG_FILTER").unwrap_or(defaults.log_filter),
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("EMPORIUM_DB_MAX_CONNECTIONS".to_string()));
        }
        if !(1..=MAX_RESET_TOKEN_TTL_SECS).contains(&config.reset_token_ttl_secs) {
            return Err(ConfigError::InvalidValue("EMPORIUM_RESET_TOKEN_TTL_SECS".to_string()));
        }
        EnvFilter::try_new(&config.log_filter)
            .map_err(|_| ConfigError::InvalidValue("EMPORIUM_LOG_FILTER".to_string()))?;

        Ok(config)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }

    /// System clock, random tokens, configured TTL.
    ///
    /// A TTL outside the accepted range (possible only for a config built
    /// by hand) is clamped to it.
    pub fn token_lifecycle(&self) -> TokenLifecycle {
        let secs = self.reset_token_ttl_secs.clamp(1, MAX_RESET_TOKEN_TTL_SECS);
        TokenLifecycle::system().with_ttl(Duration::seconds(secs))
    }

    /// Installs a global `fmt` subscriber filtered by `log_filter`.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_new(&self.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
        // A subscriber may already be installed (tests, embedding host)
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
