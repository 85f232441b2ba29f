//! Configuration management for the server.

use crate::store::WriteMode;
use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection URL; documents stay in memory when unset
    pub database_url: Option<String>,
    /// Whether mutations wait for the remote snapshot write
    pub write_mode: WriteMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            write_mode: WriteMode::Awaited,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        let write_mode = match lookup("WRITE_MODE") {
            None => WriteMode::Awaited,
            Some(value) => value
                .parse::<WriteMode>()
                .map_err(|_| ConfigError::InvalidWriteMode(value))?,
        };

        Ok(Self {
            host,
            port,
            database_url,
            write_mode,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid WRITE_MODE value '{0}' (expected 'awaited' or 'background')")]
    InvalidWriteMode(String),
}
