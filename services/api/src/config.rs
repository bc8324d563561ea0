//! services/api/src/config.rs
//!
//! Environment-based configuration for the API service. Everything is read
//! once at startup; a `.env` file is honored for local development.

use std::net::SocketAddr;
use tracing::Level;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// All runtime settings for the service.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// Required to run the server; left optional here so tests can build a
    /// `Config` without credentials.
    pub openai_api_key: Option<String>,
    /// Model name passed to the completion service for interpretations.
    pub interpretation_model: String,
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// `.env` loading is skipped under `cfg(test)` so tests stay hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        let interpretation_model = std::env::var("INTERPRETATION_MODEL")
            .unwrap_or_else(|_| "gpt-4o-mini".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            interpretation_model,
        })
    }
}
