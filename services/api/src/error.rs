//! services/api/src/error.rs
//!
//! The top-level error type for the `api` service binaries.

use crate::config::ConfigError;
use dream_journal_core::ports::PortError;

/// Everything that can go wrong while starting or running the service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A failure that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A failure from the database layer (connection, migrations).
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Socket binding and other IO failures.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
