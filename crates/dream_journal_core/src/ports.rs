//! crates/dream_journal_core/src/ports.rs
//!
//! Service contracts for the core crate. The interpretation flow and the web
//! layer only ever talk to these traits; the concrete database and LLM
//! adapters live in the service crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Dream, Interpretation, PerspectiveText, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// Common error type for all port operations, hiding the concrete failure
/// (sqlx, HTTP client, ...) behind a small taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// Shorthand used by every port method.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The record store for dreams and their interpretations.
#[async_trait]
pub trait DreamStore: Send + Sync {
    // --- Dream Management ---
    async fn create_dream(
        &self,
        user_id: Uuid,
        title: &str,
        content: &str,
        emotions: &[String],
    ) -> PortResult<Dream>;

    async fn get_dream_by_id(&self, dream_id: Uuid) -> PortResult<Dream>;

    /// Returns the user's dreams, newest first.
    async fn list_dreams_for_user(&self, user_id: Uuid) -> PortResult<Vec<Dream>>;

    // --- Interpretation Management ---
    async fn find_interpretation(&self, dream_id: Uuid) -> PortResult<Option<Interpretation>>;

    /// Stores the three perspective pairs as one record. At most one
    /// interpretation may exist per dream; a concurrent duplicate insert must
    /// resolve to the already-stored record rather than a second row.
    async fn insert_interpretation(
        &self,
        dream_id: Uuid,
        islamic: PerspectiveText,
        spiritual: PerspectiveText,
        scientific: PerspectiveText,
    ) -> PortResult<Interpretation>;

    async fn update_dream_flag(&self, dream_id: Uuid, has_interpretation: bool) -> PortResult<()>;
}

/// User accounts and cookie sessions.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

/// The external generative-text service. Endpoint and credentials are
/// supplied out-of-band by the adapter's configuration.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Produces free-form text for a single prompt.
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> PortResult<String>;
}
