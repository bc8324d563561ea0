//! crates/dream_journal_core/src/domain.rs
//!
//! The core data model: dreams, their interpretations, and user accounts.
//! Nothing here knows about the database or the wire format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Represents a single journaled dream entry.
#[derive(Debug, Clone)]
pub struct Dream {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    /// User-chosen emotion labels. Unordered; duplicates are not rejected.
    pub emotions: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Set to true exactly once, after an interpretation has been stored.
    pub has_interpretation: bool,
}

/// One perspective's generated text: a short title plus the analysis body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerspectiveText {
    pub title: String,
    pub content: String,
}

/// The three-perspective analysis of one dream. Immutable once created;
/// at most one exists per dream.
#[derive(Debug, Clone)]
pub struct Interpretation {
    pub id: Uuid,
    pub dream_id: Uuid,
    pub islamic: PerspectiveText,
    pub spiritual: PerspectiveText,
    pub scientific: PerspectiveText,
    pub created_at: DateTime<Utc>,
}

/// An account as the rest of the app sees it.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

/// Login-time view of an account; carries the password hash and never
/// leaves the auth handlers.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}
