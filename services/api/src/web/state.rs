//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use dream_journal_core::interpreter::InterpretationRequester;
use dream_journal_core::ports::{AuthStore, DreamStore};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The store and auth ports are usually two views of the same database
/// adapter, but handlers only ever see the trait they need.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DreamStore>,
    pub auth: Arc<dyn AuthStore>,
    pub interpreter: InterpretationRequester,
    pub config: Arc<Config>,
}
