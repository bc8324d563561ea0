pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

// Re-export the REST handlers to make them easily accessible
// to the binary that will build the web server router.
pub use middleware::require_auth;
pub use rest::{
    create_dream_handler, get_dream_handler, interpret_dream_handler, list_dreams_handler,
};
