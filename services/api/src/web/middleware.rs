//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for the protected journal routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use crate::web::auth::session_id_from_cookies;
use crate::web::state::AppState;

/// Validates the session cookie and stashes the caller's user_id in the
/// request extensions for handlers to pick up. Missing, unparsable, or
/// expired sessions all yield 401 without reaching the handler.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let auth_session_id =
        session_id_from_cookies(cookie_header).ok_or(StatusCode::UNAUTHORIZED)?;

    let user_id = state
        .auth
        .validate_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to validate auth session: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(user_id);

    Ok(next.run(req).await)
}
