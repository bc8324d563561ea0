//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::{DateTime, Utc};
use dream_journal_core::domain::{Dream, Interpretation};
use dream_journal_core::interpreter::InterpretError;
use dream_journal_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        create_dream_handler,
        list_dreams_handler,
        get_dream_handler,
        interpret_dream_handler,
    ),
    components(
        schemas(
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
            CreateDreamRequest,
            DreamResponse,
            DreamDetailResponse,
            PerspectiveResponse,
            InterpretationResponse,
        )
    ),
    tags(
        (name = "Dream Journal API", description = "API endpoints for journaling dreams and requesting interpretations.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

/// The payload for creating a new journal entry.
#[derive(Deserialize, ToSchema)]
pub struct CreateDreamRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub emotions: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DreamResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub emotions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub has_interpretation: bool,
}

impl From<Dream> for DreamResponse {
    fn from(dream: Dream) -> Self {
        Self {
            id: dream.id,
            user_id: dream.user_id,
            title: dream.title,
            content: dream.content,
            emotions: dream.emotions,
            created_at: dream.created_at,
            has_interpretation: dream.has_interpretation,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PerspectiveResponse {
    pub title: String,
    pub content: String,
}

#[derive(Serialize, ToSchema)]
pub struct InterpretationResponse {
    pub id: Uuid,
    pub dream_id: Uuid,
    pub islamic: PerspectiveResponse,
    pub spiritual: PerspectiveResponse,
    pub scientific: PerspectiveResponse,
    pub created_at: DateTime<Utc>,
}

impl From<Interpretation> for InterpretationResponse {
    fn from(i: Interpretation) -> Self {
        Self {
            id: i.id,
            dream_id: i.dream_id,
            islamic: PerspectiveResponse {
                title: i.islamic.title,
                content: i.islamic.content,
            },
            spiritual: PerspectiveResponse {
                title: i.spiritual.title,
                content: i.spiritual.content,
            },
            scientific: PerspectiveResponse {
                title: i.scientific.title,
                content: i.scientific.content,
            },
            created_at: i.created_at,
        }
    }
}

/// One dream together with its interpretation, when one exists.
#[derive(Serialize, ToSchema)]
pub struct DreamDetailResponse {
    pub dream: DreamResponse,
    pub interpretation: Option<InterpretationResponse>,
}

//=========================================================================================
// Shared Handler Helpers
//=========================================================================================

/// Loads a dream and checks it belongs to the calling user.
async fn load_owned_dream(
    state: &AppState,
    user_id: Uuid,
    dream_id: Uuid,
) -> Result<Dream, (StatusCode, String)> {
    let dream = state.store.get_dream_by_id(dream_id).await.map_err(|e| match e {
        PortError::NotFound(_) => (StatusCode::NOT_FOUND, "Dream not found".to_string()),
        other => {
            error!("Failed to load dream {}: {:?}", dream_id, other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load dream".to_string(),
            )
        }
    })?;

    if dream.user_id != user_id {
        return Err((
            StatusCode::FORBIDDEN,
            "Dream belongs to another user".to_string(),
        ));
    }

    Ok(dream)
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Create a new journal entry for the authenticated user.
#[utoipa::path(
    post,
    path = "/dreams",
    request_body = CreateDreamRequest,
    responses(
        (status = 201, description = "Dream created successfully", body = DreamResponse),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_dream_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateDreamRequest>,
) -> Result<(StatusCode, Json<DreamResponse>), (StatusCode, String)> {
    let dream = state
        .store
        .create_dream(user_id, &req.title, &req.content, &req.emotions)
        .await
        .map_err(|e| {
            error!("Failed to create dream: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create dream".to_string(),
            )
        })?;

    Ok((StatusCode::CREATED, Json(dream.into())))
}

/// List the authenticated user's dreams, newest first.
#[utoipa::path(
    get,
    path = "/dreams",
    responses(
        (status = 200, description = "The user's dreams", body = [DreamResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_dreams_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<DreamResponse>>, (StatusCode, String)> {
    let dreams = state.store.list_dreams_for_user(user_id).await.map_err(|e| {
        error!("Failed to list dreams: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list dreams".to_string(),
        )
    })?;

    Ok(Json(dreams.into_iter().map(Into::into).collect()))
}

/// Fetch one dream together with its interpretation, if present.
#[utoipa::path(
    get,
    path = "/dreams/{id}",
    responses(
        (status = 200, description = "The dream and its interpretation", body = DreamDetailResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Dream belongs to another user"),
        (status = 404, description = "Dream not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = Uuid, Path, description = "The dream's unique ID.")
    )
)]
pub async fn get_dream_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(dream_id): Path<Uuid>,
) -> Result<Json<DreamDetailResponse>, (StatusCode, String)> {
    let dream = load_owned_dream(&state, user_id, dream_id).await?;

    let interpretation = state.store.find_interpretation(dream_id).await.map_err(|e| {
        error!("Failed to load interpretation for dream {}: {:?}", dream_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load interpretation".to_string(),
        )
    })?;

    Ok(Json(DreamDetailResponse {
        dream: dream.into(),
        interpretation: interpretation.map(Into::into),
    }))
}

/// Generate (or return the stored) three-perspective interpretation of a dream.
///
/// Idempotent: once a dream has been interpreted, further calls return the
/// stored record without contacting the completion service again.
#[utoipa::path(
    post,
    path = "/dreams/{id}/interpret",
    responses(
        (status = 200, description = "The dream's interpretation", body = InterpretationResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Dream belongs to another user"),
        (status = 404, description = "Dream not found"),
        (status = 502, description = "The completion service failed"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = Uuid, Path, description = "The dream's unique ID.")
    )
)]
pub async fn interpret_dream_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(dream_id): Path<Uuid>,
) -> Result<Json<InterpretationResponse>, (StatusCode, String)> {
    let dream = load_owned_dream(&state, user_id, dream_id).await?;

    let interpretation = state.interpreter.interpret_dream(&dream).await.map_err(|e| match e {
        InterpretError::Upstream(cause) => {
            error!("Completion service failed for dream {}: {:?}", dream_id, cause);
            (
                StatusCode::BAD_GATEWAY,
                "Interpretation service is unavailable".to_string(),
            )
        }
        InterpretError::Storage(cause) => {
            error!("Failed to store interpretation for dream {}: {:?}", dream_id, cause);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store interpretation".to_string(),
            )
        }
    })?;

    Ok(Json(interpretation.into()))
}

//=========================================================================================
// Tests
//=========================================================================================
