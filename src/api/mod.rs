//! HTTP surface of the queue engine.
//!
//! Thin axum layer over the repository and the sync engine. Authentication
//! proper lives upstream; this layer only reads the owner identity the
//! gateway forwards in the `X-User-Id` header.

pub mod queue;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use log::{error, info};
use serde_json::json;

use crate::app_state::AppState;

pub const OWNER_HEADER: &str = "x-user-id";

/// Owner identity extracted from the gateway header
pub struct OwnerId(pub String);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| OwnerId(s.to_string()))
            .ok_or(ApiError::MissingOwner)
    }
}

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    MissingOwner,
    NotFound,
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::MissingOwner => (
                StatusCode::UNAUTHORIZED,
                format!("Missing {} header", OWNER_HEADER),
            ),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Queue item not found".to_string()),
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/queue", post(queue::save_item).get(queue::list_all))
        .route("/v1/queue/pending", get(queue::list_pending))
        .route("/v1/queue/sync", post(queue::sync_all))
        .route("/v1/queue/synced", delete(queue::clear_synced))
        .route("/v1/queue/:id", delete(queue::delete_item))
        .route("/v1/queue/:id/synced", post(queue::mark_synced))
        .route("/v1/queue/:id/errored", post(queue::mark_errored))
        .with_state(state)
}

pub async fn serve(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
