use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{ApiError, OwnerId};
use crate::app_state::AppState;
use crate::persistency::queue_item_repository::QueueItem;
use crate::sync::sync_executor::SyncExecutor;
use crate::sync::sync_processor::{SyncOutcome, SyncProcessor};

#[derive(Debug, Deserialize)]
pub struct SaveQueueItemRequest {
    pub item_type: Option<String>,
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct MarkErroredRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ClearSyncedResponse {
    pub deleted: u64,
}

/// Record a mutation made while the client was offline
pub async fn save_item(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(req): Json<SaveQueueItemRequest>,
) -> Result<(StatusCode, Json<QueueItem>), ApiError> {
    let item_type = match req.item_type.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return Err(ApiError::Validation("item_type is required".to_string())),
    };
    let payload = match req.payload {
        Some(p) if !p.is_null() => p,
        _ => return Err(ApiError::Validation("payload is required".to_string())),
    };

    let repo = state.persistency().queue_item_repository();
    let item = repo.save(&item_type, &payload, &owner_id).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Items still awaiting sync, oldest first
pub async fn list_pending(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
) -> Result<Json<Vec<QueueItem>>, ApiError> {
    let repo = state.persistency().queue_item_repository();
    let items = repo.get_pending_items(&owner_id).await?;
    Ok(Json(items))
}

/// Every item for the owner, newest first
pub async fn list_all(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
) -> Result<Json<Vec<QueueItem>>, ApiError> {
    let repo = state.persistency().queue_item_repository();
    let items = repo.get_all_items(&owner_id).await?;
    Ok(Json(items))
}

/// Run a batch sync for the owner. Partial success is still a 200; the
/// outcome carries per-item errors.
pub async fn sync_all(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
) -> Result<Json<SyncOutcome>, ApiError> {
    let registry = state.registry_factory.registry_for(&owner_id);
    let repo = state.persistency().queue_item_repository();
    let executor =
        SyncExecutor::with_config(state.persistency().queue_item_repository(), state.retry_config());
    let processor = SyncProcessor::new(repo, executor);

    let outcome = processor.sync_all(&owner_id, &registry).await?;
    Ok(Json(outcome))
}

/// Mark an item synced without running a handler (externally-driven sync)
pub async fn mark_synced(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<i64>,
) -> Result<Json<QueueItem>, ApiError> {
    let repo = state.persistency().queue_item_repository();
    if !repo.mark_synced(id, &owner_id).await? {
        return Err(ApiError::NotFound);
    }
    let item = repo
        .get_queue_item(id, &owner_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(item))
}

/// Mark an item errored without running a handler
pub async fn mark_errored(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<i64>,
    Json(req): Json<MarkErroredRequest>,
) -> Result<Json<QueueItem>, ApiError> {
    let repo = state.persistency().queue_item_repository();
    if !repo.mark_errored(id, &owner_id, &req.message).await? {
        return Err(ApiError::NotFound);
    }
    let item = repo
        .get_queue_item(id, &owner_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(item))
}

/// Delete one synced item. A pending or foreign item 404s.
pub async fn delete_item(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let repo = state.persistency().queue_item_repository();
    if repo.delete_synced(id, &owner_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// Delete all synced items for the owner
pub async fn clear_synced(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
) -> Result<Json<ClearSyncedResponse>, ApiError> {
    let repo = state.persistency().queue_item_repository();
    let deleted = repo.clear_synced(&owner_id).await?;
    Ok(Json(ClearSyncedResponse { deleted }))
}
