//! Memory moderation endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use domain::models::{DeleteMemoryResponse, Memory, UpdateMemoryRequest};
use persistence::repositories::MemoryRepository;
use tracing::{info, warn};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::HostAuth;
use crate::middleware::metrics::record_storage_delete_failure;

use super::access::load_managed_event;

/// Loads a memory (404) whose parent event the caller manages (403).
async fn load_managed_memory(
    state: &AppState,
    auth: &HostAuth,
    memory_id: i64,
) -> Result<Memory, ApiError> {
    let memory: Memory = MemoryRepository::new(state.pool.clone())
        .find_by_id(memory_id)
        .await?
        .map(Memory::from)
        .ok_or_else(|| ApiError::NotFound("Memory not found".into()))?;

    load_managed_event(state, auth, memory.event_id).await?;
    Ok(memory)
}

/// Approve or hide a memory.
///
/// PATCH /api/host/memories/:id
pub async fn update_memory(
    State(state): State<AppState>,
    auth: HostAuth,
    Path(memory_id): Path<i64>,
    payload: Result<Json<UpdateMemoryRequest>, JsonRejection>,
) -> Result<Json<Memory>, ApiError> {
    let Json(request) = payload?;
    load_managed_memory(&state, &auth, memory_id).await?;

    let memory: Memory = MemoryRepository::new(state.pool.clone())
        .set_approved(memory_id, request.is_approved)
        .await?
        .map(Memory::from)
        .ok_or_else(|| ApiError::NotFound("Memory not found".into()))?;

    info!(
        user_id = %auth.user_id(),
        memory_id = memory.id,
        event_id = %memory.event_id,
        is_approved = memory.is_approved,
        "Memory moderated"
    );

    Ok(Json(memory))
}

/// Delete a memory and, best effort, its stored file.
///
/// DELETE /api/host/memories/:id
pub async fn delete_memory(
    State(state): State<AppState>,
    auth: HostAuth,
    Path(memory_id): Path<i64>,
) -> Result<Json<DeleteMemoryResponse>, ApiError> {
    let memory = load_managed_memory(&state, &auth, memory_id).await?;

    MemoryRepository::new(state.pool.clone())
        .delete_and_release_storage(memory_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Memory not found".into()))?;

    if let Err(e) = state.storage.delete_file(&memory.storage_path).await {
        record_storage_delete_failure();
        warn!(
            memory_id = memory.id,
            locator = %memory.storage_path,
            error = %e,
            "Failed to delete stored file"
        );
    }

    info!(
        user_id = %auth.user_id(),
        memory_id = memory.id,
        event_id = %memory.event_id,
        "Memory deleted"
    );

    Ok(Json(DeleteMemoryResponse {
        message: "Memory deleted".to_string(),
        id: memory.id,
    }))
}
