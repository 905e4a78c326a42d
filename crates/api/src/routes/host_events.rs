//! Host event management endpoints.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{
    event::expiry_from, CreateEventRequest, DeleteEventResponse, Event, EventWithMemories, Memory,
};
use domain::services::Caller;
use persistence::repositories::{EventRepository, MemoryRepository};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::HostAuth;
use crate::middleware::metrics::record_storage_delete_failure;

use super::access::{load_managed_event, load_profile};

/// The caller's events (all events for admins), newest date first, each
/// with its memories newest first.
///
/// GET /api/host/events
pub async fn list_events(
    State(state): State<AppState>,
    auth: HostAuth,
) -> Result<Json<Vec<EventWithMemories>>, ApiError> {
    let profile = load_profile(&state, &auth).await?;
    let caller = Caller::new(auth.user_id(), profile.as_ref());

    let event_repo = EventRepository::new(state.pool.clone());
    let events = if caller.is_admin() {
        event_repo.list_all().await?
    } else {
        event_repo.list_by_owner(auth.user_id()).await?
    };

    let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
    let mut memories_by_event: HashMap<Uuid, Vec<Memory>> = HashMap::new();
    for memory in MemoryRepository::new(state.pool.clone())
        .list_for_events(&ids)
        .await?
    {
        memories_by_event
            .entry(memory.event_id)
            .or_default()
            .push(memory.into());
    }

    let response = events
        .into_iter()
        .map(|entity| {
            let memories = memories_by_event.remove(&entity.id).unwrap_or_default();
            EventWithMemories {
                event: entity.into(),
                memories,
            }
        })
        .collect();

    Ok(Json(response))
}

/// Create an event owned by the caller.
///
/// POST /api/host/events
pub async fn create_event(
    State(state): State<AppState>,
    auth: HostAuth,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let event_repo = EventRepository::new(state.pool.clone());
    let slug = event_repo.generate_unique_slug(&request.title).await?;
    let expires_at = expiry_from(Utc::now(), state.config.limits.event_lifetime_days);

    let event: Event = event_repo
        .create_within_quota(auth.user_id(), &slug, &request, expires_at)
        .await?
        .into();

    info!(
        user_id = %event.user_id,
        event_id = %event.id,
        slug = %event.slug,
        package = %event.package,
        "Event created"
    );

    Ok((StatusCode::CREATED, Json(event)))
}

/// Delete an event, its memories and their stored files.
///
/// DELETE /api/host/events/:id
pub async fn delete_event(
    State(state): State<AppState>,
    auth: HostAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<DeleteEventResponse>, ApiError> {
    load_managed_event(&state, &auth, event_id).await?;

    let locators = EventRepository::new(state.pool.clone())
        .delete_with_memories(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".into()))?;

    for locator in &locators {
        if let Err(e) = state.storage.delete_file(locator).await {
            record_storage_delete_failure();
            warn!(event_id = %event_id, locator = %locator, error = %e, "Failed to delete stored file");
        }
    }

    info!(
        user_id = %auth.user_id(),
        event_id = %event_id,
        deleted_memories = locators.len(),
        "Event deleted"
    );

    Ok(Json(DeleteEventResponse {
        message: "Event deleted".to_string(),
        deleted_memories: locators.len() as u64,
    }))
}

/// All memories of a managed event, newest first.
///
/// GET /api/host/events/:id/memories
pub async fn list_event_memories(
    State(state): State<AppState>,
    auth: HostAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<Memory>>, ApiError> {
    load_managed_event(&state, &auth, event_id).await?;

    let memories = MemoryRepository::new(state.pool.clone())
        .list_by_event(event_id)
        .await?
        .into_iter()
        .map(Memory::from)
        .collect();

    Ok(Json(memories))
}
