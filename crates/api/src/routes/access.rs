//! Ownership checks shared by host-scoped handlers.

use domain::models::{Event, Profile};
use domain::services::{can_manage, Caller};
use persistence::repositories::{EventRepository, ProfileRepository};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::HostAuth;

/// The caller's profile, if registered.
pub async fn load_profile(state: &AppState, auth: &HostAuth) -> Result<Option<Profile>, ApiError> {
    Ok(ProfileRepository::new(state.pool.clone())
        .find_by_id(auth.user_id())
        .await?
        .map(Profile::from))
}

/// Fails with 403 unless the caller owns `event` or is an admin.
pub async fn authorize_event(
    state: &AppState,
    auth: &HostAuth,
    event: &Event,
) -> Result<(), ApiError> {
    let profile = load_profile(state, auth).await?;
    let caller = Caller::new(auth.user_id(), profile.as_ref());

    if can_manage(&caller, &event.user_id) {
        Ok(())
    } else {
        tracing::info!(
            user_id = %auth.user_id(),
            event_id = %event.id,
            "Access to foreign event denied"
        );
        Err(ApiError::Forbidden(
            "You do not have permission to manage this event".into(),
        ))
    }
}

/// Loads an event (404) and applies [`authorize_event`].
pub async fn load_managed_event(
    state: &AppState,
    auth: &HostAuth,
    event_id: Uuid,
) -> Result<Event, ApiError> {
    let event = EventRepository::new(state.pool.clone())
        .find_by_id(event_id)
        .await?
        .map(Event::from)
        .ok_or_else(|| ApiError::NotFound("Event not found".into()))?;

    authorize_event(state, auth, &event).await?;
    Ok(event)
}
