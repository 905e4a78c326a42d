//! Host profile endpoints.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use domain::models::{Profile, RegisterProfileRequest};
use persistence::repositories::ProfileRepository;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::HostAuth;

use super::access::load_profile;

/// Create the caller's profile if it does not exist yet.
///
/// POST /api/host/register-profile
///
/// Returns 201 for a new profile and 200 with the stored one otherwise.
/// The email comes from the body or, when absent, from the token.
pub async fn register_profile(
    State(state): State<AppState>,
    auth: HostAuth,
    body: Bytes,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    let request: RegisterProfileRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RegisterProfileRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Validation(format!("Invalid JSON body: {}", e)))?
    };
    request.validate()?;

    let email = request
        .email
        .as_deref()
        .or(auth.email())
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::Validation("Email is required".into()))?
        .to_string();

    let repo = ProfileRepository::new(state.pool.clone());
    let created = repo.create_if_absent(auth.user_id(), &email).await?;
    let profile = repo
        .find_by_id(auth.user_id())
        .await?
        .map(Profile::from)
        .ok_or_else(|| ApiError::Internal("Profile missing after registration".into()))?;

    if created {
        info!(user_id = %profile.id, "Profile registered");
        Ok((StatusCode::CREATED, Json(profile)))
    } else {
        Ok((StatusCode::OK, Json(profile)))
    }
}

/// The caller's profile.
///
/// GET /api/host/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: HostAuth,
) -> Result<Json<Profile>, ApiError> {
    load_profile(&state, &auth)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))
}
