//! Host authentication extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::host_auth::HostIdentity;

/// Authenticated host.
///
/// Uses the identity stored by `require_host_auth` when the route sits
/// behind it, otherwise verifies the bearer token itself.
#[derive(Debug, Clone)]
pub struct HostAuth(pub HostIdentity);

impl HostAuth {
    pub fn user_id(&self) -> &str {
        &self.0.user_id
    }

    pub fn email(&self) -> Option<&str> {
        self.0.email.as_deref()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for HostAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<HostIdentity>() {
            return Ok(HostAuth(identity.clone()));
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized("Missing or invalid Authorization header".into())
                })?;

        let identity = state.identity.verify(bearer.token()).await?;
        Ok(HostAuth(identity.into()))
    }
}
