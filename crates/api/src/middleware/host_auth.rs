//! Host authentication middleware.
//!
//! Verifies the bearer token with the configured identity provider and
//! stores the resolved [`HostIdentity`] in request extensions. Role and
//! tier are not resolved here; handlers that need them load the profile.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use domain::services::Identity;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::trace_id::get_request_id;

/// Caller identity attached by [`require_host_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    /// Identity-provider user id (also the profile primary key)
    pub user_id: String,
    pub email: Option<String>,
}

impl From<Identity> for HostIdentity {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            email: identity.email,
        }
    }
}

/// Rejects requests without a valid `Authorization: Bearer` token (401).
pub async fn require_host_auth(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return ApiError::Unauthorized("Missing or invalid Authorization header".into())
            .into_response();
    };

    match state.identity.verify(bearer.token()).await {
        Ok(identity) => {
            req.extensions_mut().insert(HostIdentity::from(identity));
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(
                request_id = %get_request_id(req.extensions()),
                error = %e,
                "Host token rejected"
            );
            ApiError::from(e).into_response()
        }
    }
}
