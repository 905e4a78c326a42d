//! Per-event rate limiting for guest uploads.
//!
//! Guest routes are unauthenticated, so the limiter is keyed by the event
//! slug taken from the path. Only slugs that resolve to an event are
//! tracked, and replenished entries are swept periodically.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter as GovRateLimiter,
};
use persistence::repositories::EventRepository;
use serde_json::json;
use std::{
    num::NonZeroU32,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_upload_rejected;

/// Checks between two sweeps of fully replenished slugs.
const PRUNE_EVERY: u64 = 1024;

/// Keyed limiter over event slugs.
pub struct RateLimiterState {
    limiter: DefaultKeyedRateLimiter<String>,
    per_minute: NonZeroU32,
    checks: AtomicU64,
}

impl RateLimiterState {
    /// Returns `None` when `per_minute` is zero (limiter disabled).
    pub fn new(per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(per_minute)?;
        Some(Self::with_quota(Quota::per_minute(per_minute), per_minute))
    }

    fn with_quota(quota: Quota, per_minute: NonZeroU32) -> Self {
        Self {
            limiter: GovRateLimiter::keyed(quota),
            per_minute,
            checks: AtomicU64::new(0),
        }
    }

    pub fn per_minute(&self) -> u32 {
        self.per_minute.get()
    }

    /// `Err(retry_after_secs)` when the slug is over its quota.
    pub fn check(&self, slug: &str) -> Result<(), u64> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune();
        }

        self.limiter
            .check_key(&slug.to_string())
            .map_err(|not_until| {
                not_until
                    .wait_time_from(DefaultClock::default().now())
                    .as_secs()
                    .max(1)
            })
    }

    /// Drops slugs whose quota has fully replenished.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    pub fn tracked(&self) -> usize {
        self.limiter.len()
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("per_minute", &self.per_minute)
            .field("tracked_slugs", &self.tracked())
            .finish()
    }
}

/// Route layer for `POST /api/events/:slug/upload`.
pub async fn upload_rate_limit(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(limiter) = &state.upload_limiter {
        // Unknown slugs fall through to the handler's 404 without a limiter entry.
        let known = match EventRepository::new(state.pool.clone())
            .slug_exists(&slug)
            .await
        {
            Ok(known) => known,
            Err(e) => return ApiError::from(e).into_response(),
        };

        if !known {
            return next.run(req).await;
        }

        if let Err(retry_after) = limiter.check(&slug) {
            tracing::warn!(slug = %slug, retry_after, "Guest upload rate limited");
            record_upload_rejected("rate_limited");
            return rate_limited_response(limiter.per_minute(), retry_after);
        }
    }

    next.run(req).await
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Upload limit of {} per minute exceeded for this event", limit),
        "retryAfter": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}
