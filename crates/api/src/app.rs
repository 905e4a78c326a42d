use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
    Router,
};
use domain::services::{IdentityProvider, StorageProvider, StoryWriter};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_host_auth, security_headers_middleware,
    trace_id, upload_rate_limit, RateLimiterState,
};
use crate::routes::{guest, health, host_events, moderation, profile};
use crate::services::{ProviderInitError, Providers};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub storage: Arc<dyn StorageProvider>,
    pub story_writer: Arc<dyn StoryWriter>,
    pub identity: Arc<dyn IdentityProvider>,
    pub upload_limiter: Option<Arc<RateLimiterState>>,
}

/// Builds the router with providers selected from configuration.
pub fn create_app(config: Config, pool: PgPool) -> Result<Router, ProviderInitError> {
    let providers = Providers::from_config(&config)?;
    Ok(create_app_with_providers(config, pool, providers))
}

/// Builds the router around explicit providers.
pub fn create_app_with_providers(config: Config, pool: PgPool, providers: Providers) -> Router {
    let config = Arc::new(config);

    let upload_limiter = RateLimiterState::new(config.security.upload_rate_limit_per_minute)
        .map(Arc::new);

    let state = AppState {
        pool,
        config: config.clone(),
        storage: providers.storage,
        story_writer: providers.story_writer,
        identity: providers.identity,
        upload_limiter,
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler))
        .route("/api/events/:slug", get(guest::get_event))
        .route("/api/events/:slug/memories", get(guest::get_gallery));

    // Multipart reads are capped by the body limit; the limiter runs before
    // the body is touched.
    let upload_routes = Router::new()
        .route("/api/events/:slug/upload", post(guest::upload_memory))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            upload_rate_limit,
        ))
        .layer(DefaultBodyLimit::max(config.limits.max_upload_bytes));

    let host_routes = Router::new()
        .route(
            "/api/host/register-profile",
            post(profile::register_profile),
        )
        .route("/api/host/profile", get(profile::get_profile))
        .route(
            "/api/host/events",
            get(host_events::list_events).post(host_events::create_event),
        )
        .route(
            "/api/host/events/:id",
            axum::routing::delete(host_events::delete_event),
        )
        .route(
            "/api/host/events/:id/memories",
            get(host_events::list_event_memories),
        )
        .route(
            "/api/host/memories/:id",
            patch(moderation::update_memory).delete(moderation::delete_memory),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_host_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(upload_routes)
        .merge(host_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            config.security.hsts_enabled,
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
