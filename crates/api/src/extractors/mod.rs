//! Custom Axum extractors.

pub mod host_auth;

pub use host_auth::HostAuth;
