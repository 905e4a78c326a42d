//! HTTP route handlers.

pub mod access;
pub mod guest;
pub mod health;
pub mod host_events;
pub mod moderation;
pub mod profile;
