//! Domain layer for Elite Memoriz.
//!
//! This crate contains:
//! - Domain models (Profile, Event, Memory, Tier)
//! - Quota and ownership policies
//! - Capability traits for storage, story rewriting and identity

pub mod models;
pub mod services;
