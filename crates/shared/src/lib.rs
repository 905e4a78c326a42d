//! Shared utilities and common types for the Elite Memoriz backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Identity-provider token validation (HS256 JWT)
//! - Request signing and random identifier generation
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod validation;
