//! Tier quota enforcement.

use thiserror::Error;

use crate::models::Tier;

/// A quota the requested action would exceed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuotaViolation {
    #[error("Upload limit reached for {0} tier.")]
    UploadLimit(Tier),

    #[error("Storage limit reached for {0} tier.")]
    StorageLimit(Tier),

    #[error("{0} tier allows only {1} event(s). Upgrade to create more.")]
    EventLimit(Tier, i64),
}

impl QuotaViolation {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            QuotaViolation::UploadLimit(_) => "upload_limit",
            QuotaViolation::StorageLimit(_) => "storage_limit",
            QuotaViolation::EventLimit(..) => "event_limit",
        }
    }
}

/// Checks whether one more file of `incoming_bytes` fits into an event.
///
/// The upload count is checked before storage, so a full event reports the
/// upload limit even if storage is also exhausted.
pub fn check_upload(
    tier: Tier,
    memory_count: i64,
    storage_used: i64,
    incoming_bytes: i64,
) -> Result<(), QuotaViolation> {
    let limits = tier.limits();

    if let Some(max_uploads) = limits.max_uploads {
        if memory_count >= max_uploads {
            return Err(QuotaViolation::UploadLimit(tier));
        }
    }

    if storage_used.saturating_add(incoming_bytes) > limits.max_storage_bytes {
        return Err(QuotaViolation::StorageLimit(tier));
    }

    Ok(())
}

/// Checks whether a host on `tier` who owns `owned_events` may create another.
pub fn check_event_creation(tier: Tier, owned_events: i64) -> Result<(), QuotaViolation> {
    match tier.limits().max_events {
        Some(max) if owned_events >= max => Err(QuotaViolation::EventLimit(tier, max)),
        _ => Ok(()),
    }
}
