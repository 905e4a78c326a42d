//! Subscription tiers and the quotas they grant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MIB: i64 = 1024 * 1024;
const GIB: i64 = 1024 * MIB;

/// Subscription level of a profile, copied onto each event as its package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    #[default]
    Basic,
    Premium,
    Vip,
}

/// Quotas granted by a tier. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    /// Maximum number of events a host on this tier may own.
    pub max_events: Option<i64>,
    /// Maximum number of memories per event.
    pub max_uploads: Option<i64>,
    /// Maximum total bytes stored per event.
    pub max_storage_bytes: i64,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Basic => "BASIC",
            Tier::Premium => "PREMIUM",
            Tier::Vip => "VIP",
        }
    }

    /// Parses a stored tier value; unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    pub fn limits(&self) -> TierLimits {
        match self {
            Tier::Basic => TierLimits {
                max_events: Some(1),
                max_uploads: Some(20),
                max_storage_bytes: 100 * MIB,
            },
            Tier::Premium => TierLimits {
                max_events: None,
                max_uploads: Some(100),
                max_storage_bytes: 500 * MIB,
            },
            Tier::Vip => TierLimits {
                max_events: None,
                max_uploads: None,
                max_storage_bytes: 2 * GIB,
            },
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BASIC" => Ok(Tier::Basic),
            "PREMIUM" => Ok(Tier::Premium),
            "VIP" => Ok(Tier::Vip),
            _ => Err(format!("Invalid tier: {}", s)),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
