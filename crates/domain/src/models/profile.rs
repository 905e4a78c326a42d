//! Host profile domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::tier::Tier;

/// Role of a profile. Admins bypass per-resource ownership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    #[default]
    Host,
    Admin,
}

impl ProfileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileRole::Host => "host",
            ProfileRole::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, ProfileRole::Admin)
    }
}

impl FromStr for ProfileRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "host" => Ok(ProfileRole::Host),
            "admin" => Ok(ProfileRole::Admin),
            _ => Err(format!("Invalid profile role: {}", s)),
        }
    }
}

impl fmt::Display for ProfileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One profile per identity-provider user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Identity-provider user id.
    pub id: String,
    pub email: String,
    pub role: ProfileRole,
    pub tier: Tier,
    pub created_at: DateTime<Utc>,
}

/// Request payload for `POST /api/host/register-profile`.
///
/// The email falls back to the one carried by the access token.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProfileRequest {
    #[validate(custom(function = "shared::validation::validate_email_shape"))]
    pub email: Option<String>,
}
