//! Profile entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Profile, ProfileRole, Tier};
use sqlx::FromRow;

/// Database row mapping for the profiles table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileEntity {
    pub id: String,
    pub email: String,
    pub role: String,
    pub tier: String,
    pub created_at: DateTime<Utc>,
}

impl From<ProfileEntity> for Profile {
    fn from(entity: ProfileEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            role: entity.role.parse().unwrap_or(ProfileRole::Host),
            tier: Tier::parse(&entity.tier).unwrap_or_default(),
            created_at: entity.created_at,
        }
    }
}
