//! Event entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Event, EventCategory, Tier};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub cover_image: Option<String>,
    pub welcome_message: Option<String>,
    pub spotify_url: Option<String>,
    pub slug: String,
    pub password: Option<String>,
    pub category: String,
    pub package: String,
    pub storage_used: i64,
    pub is_expired: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<EventEntity> for Event {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            title: entity.title,
            date: entity.date,
            cover_image: entity.cover_image,
            welcome_message: entity.welcome_message,
            spotify_url: entity.spotify_url,
            slug: entity.slug,
            password: entity.password,
            category: EventCategory::parse(&entity.category).unwrap_or_default(),
            package: Tier::parse(&entity.package).unwrap_or_default(),
            storage_used: entity.storage_used,
            is_expired: entity.is_expired,
            expires_at: entity.expires_at,
            created_at: entity.created_at,
        }
    }
}

/// Quota-relevant columns of an event read under a row lock.
#[derive(Debug, Clone, FromRow)]
pub struct EventUsageEntity {
    pub package: String,
    pub storage_used: i64,
}

impl EventUsageEntity {
    pub fn tier(&self) -> Tier {
        Tier::parse(&self.package).unwrap_or_default()
    }
}
