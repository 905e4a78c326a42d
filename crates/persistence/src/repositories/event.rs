//! Event repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::event::generate_slug;
use domain::models::{CreateEventRequest, Tier};
use domain::services::quota::{check_event_creation, QuotaViolation};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::EventEntity;
use crate::metrics::QueryTimer;

/// Number of slug candidates tried before giving up on a collision-free one.
pub const SLUG_ATTEMPTS: usize = 5;

const EVENT_COLUMNS: &str = "id, user_id, title, date, cover_image, welcome_message, spotify_url, \
     slug, password, category, package, storage_used, is_expired, expires_at, created_at";

/// Failure modes of [`EventRepository::create_within_quota`].
#[derive(Debug, Error)]
pub enum CreateEventError {
    #[error("Profile not found")]
    ProfileNotFound,

    #[error(transparent)]
    Quota(#[from] QuotaViolation),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Repository for event-related database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new event on behalf of a host, within the host's tier quota.
    ///
    /// The profile row is locked for the duration of the transaction, so
    /// concurrent creations by the same host are serialized and counted
    /// against each other. The event package is the tier read under that
    /// lock.
    pub async fn create_within_quota(
        &self,
        user_id: &str,
        slug: &str,
        request: &CreateEventRequest,
        expires_at: DateTime<Utc>,
    ) -> Result<EventEntity, CreateEventError> {
        let timer = QueryTimer::new("create_event_within_quota");
        let mut tx = self.pool.begin().await?;

        let tier = sqlx::query_scalar::<_, String>(
            "SELECT tier FROM profiles WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CreateEventError::ProfileNotFound)?;
        let tier = Tier::parse(&tier).unwrap_or_default();

        let owned = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        // Dropping the transaction rolls it back.
        check_event_creation(tier, owned)?;

        let event = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            INSERT INTO events (user_id, title, date, cover_image, welcome_message, spotify_url,
                                slug, category, package, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(request.title.trim())
        .bind(request.date)
        .bind(request.cover_image.as_deref())
        .bind(request.welcome_message.as_deref())
        .bind(request.spotify_url.as_deref())
        .bind(slug)
        .bind(request.category.as_str())
        .bind(tier.as_str())
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(event)
    }

    /// Find an event by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find an event by its public slug.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_slug");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List a host's events, most recent date first.
    pub async fn list_by_owner(&self, user_id: &str) -> Result<Vec<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_events_by_owner");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE user_id = $1 ORDER BY date DESC, created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List every event, most recent date first.
    pub async fn list_all(&self) -> Result<Vec<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_all_events");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY date DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Check if slug exists.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("check_event_slug_exists");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM events WHERE slug = $1)
            "#,
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Generate a slug for `title` that is not yet taken.
    ///
    /// After [`SLUG_ATTEMPTS`] collisions the last candidate is returned and
    /// the unique constraint decides.
    pub async fn generate_unique_slug(&self, title: &str) -> Result<String, sqlx::Error> {
        let mut slug = generate_slug(title);
        for _ in 1..SLUG_ATTEMPTS {
            if !self.slug_exists(&slug).await? {
                return Ok(slug);
            }
            tracing::debug!(slug = %slug, "Slug collision, retrying");
            slug = generate_slug(title);
        }
        Ok(slug)
    }

    /// Delete an event and its memories in one transaction.
    ///
    /// Returns the storage paths of the removed memories, or `None` if the
    /// event did not exist.
    pub async fn delete_with_memories(
        &self,
        event_id: Uuid,
    ) -> Result<Option<Vec<String>>, sqlx::Error> {
        let timer = QueryTimer::new("delete_event_with_memories");
        let mut tx = self.pool.begin().await?;

        let paths = sqlx::query_scalar::<_, String>(
            r#"
            DELETE FROM memories
            WHERE event_id = $1
            RETURNING storage_path
            "#,
        )
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM events
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        }

        tx.commit().await?;
        timer.record();
        Ok(Some(paths))
    }
}
