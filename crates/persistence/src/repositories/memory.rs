//! Memory repository for database operations.

use domain::models::NewMemory;
use domain::services::quota::{check_upload, QuotaViolation};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{EventUsageEntity, MemoryEntity};
use crate::metrics::QueryTimer;

const MEMORY_COLUMNS: &str =
    "id, event_id, type, storage_path, original_text, ai_story, is_approved, file_size, created_at";

/// Failure modes of [`MemoryRepository::insert_with_quota`].
#[derive(Debug, Error)]
pub enum InsertMemoryError {
    #[error("Event not found")]
    EventNotFound,

    #[error(transparent)]
    Quota(#[from] QuotaViolation),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Repository for memory-related database operations.
#[derive(Clone)]
pub struct MemoryRepository {
    pool: PgPool,
}

impl MemoryRepository {
    /// Creates a new MemoryRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count the memories of an event, approved or not.
    pub async fn count_by_event(&self, event_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_memories_by_event");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM memories
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List all memories of an event, newest first.
    pub async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<MemoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_memories_by_event");
        let result = sqlx::query_as::<_, MemoryEntity>(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories WHERE event_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List the most recent approved memories of an event.
    pub async fn list_approved_by_event(
        &self,
        event_id: Uuid,
        limit: i64,
    ) -> Result<Vec<MemoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_approved_memories_by_event");
        let result = sqlx::query_as::<_, MemoryEntity>(&format!(
            r#"
            SELECT {MEMORY_COLUMNS}
            FROM memories
            WHERE event_id = $1 AND is_approved = TRUE
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#
        ))
        .bind(event_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List the memories of several events at once, newest first.
    pub async fn list_for_events(
        &self,
        event_ids: &[Uuid],
    ) -> Result<Vec<MemoryEntity>, sqlx::Error> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let timer = QueryTimer::new("list_memories_for_events");
        let result = sqlx::query_as::<_, MemoryEntity>(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories WHERE event_id = ANY($1) ORDER BY created_at DESC, id DESC"
        ))
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find a memory by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<MemoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_memory_by_id");
        let result = sqlx::query_as::<_, MemoryEntity>(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Set the moderation flag of a memory.
    pub async fn set_approved(
        &self,
        id: i64,
        is_approved: bool,
    ) -> Result<Option<MemoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_memory_approved");
        let result = sqlx::query_as::<_, MemoryEntity>(&format!(
            "UPDATE memories SET is_approved = $2 WHERE id = $1 RETURNING {MEMORY_COLUMNS}"
        ))
        .bind(id)
        .bind(is_approved)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Insert a memory and charge its size to the event.
    ///
    /// The event row is locked for the duration of the transaction and the
    /// tier quotas are checked again against the locked values, so
    /// concurrent uploads cannot overshoot a limit.
    pub async fn insert_with_quota(
        &self,
        memory: &NewMemory,
    ) -> Result<MemoryEntity, InsertMemoryError> {
        let timer = QueryTimer::new("insert_memory_with_quota");
        let mut tx = self.pool.begin().await?;

        let usage = sqlx::query_as::<_, EventUsageEntity>(
            r#"
            SELECT package, storage_used
            FROM events
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(memory.event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(InsertMemoryError::EventNotFound)?;

        // Counted after the lock is granted so rows committed by the previous
        // holder are visible.
        let memory_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM memories WHERE event_id = $1",
        )
        .bind(memory.event_id)
        .fetch_one(&mut *tx)
        .await?;

        // Dropping the transaction rolls it back.
        check_upload(
            usage.tier(),
            memory_count,
            usage.storage_used,
            memory.file_size,
        )?;

        let inserted = sqlx::query_as::<_, MemoryEntity>(&format!(
            r#"
            INSERT INTO memories (event_id, type, storage_path, original_text, ai_story, is_approved, file_size)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6)
            RETURNING {MEMORY_COLUMNS}
            "#
        ))
        .bind(memory.event_id)
        .bind(memory.memory_type.as_str())
        .bind(&memory.storage_path)
        .bind(memory.original_text.as_deref())
        .bind(memory.ai_story.as_deref())
        .bind(memory.file_size)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE events
            SET storage_used = storage_used + $2
            WHERE id = $1
            "#,
        )
        .bind(memory.event_id)
        .bind(memory.file_size)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(inserted)
    }

    /// Delete a memory and release its bytes from the event's storage counter.
    ///
    /// Returns the removed row, or `None` if it did not exist.
    pub async fn delete_and_release_storage(
        &self,
        id: i64,
    ) -> Result<Option<MemoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("delete_memory_and_release_storage");
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query_as::<_, MemoryEntity>(&format!(
            "DELETE FROM memories WHERE id = $1 RETURNING {MEMORY_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(deleted) = deleted else {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE events
            SET storage_used = GREATEST(storage_used - $2, 0)
            WHERE id = $1
            "#,
        )
        .bind(deleted.event_id)
        .bind(deleted.file_size)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(deleted))
    }
}
