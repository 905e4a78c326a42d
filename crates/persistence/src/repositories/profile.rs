//! Profile repository for database operations.

use sqlx::PgPool;

use crate::entities::ProfileEntity;
use crate::metrics::QueryTimer;

/// Repository for profile-related database operations.
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a profile by identity-provider user id.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_profile_by_id");
        let result = sqlx::query_as::<_, ProfileEntity>(
            r#"
            SELECT id, email, role, tier, created_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Insert a host profile unless one already exists.
    ///
    /// Returns `true` if a row was created.
    pub async fn create_if_absent(&self, id: &str, email: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("create_profile_if_absent");
        let result = sqlx::query(
            r#"
            INSERT INTO profiles (id, email, role, tier)
            VALUES ($1, $2, 'host', 'BASIC')
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(email)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected() == 1)
    }
}
