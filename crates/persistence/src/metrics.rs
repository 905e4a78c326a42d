//! Query and connection-pool metrics.
//!
//! Every repository call is wrapped in a [`QueryTimer`], which feeds the
//! `database_query_duration_seconds` histogram labelled by query name and
//! outcome. Pool gauges are sampled by the readiness endpoint.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Point-in-time view of the connection pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub open: u32,
    pub idle: usize,
    pub max: u32,
}

impl PoolSnapshot {
    pub fn of(pool: &PgPool) -> Self {
        Self {
            open: pool.size(),
            idle: pool.num_idle(),
            max: pool.options().get_max_connections(),
        }
    }

    /// Connections currently checked out by requests.
    pub fn in_use(&self) -> usize {
        (self.open as usize).saturating_sub(self.idle)
    }

    /// Share of the pool ceiling in use, in `0.0..=1.0`.
    pub fn saturation(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (self.in_use() as f64 / self.max as f64).min(1.0)
    }

    pub fn publish(&self) {
        gauge!("database_connections_active").set(self.in_use() as f64);
        gauge!("database_connections_idle").set(self.idle as f64);
        gauge!("database_connections_total").set(self.open as f64);
        gauge!("database_pool_saturation").set(self.saturation());
    }
}

/// Samples the pool and publishes its gauges.
pub fn record_pool_metrics(pool: &PgPool) -> PoolSnapshot {
    let snapshot = PoolSnapshot::of(pool);
    snapshot.publish();
    snapshot
}

/// Times one repository query.
///
/// ```ignore
/// let timer = QueryTimer::new("find_event_by_slug");
/// let result = sqlx::query_as::<_, EventEntity>(...).fetch_optional(&pool).await;
/// timer.finish(result)
/// ```
#[derive(Debug)]
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    /// Records a successful run. Used by multi-statement transactions that
    /// bail out early through `?`.
    pub fn record(self) {
        self.observe("ok");
    }

    /// Records the run with an outcome label taken from `result` and hands
    /// the result back.
    pub fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E> {
        self.observe(if result.is_ok() { "ok" } else { "error" });
        result
    }

    fn observe(self, outcome: &'static str) {
        histogram!(
            "database_query_duration_seconds",
            "query" => self.query,
            "outcome" => outcome
        )
        .record(self.start.elapsed().as_secs_f64());
    }
}
