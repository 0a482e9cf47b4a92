use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{CachedSearch, Recommendation, Thread};

#[cfg(test)]
use mockall::automock;

/// Query-keyed cache of completed searches.
///
/// Lookups are exact string matches on the normalized query; there is no
/// fuzzy matching and no expiry. Records are never updated in place: every
/// write-through inserts a new row, and a lookup returns a single row when
/// several exist for one query.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SearchCache: Send + Sync {
    /// Returns the cached record for a query, if any
    async fn lookup(&self, query: &str) -> AppResult<Option<CachedSearch>>;

    /// Inserts a new record after a live computation
    async fn write_through(
        &self,
        query: &str,
        threads: &[Thread],
        recommendations: &[Recommendation],
    ) -> AppResult<()>;
}

/// Cache gateway backed by the `search_queries` table.
///
/// Expected columns: `query text`, `threads jsonb`, `recommendations jsonb`,
/// `last_updated timestamptz`. The table is treated as pre-provisioned.
pub struct PostgresCache {
    pool: PgPool,
}

impl PostgresCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CacheRow {
    query: String,
    threads: Json<Vec<Thread>>,
    recommendations: Json<Vec<Recommendation>>,
    last_updated: DateTime<Utc>,
}

impl From<CacheRow> for CachedSearch {
    fn from(row: CacheRow) -> Self {
        CachedSearch {
            query: row.query,
            threads: row.threads.0,
            recommendations: row.recommendations.0,
            last_updated: row.last_updated,
        }
    }
}

#[async_trait]
impl SearchCache for PostgresCache {
    async fn lookup(&self, query: &str) -> AppResult<Option<CachedSearch>> {
        let row: Option<CacheRow> = sqlx::query_as(
            "SELECT query, threads, recommendations, last_updated \
             FROM search_queries WHERE query = $1 LIMIT 1",
        )
        .bind(query)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CachedSearch::from))
    }

    async fn write_through(
        &self,
        query: &str,
        threads: &[Thread],
        recommendations: &[Recommendation],
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO search_queries (query, threads, recommendations, last_updated) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(query)
        .bind(Json(threads))
        .bind(Json(recommendations))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::info!(query = %query, results = recommendations.len(), "Cache write-through stored");
        Ok(())
    }
}
