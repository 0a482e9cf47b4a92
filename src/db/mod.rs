pub mod cache;

pub use cache::{PostgresCache, SearchCache};

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Creates the PostgreSQL connection pool backing the query cache
///
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}
