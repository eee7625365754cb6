//! Postgres pool initialization and embedded migrations.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use mintlog_core::config::PostgresConfig;

use crate::error::StoreError;

/// Create a connection pool and run migrations. Every daemon that touches
/// the control plane calls this at startup and exits non-zero on failure.
pub async fn init_pool(config: &PostgresConfig) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.dsn())
        .await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;
    info!(
        host = %config.host,
        database = %config.database,
        "postgres connected, migrations applied"
    );

    Ok(pool)
}
