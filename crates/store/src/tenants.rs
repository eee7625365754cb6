//! Tenant rows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub plan: String,
    pub retention_days: i32,
    pub created_at: DateTime<Utc>,
}

pub async fn create(
    pool: &PgPool,
    name: &str,
    plan: &str,
    retention_days: i32,
) -> sqlx::Result<Tenant> {
    sqlx::query_as::<_, Tenant>(
        "INSERT INTO tenants (name, plan, retention_days) \
         VALUES ($1, $2, $3) \
         RETURNING id, name, plan, retention_days, created_at",
    )
    .bind(name)
    .bind(plan)
    .bind(retention_days)
    .fetch_one(pool)
    .await
}

pub async fn get(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Tenant>> {
    sqlx::query_as::<_, Tenant>(
        "SELECT id, name, plan, retention_days, created_at FROM tenants WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
