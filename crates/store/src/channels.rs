//! Notification channel rows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NotificationChannel {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub channel_type: String,
    pub config: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const CHANNEL_COLUMNS: &str =
    "id, tenant_id, name, channel_type, config, is_active, created_at, updated_at";

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    name: &str,
    channel_type: &str,
    config: &serde_json::Value,
) -> sqlx::Result<NotificationChannel> {
    sqlx::query_as::<_, NotificationChannel>(&format!(
        "INSERT INTO notification_channels (tenant_id, name, channel_type, config) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {CHANNEL_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(name)
    .bind(channel_type)
    .bind(config)
    .fetch_one(pool)
    .await
}

pub async fn get(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> sqlx::Result<Option<NotificationChannel>> {
    sqlx::query_as::<_, NotificationChannel>(&format!(
        "SELECT {CHANNEL_COLUMNS} FROM notification_channels WHERE id = $1 AND tenant_id = $2"
    ))
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await
}

pub async fn list(pool: &PgPool, tenant_id: Uuid) -> sqlx::Result<Vec<NotificationChannel>> {
    sqlx::query_as::<_, NotificationChannel>(&format!(
        "SELECT {CHANNEL_COLUMNS} FROM notification_channels \
         WHERE tenant_id = $1 ORDER BY created_at DESC"
    ))
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

/// Active channels only, the dispatcher's delivery targets.
pub async fn list_active(pool: &PgPool, tenant_id: Uuid) -> sqlx::Result<Vec<NotificationChannel>> {
    sqlx::query_as::<_, NotificationChannel>(&format!(
        "SELECT {CHANNEL_COLUMNS} FROM notification_channels \
         WHERE tenant_id = $1 AND is_active ORDER BY created_at"
    ))
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM notification_channels WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
