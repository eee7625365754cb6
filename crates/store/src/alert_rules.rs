//! Alert rule rows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AlertRule {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub query: serde_json::Value,
    pub threshold: i32,
    pub window_seconds: i32,
    pub eval_interval: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const RULE_COLUMNS: &str = "id, tenant_id, name, query, threshold, window_seconds, \
                            eval_interval, is_active, created_at, updated_at";

#[allow(clippy::too_many_arguments)]
pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    name: &str,
    query: &serde_json::Value,
    threshold: i32,
    window_seconds: i32,
    eval_interval: &str,
    is_active: bool,
) -> sqlx::Result<AlertRule> {
    sqlx::query_as::<_, AlertRule>(&format!(
        "INSERT INTO alert_rules (tenant_id, name, query, threshold, window_seconds, eval_interval, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {RULE_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(name)
    .bind(query)
    .bind(threshold)
    .bind(window_seconds)
    .bind(eval_interval)
    .bind(is_active)
    .fetch_one(pool)
    .await
}

pub async fn get(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> sqlx::Result<Option<AlertRule>> {
    sqlx::query_as::<_, AlertRule>(&format!(
        "SELECT {RULE_COLUMNS} FROM alert_rules WHERE id = $1 AND tenant_id = $2"
    ))
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await
}

pub async fn list(pool: &PgPool, tenant_id: Uuid) -> sqlx::Result<Vec<AlertRule>> {
    sqlx::query_as::<_, AlertRule>(&format!(
        "SELECT {RULE_COLUMNS} FROM alert_rules WHERE tenant_id = $1 ORDER BY created_at DESC"
    ))
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

/// All active rules across tenants, the evaluator's work list.
pub async fn list_active(pool: &PgPool) -> sqlx::Result<Vec<AlertRule>> {
    sqlx::query_as::<_, AlertRule>(&format!(
        "SELECT {RULE_COLUMNS} FROM alert_rules WHERE is_active ORDER BY created_at"
    ))
    .fetch_all(pool)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    name: Option<&str>,
    query: Option<&serde_json::Value>,
    threshold: Option<i32>,
    window_seconds: Option<i32>,
    eval_interval: Option<&str>,
    is_active: Option<bool>,
) -> sqlx::Result<Option<AlertRule>> {
    sqlx::query_as::<_, AlertRule>(&format!(
        "UPDATE alert_rules SET \
            name           = COALESCE($3, name), \
            query          = COALESCE($4, query), \
            threshold      = COALESCE($5, threshold), \
            window_seconds = COALESCE($6, window_seconds), \
            eval_interval  = COALESCE($7, eval_interval), \
            is_active      = COALESCE($8, is_active), \
            updated_at     = now() \
         WHERE id = $1 AND tenant_id = $2 \
         RETURNING {RULE_COLUMNS}"
    ))
    .bind(id)
    .bind(tenant_id)
    .bind(name)
    .bind(query)
    .bind(threshold)
    .bind(window_seconds)
    .bind(eval_interval)
    .bind(is_active)
    .fetch_optional(pool)
    .await
}

/// Returns true if a row was deleted.
pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM alert_rules WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
