//! API key rows. The raw key is never persisted; every lookup goes through
//! the SHA-256 hex hash.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ApiKey {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub key_prefix: String,
    pub name: String,
    pub scopes: Vec<String>,
    pub rate_limit: i32,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Key joined with its tenant, as needed to build a `TenantInfo`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResolvedKey {
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub tenant_plan: String,
    pub retention_days: i32,
    pub scopes: Vec<String>,
    pub rate_limit: i32,
}

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    key_hash: &str,
    key_prefix: &str,
    name: &str,
    scopes: &[String],
    rate_limit: i32,
    expires_at: Option<DateTime<Utc>>,
) -> sqlx::Result<ApiKey> {
    sqlx::query_as::<_, ApiKey>(
        "INSERT INTO api_keys (tenant_id, key_hash, key_prefix, name, scopes, rate_limit, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, tenant_id, key_prefix, name, scopes, rate_limit, is_active, expires_at, created_at",
    )
    .bind(tenant_id)
    .bind(key_hash)
    .bind(key_prefix)
    .bind(name)
    .bind(scopes)
    .bind(rate_limit)
    .bind(expires_at)
    .fetch_one(pool)
    .await
}

/// Look up an active, unexpired key by hash, joined with its tenant.
pub async fn get_by_hash(pool: &PgPool, key_hash: &str) -> sqlx::Result<Option<ResolvedKey>> {
    sqlx::query_as::<_, ResolvedKey>(
        "SELECT k.tenant_id, t.name AS tenant_name, t.plan AS tenant_plan, \
                t.retention_days, k.scopes, k.rate_limit \
         FROM api_keys k \
         JOIN tenants t ON t.id = k.tenant_id \
         WHERE k.key_hash = $1 \
           AND k.is_active \
           AND (k.expires_at IS NULL OR k.expires_at > now())",
    )
    .bind(key_hash)
    .fetch_optional(pool)
    .await
}
