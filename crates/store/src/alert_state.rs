//! Per-rule alert state. Exactly one row per rule; only the evaluator
//! writes here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AlertState {
    pub rule_id: Uuid,
    pub tenant_id: Uuid,
    pub state: String,
    pub last_value: i32,
    pub last_eval_at: DateTime<Utc>,
    pub fired_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

pub async fn get(pool: &PgPool, rule_id: Uuid) -> sqlx::Result<Option<AlertState>> {
    sqlx::query_as::<_, AlertState>(
        "SELECT rule_id, tenant_id, state, last_value, last_eval_at, fired_at, resolved_at \
         FROM alert_states WHERE rule_id = $1",
    )
    .bind(rule_id)
    .fetch_optional(pool)
    .await
}

/// Upsert the state row, stamping `last_eval_at`. `fired_at`/`resolved_at`
/// overwrite only when `Some`; the evaluator passes them on the edge
/// transitions and `None` otherwise, preserving the previous stamps.
pub async fn upsert(
    pool: &PgPool,
    rule_id: Uuid,
    tenant_id: Uuid,
    state: &str,
    last_value: i32,
    fired_at: Option<DateTime<Utc>>,
    resolved_at: Option<DateTime<Utc>>,
) -> sqlx::Result<AlertState> {
    sqlx::query_as::<_, AlertState>(
        "INSERT INTO alert_states (rule_id, tenant_id, state, last_value, last_eval_at, fired_at, resolved_at) \
         VALUES ($1, $2, $3, $4, now(), $5, $6) \
         ON CONFLICT (rule_id) DO UPDATE SET \
            state        = EXCLUDED.state, \
            last_value   = EXCLUDED.last_value, \
            last_eval_at = now(), \
            fired_at     = COALESCE(EXCLUDED.fired_at, alert_states.fired_at), \
            resolved_at  = COALESCE(EXCLUDED.resolved_at, alert_states.resolved_at) \
         RETURNING rule_id, tenant_id, state, last_value, last_eval_at, fired_at, resolved_at",
    )
    .bind(rule_id)
    .bind(tenant_id)
    .bind(state)
    .bind(last_value)
    .bind(fired_at)
    .bind(resolved_at)
    .fetch_one(pool)
    .await
}
