//! Incident and timeline rows. The timeline is append-only.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Incident {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub status: String,
    pub severity: String,
    pub alert_rule_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TimelineEntry {
    pub id: Uuid,
    pub incident_id: Uuid,
    pub event_type: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

const INCIDENT_COLUMNS: &str = "id, tenant_id, title, status, severity, alert_rule_id, \
                                created_at, updated_at, resolved_at";

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    title: &str,
    status: &str,
    severity: &str,
    alert_rule_id: Option<Uuid>,
) -> sqlx::Result<Incident> {
    sqlx::query_as::<_, Incident>(&format!(
        "INSERT INTO incidents (tenant_id, title, status, severity, alert_rule_id) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {INCIDENT_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(title)
    .bind(status)
    .bind(severity)
    .bind(alert_rule_id)
    .fetch_one(pool)
    .await
}

pub async fn get(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> sqlx::Result<Option<Incident>> {
    sqlx::query_as::<_, Incident>(&format!(
        "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = $1 AND tenant_id = $2"
    ))
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await
}

pub async fn list(
    pool: &PgPool,
    tenant_id: Uuid,
    status: Option<&str>,
) -> sqlx::Result<Vec<Incident>> {
    match status {
        Some(status) => {
            sqlx::query_as::<_, Incident>(&format!(
                "SELECT {INCIDENT_COLUMNS} FROM incidents \
                 WHERE tenant_id = $1 AND status = $2 ORDER BY created_at DESC"
            ))
            .bind(tenant_id)
            .bind(status)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Incident>(&format!(
                "SELECT {INCIDENT_COLUMNS} FROM incidents \
                 WHERE tenant_id = $1 ORDER BY created_at DESC"
            ))
            .bind(tenant_id)
            .fetch_all(pool)
            .await
        }
    }
}

/// Set the status, stamping `updated_at` always and `resolved_at` iff the
/// new status is `resolved`.
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    status: &str,
) -> sqlx::Result<Option<Incident>> {
    sqlx::query_as::<_, Incident>(&format!(
        "UPDATE incidents SET \
            status      = $3, \
            updated_at  = now(), \
            resolved_at = CASE WHEN $3 = 'resolved' THEN now() ELSE resolved_at END \
         WHERE id = $1 AND tenant_id = $2 \
         RETURNING {INCIDENT_COLUMNS}"
    ))
    .bind(id)
    .bind(tenant_id)
    .bind(status)
    .fetch_optional(pool)
    .await
}

pub async fn add_timeline_entry(
    pool: &PgPool,
    incident_id: Uuid,
    event_type: &str,
    content: &str,
) -> sqlx::Result<TimelineEntry> {
    sqlx::query_as::<_, TimelineEntry>(
        "INSERT INTO incident_timeline (incident_id, event_type, content) \
         VALUES ($1, $2, $3) \
         RETURNING id, incident_id, event_type, content, created_at",
    )
    .bind(incident_id)
    .bind(event_type)
    .bind(content)
    .fetch_one(pool)
    .await
}

pub async fn get_timeline(pool: &PgPool, incident_id: Uuid) -> sqlx::Result<Vec<TimelineEntry>> {
    sqlx::query_as::<_, TimelineEntry>(
        "SELECT id, incident_id, event_type, content, created_at \
         FROM incident_timeline WHERE incident_id = $1 ORDER BY created_at",
    )
    .bind(incident_id)
    .fetch_all(pool)
    .await
}
