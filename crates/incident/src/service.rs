//! Incident service: creation, status transitions, timeline.

use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use mintlog_store::incidents::{self, Incident, TimelineEntry};

use crate::status::{valid_transition, IncidentStatus, UnknownStatus};

#[derive(Debug, thiserror::Error)]
pub enum IncidentError {
    /// Surfaces to the caller as a 400 with this exact message.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: IncidentStatus,
        to: IncidentStatus,
    },

    #[error("incident not found")]
    NotFound,

    #[error(transparent)]
    CorruptStatus(#[from] UnknownStatus),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct Service {
    pool: PgPool,
}

impl Service {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Single entry point for user-initiated and auto-created incidents.
    /// Severity defaults to `medium`; initial status is always `triggered`.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        title: &str,
        severity: &str,
        alert_rule_id: Option<Uuid>,
    ) -> Result<Incident, IncidentError> {
        let severity = if severity.is_empty() { "medium" } else { severity };
        let incident = incidents::create(
            &self.pool,
            tenant_id,
            title,
            IncidentStatus::Triggered.as_str(),
            severity,
            alert_rule_id,
        )
        .await?;
        Ok(incident)
    }

    pub async fn get(&self, id: Uuid, tenant_id: Uuid) -> Result<Option<Incident>, IncidentError> {
        Ok(incidents::get(&self.pool, id, tenant_id).await?)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        status: Option<IncidentStatus>,
    ) -> Result<Vec<Incident>, IncidentError> {
        Ok(incidents::list(&self.pool, tenant_id, status.map(IncidentStatus::as_str)).await?)
    }

    /// Validate and apply a status transition, appending the
    /// `status_change` timeline entry. Disallowed transitions error before
    /// any write.
    pub async fn update_status(
        &self,
        id: Uuid,
        tenant_id: Uuid,
        to: IncidentStatus,
    ) -> Result<Incident, IncidentError> {
        let incident = self
            .get(id, tenant_id)
            .await?
            .ok_or(IncidentError::NotFound)?;
        let from: IncidentStatus = incident.status.parse()?;

        if !valid_transition(from, to) {
            return Err(IncidentError::InvalidTransition { from, to });
        }

        let updated = incidents::update_status(&self.pool, id, tenant_id, to.as_str())
            .await?
            .ok_or(IncidentError::NotFound)?;

        if let Err(e) = incidents::add_timeline_entry(
            &self.pool,
            id,
            "status_change",
            &format!("Status changed from {from} to {to}"),
        )
        .await
        {
            warn!(incident_id = %id, error = %e, "failed to append status_change timeline entry");
        }

        Ok(updated)
    }

    pub async fn add_timeline(
        &self,
        incident_id: Uuid,
        event_type: &str,
        content: &str,
    ) -> Result<TimelineEntry, IncidentError> {
        Ok(incidents::add_timeline_entry(&self.pool, incident_id, event_type, content).await?)
    }

    pub async fn get_timeline(
        &self,
        incident_id: Uuid,
    ) -> Result<Vec<TimelineEntry>, IncidentError> {
        Ok(incidents::get_timeline(&self.pool, incident_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_message_is_user_visible_verbatim() {
        let err = IncidentError::InvalidTransition {
            from: IncidentStatus::Resolved,
            to: IncidentStatus::Acknowledged,
        };
        assert_eq!(
            err.to_string(),
            "invalid transition from resolved to acknowledged"
        );
    }

    #[test]
    fn status_change_content_format() {
        let from = IncidentStatus::Triggered;
        let to = IncidentStatus::Resolved;
        assert_eq!(
            format!("Status changed from {from} to {to}"),
            "Status changed from triggered to resolved"
        );
    }
}
