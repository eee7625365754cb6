//! Log intake: batch validation, identity/time stamping, and per-event
//! publication to the raw log stream.
//!
//! Bad individual events never fail the batch; the response counts them
//! as rejected and the client can retry idempotently on 5xx without the
//! server duplicating an entire batch.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use tracing::{debug, error};
use uuid::Uuid;

use mintlog_bus::streams::logs_raw_subject;
use mintlog_core::tenant::scopes;
use mintlog_core::{IngestEvent, IngestRequest, IngestResponse, LogEvent, TenantInfo};

use crate::error::ApiError;
use crate::middleware::require_scope;
use crate::state::AppState;

const MAX_BATCH_SIZE: usize = 1000;
const MAX_MESSAGE_LEN: usize = 65_536;
const MAX_FIELDS: usize = 100;

/// Whole-batch shape check: 400 when empty or oversized.
pub fn validate_batch(req: &IngestRequest) -> Result<(), String> {
    if req.events.is_empty() {
        return Err("events array is empty".to_string());
    }
    if req.events.len() > MAX_BATCH_SIZE {
        return Err(format!(
            "batch size {} exceeds maximum {MAX_BATCH_SIZE}",
            req.events.len()
        ));
    }
    Ok(())
}

/// Per-event check; a failure counts the event as rejected without
/// touching the rest of the batch.
pub fn validate_event(event: &IngestEvent) -> Result<(), String> {
    if event.message.is_empty() {
        return Err("message is required".to_string());
    }
    if event.message.len() > MAX_MESSAGE_LEN {
        return Err(format!("message exceeds maximum length {MAX_MESSAGE_LEN}"));
    }
    if event.service.is_empty() {
        return Err("service is required".to_string());
    }
    if event.fields.len() > MAX_FIELDS {
        return Err(format!(
            "fields count {} exceeds maximum {MAX_FIELDS}",
            event.fields.len()
        ));
    }
    Ok(())
}

/// Stamp identity and time: fresh UUID, caller's tenant, RFC3339 timestamp
/// converted to UTC (now-UTC when absent or unparseable), level defaulting
/// to `info`.
pub fn to_log_event(tenant_id: &str, event: &IngestEvent) -> LogEvent {
    let timestamp = if event.timestamp.is_empty() {
        Utc::now()
    } else {
        DateTime::parse_from_rfc3339(&event.timestamp)
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    };

    let level = if event.level.is_empty() {
        "info".to_string()
    } else {
        event.level.clone()
    };

    LogEvent {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        timestamp,
        level,
        message: event.message.clone(),
        service: event.service.clone(),
        host: event.host.clone(),
        trace_id: event.trace_id.clone(),
        span_id: event.span_id.clone(),
        fields: event.fields.clone(),
        tags: event.tags.clone(),
        raw: String::new(),
    }
}

/// `POST /v1/ingest/logs`: 202 with per-event accept/reject counts.
pub async fn ingest_logs(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Json(req): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    require_scope(&info, scopes::INGEST_LOGS)?;
    validate_batch(&req).map_err(ApiError::bad_request)?;

    let tenant_id = info.id.to_string();
    let mut accepted = 0;
    let mut rejected = 0;

    for (index, raw_event) in req.events.iter().enumerate() {
        if let Err(reason) = validate_event(raw_event) {
            debug!(index, %reason, "rejected event");
            rejected += 1;
            continue;
        }

        let event = to_log_event(&tenant_id, raw_event);
        let subject = logs_raw_subject(&tenant_id);
        match state.publisher.publish(subject, &event).await {
            Ok(()) => accepted += 1,
            Err(e) => {
                error!(error = %e, "failed to publish event");
                rejected += 1;
            }
        }
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse { accepted, rejected }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_event() -> IngestEvent {
        IngestEvent {
            message: "boot".to_string(),
            service: "api".to_string(),
            ..Default::default()
        }
    }

    fn batch_of(n: usize) -> IngestRequest {
        IngestRequest {
            events: vec![valid_event(); n],
        }
    }

    #[test]
    fn empty_batch_rejected() {
        assert!(validate_batch(&batch_of(0)).is_err());
    }

    #[test]
    fn batch_boundary_at_one_thousand() {
        assert!(validate_batch(&batch_of(1000)).is_ok());
        assert!(validate_batch(&batch_of(1001)).is_err());
    }

    #[test]
    fn message_length_boundary() {
        let mut event = valid_event();
        event.message = "a".repeat(65_536);
        assert!(validate_event(&event).is_ok());
        event.message.push('a');
        assert!(validate_event(&event).is_err());
    }

    #[test]
    fn empty_message_and_service_rejected() {
        let mut event = valid_event();
        event.message.clear();
        assert!(validate_event(&event).is_err());

        let mut event = valid_event();
        event.service.clear();
        assert!(validate_event(&event).is_err());
    }

    #[test]
    fn fields_count_boundary() {
        let mut event = valid_event();
        for i in 0..100 {
            event.fields.insert(format!("k{i}"), serde_json::json!(i));
        }
        assert!(validate_event(&event).is_ok());
        event.fields.insert("k100".to_string(), serde_json::json!(100));
        assert!(validate_event(&event).is_err());
    }

    #[test]
    fn stamping_assigns_id_tenant_and_level() {
        let event = to_log_event("t-1", &valid_event());
        assert!(!event.id.is_empty());
        assert_eq!(event.tenant_id, "t-1");
        assert_eq!(event.level, "info");
        assert!(event.timestamp > Utc::now() - chrono::Duration::seconds(5));
    }

    #[test]
    fn supplied_timestamp_converts_to_utc() {
        let mut raw = valid_event();
        raw.timestamp = "2025-03-07T10:30:00.123456789+02:00".to_string();
        let event = to_log_event("t-1", &raw);
        assert_eq!(event.timestamp.to_rfc3339(), "2025-03-07T08:30:00.123456789+00:00");
    }

    #[test]
    fn unparseable_timestamp_falls_back_to_now() {
        let mut raw = valid_event();
        raw.timestamp = "yesterday-ish".to_string();
        let event = to_log_event("t-1", &raw);
        assert!(event.timestamp > Utc::now() - chrono::Duration::seconds(5));
    }

    #[test]
    fn supplied_level_is_passed_through_unnormalized() {
        let mut raw = valid_event();
        raw.level = "WARNING".to_string();
        let event = to_log_event("t-1", &raw);
        // Normalization happens in the pipeline worker, not at ingest.
        assert_eq!(event.level, "WARNING");
    }
}
