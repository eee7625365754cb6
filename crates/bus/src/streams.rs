//! Stream topology and subject naming.
//!
//! Subjects always end in the tenant id; consumers subscribe with a
//! trailing wildcard and work is partitioned per tenant on the wire.

use std::time::Duration;

use async_nats::jetstream;
use async_nats::jetstream::stream::{RetentionPolicy, StorageType};
use tracing::info;

use crate::error::BusError;

pub const STREAM_LOGS_RAW: &str = "LOGS_RAW";
pub const STREAM_LOGS_PARSED: &str = "LOGS_PARSED";
pub const STREAM_ALERTS_EVENTS: &str = "ALERTS_EVENTS";
pub const STREAM_INCIDENTS_EVENTS: &str = "INCIDENTS_EVENTS";

pub const SUBJECT_LOGS_RAW_ALL: &str = "logs.raw.>";
pub const SUBJECT_LOGS_PARSED_ALL: &str = "logs.parsed.>";
pub const SUBJECT_ALERTS_EVENTS_ALL: &str = "alerts.events.>";
pub const SUBJECT_INCIDENTS_EVENTS_ALL: &str = "incidents.events.>";

pub fn logs_raw_subject(tenant_id: &str) -> String {
    format!("logs.raw.{tenant_id}")
}

pub fn logs_parsed_subject(tenant_id: &str) -> String {
    format!("logs.parsed.{tenant_id}")
}

pub fn alerts_events_subject(tenant_id: &str) -> String {
    format!("alerts.events.{tenant_id}")
}

pub fn incidents_events_subject(tenant_id: &str) -> String {
    format!("incidents.events.{tenant_id}")
}

fn stream_configs() -> Vec<jetstream::stream::Config> {
    vec![
        jetstream::stream::Config {
            name: STREAM_LOGS_RAW.to_string(),
            subjects: vec![SUBJECT_LOGS_RAW_ALL.to_string()],
            retention: RetentionPolicy::WorkQueue,
            max_age: Duration::from_secs(24 * 3600),
            storage: StorageType::File,
            ..Default::default()
        },
        jetstream::stream::Config {
            name: STREAM_LOGS_PARSED.to_string(),
            subjects: vec![SUBJECT_LOGS_PARSED_ALL.to_string()],
            retention: RetentionPolicy::WorkQueue,
            max_age: Duration::from_secs(24 * 3600),
            storage: StorageType::File,
            ..Default::default()
        },
        jetstream::stream::Config {
            name: STREAM_ALERTS_EVENTS.to_string(),
            subjects: vec![SUBJECT_ALERTS_EVENTS_ALL.to_string()],
            retention: RetentionPolicy::Interest,
            max_age: Duration::from_secs(72 * 3600),
            storage: StorageType::File,
            ..Default::default()
        },
        jetstream::stream::Config {
            name: STREAM_INCIDENTS_EVENTS.to_string(),
            subjects: vec![SUBJECT_INCIDENTS_EVENTS_ALL.to_string()],
            retention: RetentionPolicy::Interest,
            max_age: Duration::from_secs(72 * 3600),
            storage: StorageType::File,
            ..Default::default()
        },
    ]
}

/// Create the four durable streams if they don't exist yet.
///
/// Every daemon calls this on startup; creation is idempotent so the first
/// process to come up wins and the rest are no-ops.
pub async fn ensure_streams(js: &jetstream::Context) -> Result<(), BusError> {
    for cfg in stream_configs() {
        let name = cfg.name.clone();
        js.get_or_create_stream(cfg)
            .await
            .map_err(|e| BusError::Stream(format!("ensure stream {name}: {e}")))?;
        info!(stream = %name, "stream ready");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subjects_end_in_tenant_id() {
        assert_eq!(logs_raw_subject("t-1"), "logs.raw.t-1");
        assert_eq!(logs_parsed_subject("t-1"), "logs.parsed.t-1");
        assert_eq!(alerts_events_subject("t-1"), "alerts.events.t-1");
        assert_eq!(incidents_events_subject("t-1"), "incidents.events.t-1");
    }

    #[test]
    fn log_streams_are_work_queues() {
        let configs = stream_configs();
        let logs_raw = configs.iter().find(|c| c.name == STREAM_LOGS_RAW).unwrap();
        assert!(matches!(logs_raw.retention, RetentionPolicy::WorkQueue));
        assert_eq!(logs_raw.max_age, Duration::from_secs(86_400));

        let alerts = configs
            .iter()
            .find(|c| c.name == STREAM_ALERTS_EVENTS)
            .unwrap();
        assert!(matches!(alerts.retention, RetentionPolicy::Interest));
        assert_eq!(alerts.max_age, Duration::from_secs(259_200));
    }

    #[test]
    fn wildcards_cover_tenant_subjects() {
        let configs = stream_configs();
        for cfg in &configs {
            assert_eq!(cfg.subjects.len(), 1);
            assert!(cfg.subjects[0].ends_with(".>"));
        }
    }
}
