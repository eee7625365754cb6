//! Canonical log event model shared by every stage of the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The canonical log event: stamped by the ingest front, normalized by the
/// pipeline worker, indexed by the search store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub id: String,
    pub tenant_id: String,
    /// Unix epoch when absent on the wire; the pipeline worker replaces it
    /// with now-UTC.
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub service: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trace_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub span_id: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Original message text, carried only between pipeline stages.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw: String,
}

/// Payload for `POST /v1/ingest/logs`.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub events: Vec<IngestEvent>,
}

/// A single event in an ingest request, before identity and time stamping.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestEvent {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub trace_id: String,
    #[serde(default)]
    pub span_id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Returned from `POST /v1/ingest/logs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub accepted: usize,
    pub rejected: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_event_serde_roundtrip() {
        let mut fields = Map::new();
        fields.insert("region".to_string(), Value::String("eu-1".to_string()));
        let event = LogEvent {
            id: "e-1".to_string(),
            tenant_id: "t-1".to_string(),
            timestamp: Utc::now(),
            level: "info".to_string(),
            message: "boot".to_string(),
            service: "api".to_string(),
            host: "web-1".to_string(),
            trace_id: String::new(),
            span_id: String::new(),
            fields,
            tags: vec!["prod".to_string()],
            raw: String::new(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: LogEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "e-1");
        assert_eq!(back.fields["region"], "eu-1");
        assert_eq!(back.tags, vec!["prod"]);
    }

    #[test]
    fn empty_optional_fields_are_omitted() {
        let event = LogEvent {
            id: "e-2".to_string(),
            tenant_id: "t-1".to_string(),
            timestamp: Utc::now(),
            level: "info".to_string(),
            message: "x".to_string(),
            service: "api".to_string(),
            host: String::new(),
            trace_id: String::new(),
            span_id: String::new(),
            fields: Map::new(),
            tags: Vec::new(),
            raw: String::new(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("host"));
        assert!(!json.contains("raw"));
        assert!(!json.contains("fields"));
    }

    #[test]
    fn ingest_event_accepts_minimal_payload() {
        let event: IngestEvent =
            serde_json::from_str(r#"{"message":"boot","service":"api"}"#).unwrap();
        assert_eq!(event.message, "boot");
        assert_eq!(event.service, "api");
        assert!(event.timestamp.is_empty());
        assert!(event.fields.is_empty());
    }
}
