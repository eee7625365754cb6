//! Index naming and the shared index template.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::OpenSearchClient;

const INDEX_TEMPLATE_NAME: &str = "mintlog-logs";

/// Per-tenant, date-partitioned index name.
pub fn index_name(tenant_id: &str, ts: DateTime<Utc>) -> String {
    format!("mintlog-{tenant_id}-{}", ts.format("%Y.%m.%d"))
}

/// Wildcard over all of a tenant's daily indices.
pub fn tenant_index_pattern(tenant_id: &str) -> String {
    format!("mintlog-{tenant_id}-*")
}

fn index_template_body() -> Value {
    json!({
        "index_patterns": ["mintlog-*"],
        "template": {
            "settings": {
                "number_of_shards": 1,
                "number_of_replicas": 0,
                "refresh_interval": "5s"
            },
            "mappings": {
                "properties": {
                    "id":        { "type": "keyword" },
                    "tenant_id": { "type": "keyword" },
                    "timestamp": { "type": "date" },
                    "level":     { "type": "keyword" },
                    "message":   { "type": "text", "analyzer": "standard" },
                    "service":   { "type": "keyword" },
                    "host":      { "type": "keyword" },
                    "trace_id":  { "type": "keyword" },
                    "span_id":   { "type": "keyword" },
                    "tags":      { "type": "keyword" },
                    "fields":    { "type": "object", "enabled": true }
                }
            }
        },
        "priority": 100
    })
}

/// Install the template covering every `mintlog-*` index. Called once at
/// startup; failure is logged but not fatal since the template may already
/// exist from another daemon.
pub async fn ensure_index_template(client: &OpenSearchClient) {
    match client
        .put_index_template(INDEX_TEMPLATE_NAME, &index_template_body())
        .await
    {
        Ok(()) => info!(template = INDEX_TEMPLATE_NAME, "index template installed"),
        Err(e) => warn!(error = %e, "failed to install index template"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn index_name_is_tenant_and_date_partitioned() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 7, 23, 59, 59).unwrap();
        assert_eq!(index_name("t-42", ts), "mintlog-t-42-2025.03.07");
    }

    #[test]
    fn pattern_covers_daily_indices() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 7, 0, 0, 0).unwrap();
        let name = index_name("abc", ts);
        let pattern = tenant_index_pattern("abc");
        assert!(pattern.ends_with('*'));
        assert!(name.starts_with(pattern.trim_end_matches('*')));
    }

    #[test]
    fn template_declares_canonical_fields() {
        let body = index_template_body();
        let props = &body["template"]["mappings"]["properties"];
        for field in ["id", "tenant_id", "timestamp", "level", "message", "service"] {
            assert!(props.get(field).is_some(), "missing mapping for {field}");
        }
        assert_eq!(body["index_patterns"][0], "mintlog-*");
    }
}
