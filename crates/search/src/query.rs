//! Query DSL builders for the search API.
//!
//! Pure constructors over `serde_json` values; every query pins the
//! caller's tenant id as the first `must` clause.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

/// Payload for `POST /v1/logs/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub trace_id: String,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub search_after: Vec<Value>,
    /// "asc" or "desc" (default).
    #[serde(default)]
    pub sort: String,
}

/// Payload for `POST /v1/logs/tail`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TailRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub service: String,
}

/// Payload for `POST /v1/logs/aggregate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregateRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    /// "level", "service", "host", ...
    #[serde(default)]
    pub group_by: String,
    /// "1m", "5m", "1h", "1d", ...
    #[serde(default)]
    pub interval: String,
}

fn push_term(must: &mut Vec<Value>, field: &str, value: &str) {
    if !value.is_empty() {
        must.push(json!({"term": {field: value}}));
    }
}

fn push_time_range(must: &mut Vec<Value>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) {
    let mut range = serde_json::Map::new();
    if let Some(from) = from {
        range.insert("gte".to_string(), json!(from.to_rfc3339()));
    }
    if let Some(to) = to {
        range.insert("lte".to_string(), json!(to.to_rfc3339()));
    }
    if !range.is_empty() {
        must.push(json!({"range": {"timestamp": range}}));
    }
}

/// Full search over a tenant's indices with pagination and sorting.
pub fn build_search_query(tenant_id: &str, req: &SearchRequest) -> Value {
    let mut must = vec![json!({"term": {"tenant_id": tenant_id}})];

    if !req.query.is_empty() {
        must.push(json!({
            "match": {"message": {"query": req.query, "operator": "and"}}
        }));
    }
    push_term(&mut must, "level", &req.level);
    push_term(&mut must, "service", &req.service);
    push_term(&mut must, "host", &req.host);
    push_term(&mut must, "trace_id", &req.trace_id);
    push_time_range(&mut must, req.from, req.to);

    let size = if req.size <= 0 || req.size > 1000 {
        50
    } else {
        req.size
    };
    let order = if req.sort == "asc" { "asc" } else { "desc" };

    let mut query = json!({
        "query": {"bool": {"must": must}},
        "size": size,
        "sort": [
            {"timestamp": {"order": order}},
            {"id": {"order": order}}
        ]
    });

    if !req.search_after.is_empty() {
        query["search_after"] = json!(req.search_after);
    }

    query
}

/// Poll query for the SSE tail: everything newer than `since`, oldest
/// first.
pub fn build_tail_query(tenant_id: &str, req: &TailRequest, since: DateTime<Utc>) -> Value {
    let mut must = vec![
        json!({"term": {"tenant_id": tenant_id}}),
        json!({"range": {"timestamp": {"gt": since.to_rfc3339()}}}),
    ];

    if !req.query.is_empty() {
        must.push(json!({"match": {"message": req.query}}));
    }
    push_term(&mut must, "level", &req.level);
    push_term(&mut must, "service", &req.service);

    json!({
        "query": {"bool": {"must": must}},
        "size": 100,
        "sort": [{"timestamp": {"order": "asc"}}]
    })
}

/// Aggregation query: terms group-by and/or date histogram, defaulting to
/// a count by level.
pub fn build_aggregate_query(tenant_id: &str, req: &AggregateRequest) -> Value {
    let mut must = vec![json!({"term": {"tenant_id": tenant_id}})];

    if !req.query.is_empty() {
        must.push(json!({"match": {"message": req.query}}));
    }
    push_term(&mut must, "level", &req.level);
    push_term(&mut must, "service", &req.service);
    push_time_range(&mut must, req.from, req.to);

    let mut aggs = serde_json::Map::new();
    if !req.group_by.is_empty() {
        aggs.insert(
            "group_by".to_string(),
            json!({"terms": {"field": req.group_by, "size": 20}}),
        );
    }
    if !req.interval.is_empty() {
        aggs.insert(
            "over_time".to_string(),
            json!({"date_histogram": {"field": "timestamp", "fixed_interval": req.interval}}),
        );
    }
    if aggs.is_empty() {
        aggs.insert(
            "group_by".to_string(),
            json!({"terms": {"field": "level", "size": 20}}),
        );
    }

    json!({
        "query": {"bool": {"must": must}},
        "size": 0,
        "aggregations": aggs
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_query_always_pins_tenant() {
        let query = build_search_query("t-1", &SearchRequest::default());
        let must = query["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(must[0], json!({"term": {"tenant_id": "t-1"}}));
    }

    #[test]
    fn search_query_defaults_size_and_sort() {
        let query = build_search_query("t-1", &SearchRequest::default());
        assert_eq!(query["size"], 50);
        assert_eq!(query["sort"][0]["timestamp"]["order"], "desc");
        assert!(query.get("search_after").is_none());
    }

    #[test]
    fn search_query_clamps_oversized_page() {
        let req = SearchRequest {
            size: 5000,
            ..Default::default()
        };
        let query = build_search_query("t-1", &req);
        assert_eq!(query["size"], 50);
    }

    #[test]
    fn search_query_message_match_uses_and_operator() {
        let req = SearchRequest {
            query: "timeout error".to_string(),
            ..Default::default()
        };
        let query = build_search_query("t-1", &req);
        let must = query["query"]["bool"]["must"].as_array().unwrap();
        assert!(must
            .iter()
            .any(|c| c["match"]["message"]["operator"] == "and"));
    }

    #[test]
    fn search_query_includes_filters_and_pagination() {
        let req = SearchRequest {
            level: "error".to_string(),
            service: "api".to_string(),
            sort: "asc".to_string(),
            search_after: vec![json!(1700000000000u64), json!("e-9")],
            ..Default::default()
        };
        let query = build_search_query("t-1", &req);
        let must = query["query"]["bool"]["must"].as_array().unwrap();
        assert!(must.iter().any(|c| c["term"]["level"] == "error"));
        assert!(must.iter().any(|c| c["term"]["service"] == "api"));
        assert_eq!(query["sort"][0]["timestamp"]["order"], "asc");
        assert_eq!(query["search_after"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn tail_query_looks_back_from_since() {
        let since = Utc::now();
        let query = build_tail_query("t-1", &TailRequest::default(), since);
        let must = query["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(
            must[1]["range"]["timestamp"]["gt"],
            json!(since.to_rfc3339())
        );
        assert_eq!(query["sort"][0]["timestamp"]["order"], "asc");
    }

    #[test]
    fn aggregate_query_defaults_to_level_counts() {
        let query = build_aggregate_query("t-1", &AggregateRequest::default());
        assert_eq!(query["size"], 0);
        assert_eq!(query["aggregations"]["group_by"]["terms"]["field"], "level");
    }

    #[test]
    fn aggregate_query_honors_group_by_and_interval() {
        let req = AggregateRequest {
            group_by: "service".to_string(),
            interval: "5m".to_string(),
            ..Default::default()
        };
        let query = build_aggregate_query("t-1", &req);
        assert_eq!(
            query["aggregations"]["group_by"]["terms"]["field"],
            "service"
        );
        assert_eq!(
            query["aggregations"]["over_time"]["date_histogram"]["fixed_interval"],
            "5m"
        );
    }
}
