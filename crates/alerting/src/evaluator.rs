//! Periodic alert evaluation.
//!
//! One process-wide 30-second tick drives all rules sequentially: the
//! state row is the synchronization point, so a single writer keeps the
//! upsert race-free. Each tick runs under an overall timeout so a slow
//! search store cannot back evaluations up behind each other.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use mintlog_bus::streams::alerts_events_subject;
use mintlog_bus::Publisher;
use mintlog_search::indices::tenant_index_pattern;
use mintlog_search::Searcher;
use mintlog_store::alert_rules::{self, AlertRule};
use mintlog_store::alert_state;

use crate::models::AlertEvent;
use crate::state::{next_state, transition_event, AlertState, EventState};

const TICK: Duration = Duration::from_secs(30);
const TICK_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Evaluator {
    pool: PgPool,
    searcher: Searcher,
    publisher: Publisher,
}

/// Count query for one rule: tenant pin, sliding window, and one clause
/// per query entry. The keys `query` and `message` full-text match the
/// message; every other key is an exact term on the named field.
pub fn build_rule_count_query(
    tenant_id: &str,
    filter: &BTreeMap<String, String>,
    window_seconds: i32,
    now: DateTime<Utc>,
) -> Value {
    let window_start = now - chrono::Duration::seconds(i64::from(window_seconds));

    let mut must = vec![
        json!({"term": {"tenant_id": tenant_id}}),
        json!({"range": {"timestamp": {
            "gte": window_start.to_rfc3339(),
            "lte": now.to_rfc3339(),
        }}}),
    ];

    for (field, value) in filter {
        if field == "query" || field == "message" {
            must.push(json!({"match": {"message": value}}));
        } else {
            must.push(json!({"term": {field: value}}));
        }
    }

    json!({
        "query": {"bool": {"must": must}},
        "size": 0
    })
}

impl Evaluator {
    pub fn new(pool: PgPool, searcher: Searcher, publisher: Publisher) -> Self {
        Self {
            pool,
            searcher,
            publisher,
        }
    }

    /// Tick every 30 seconds until shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(TICK);
        info!(tick_secs = TICK.as_secs(), "alert evaluator started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if tokio::time::timeout(TICK_TIMEOUT, self.evaluate_all())
                        .await
                        .is_err()
                    {
                        warn!("evaluation tick timed out, in-flight rule aborted");
                    }
                }
                _ = shutdown.changed() => {
                    info!("alert evaluator shutting down");
                    break;
                }
            }
        }
    }

    async fn evaluate_all(&self) {
        let rules = match alert_rules::list_active(&self.pool).await {
            Ok(rules) => rules,
            Err(e) => {
                error!(error = %e, "evaluator: failed to list rules");
                return;
            }
        };

        debug!(count = rules.len(), "evaluating active rules");
        for rule in &rules {
            self.evaluate_rule(rule).await;
        }
    }

    async fn evaluate_rule(&self, rule: &AlertRule) {
        let filter: BTreeMap<String, String> = match serde_json::from_value(rule.query.clone()) {
            Ok(filter) => filter,
            Err(e) => {
                error!(rule_id = %rule.id, error = %e, "evaluator: invalid rule query");
                return;
            }
        };

        let tenant = rule.tenant_id.to_string();
        let now = Utc::now();
        let query = build_rule_count_query(&tenant, &filter, rule.window_seconds, now);
        let indices = vec![tenant_index_pattern(&tenant)];

        let result = match self.searcher.search(&indices, &query).await {
            Ok(result) => result,
            Err(e) => {
                error!(rule_id = %rule.id, error = %e, "evaluator: search failed");
                return;
            }
        };
        let value = result.total as i32;

        let current = match alert_state::get(&self.pool, rule.id).await {
            Ok(Some(row)) => match row.state.parse::<AlertState>() {
                Ok(state) => state,
                Err(e) => {
                    error!(rule_id = %rule.id, error = %e, "evaluator: corrupt state row");
                    return;
                }
            },
            Ok(None) => AlertState::Ok,
            Err(e) => {
                error!(rule_id = %rule.id, error = %e, "evaluator: failed to load state");
                return;
            }
        };

        let exceeded = value >= rule.threshold;
        let next = next_state(current, exceeded);

        let fired_at = (current != next && next == AlertState::Firing).then_some(now);
        let resolved_at =
            (current == AlertState::Firing && next == AlertState::Ok).then_some(now);

        if let Err(e) = alert_state::upsert(
            &self.pool,
            rule.id,
            rule.tenant_id,
            next.as_str(),
            value,
            fired_at,
            resolved_at,
        )
        .await
        {
            error!(rule_id = %rule.id, error = %e, "evaluator: failed to upsert state");
            return;
        }

        if let Some(event_state) = transition_event(current, next) {
            self.publish_event(rule, event_state, value, current).await;
        }
    }

    async fn publish_event(
        &self,
        rule: &AlertRule,
        state: EventState,
        value: i32,
        previous: AlertState,
    ) {
        let event = AlertEvent {
            rule_id: rule.id,
            tenant_id: rule.tenant_id,
            rule_name: rule.name.clone(),
            state,
            value,
            threshold: rule.threshold,
            timestamp: Utc::now(),
        };

        let subject = alerts_events_subject(&rule.tenant_id.to_string());
        match self.publisher.publish(subject, &event).await {
            Ok(()) => info!(
                rule_id = %rule.id,
                rule_name = %rule.name,
                from = %previous,
                to = %state,
                value,
                "alert state changed"
            ),
            Err(e) => error!(
                rule_id = %rule.id,
                error = %e,
                "evaluator: failed to publish alert event"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn count_query_pins_tenant_and_window() {
        let now = Utc::now();
        let query = build_rule_count_query("t-1", &BTreeMap::new(), 60, now);

        assert_eq!(query["size"], 0);
        let must = query["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(must[0], json!({"term": {"tenant_id": "t-1"}}));

        let range = &must[1]["range"]["timestamp"];
        assert_eq!(range["lte"], json!(now.to_rfc3339()));
        assert_eq!(
            range["gte"],
            json!((now - chrono::Duration::seconds(60)).to_rfc3339())
        );
    }

    #[test]
    fn message_keys_become_full_text_matches() {
        let now = Utc::now();
        for key in ["query", "message"] {
            let query =
                build_rule_count_query("t-1", &filter(&[(key, "disk full")]), 60, now);
            let must = query["query"]["bool"]["must"].as_array().unwrap();
            assert!(
                must.iter()
                    .any(|c| c["match"]["message"] == "disk full"),
                "key {key:?} should full-text match"
            );
        }
    }

    #[test]
    fn other_keys_become_terms() {
        let now = Utc::now();
        let query = build_rule_count_query(
            "t-1",
            &filter(&[("service", "api"), ("level", "error")]),
            60,
            now,
        );
        let must = query["query"]["bool"]["must"].as_array().unwrap();
        assert!(must.iter().any(|c| c["term"]["service"] == "api"));
        assert!(must.iter().any(|c| c["term"]["level"] == "error"));
        assert!(must.iter().all(|c| c.get("match").is_none()));
    }

    #[test]
    fn rule_query_object_must_map_to_strings() {
        let query = json!({"service": "api", "level": "error"});
        let filter: Result<BTreeMap<String, String>, _> = serde_json::from_value(query);
        assert!(filter.is_ok());

        let bad = json!({"threshold": 3});
        let filter: Result<BTreeMap<String, String>, _> = serde_json::from_value(bad);
        assert!(filter.is_err());
    }
}
