//! Level and timestamp normalization.

use chrono::{DateTime, Utc};

use mintlog_core::LogEvent;

/// Map a free-form level string to the canonical set. Anything unmapped
/// becomes `info`.
fn canonical_level(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "err" => "error",
        "fatal" | "panic" => "fatal",
        _ => "info",
    }
}

pub fn normalize_level(event: &mut LogEvent) {
    event.level = canonical_level(&event.level).to_string();
}

/// Ensure the timestamp is set. The type is already UTC; an epoch value
/// means the producer never stamped it.
pub fn normalize_timestamp(event: &mut LogEvent) {
    if event.timestamp == DateTime::<Utc>::UNIX_EPOCH {
        event.timestamp = Utc::now();
    }
}

/// All normalization steps, in order.
pub fn normalize(event: &mut LogEvent) {
    normalize_timestamp(event);
    normalize_level(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_json;

    fn event(level: &str) -> LogEvent {
        LogEvent {
            id: "e-1".to_string(),
            tenant_id: "t-1".to_string(),
            timestamp: Utc::now(),
            level: level.to_string(),
            message: "x".to_string(),
            service: "api".to_string(),
            host: String::new(),
            trace_id: String::new(),
            span_id: String::new(),
            fields: serde_json::Map::new(),
            tags: Vec::new(),
            raw: String::new(),
        }
    }

    #[test]
    fn aliases_map_to_canonical_levels() {
        for (input, expected) in [
            ("trace", "trace"),
            ("DEBUG", "debug"),
            ("warning", "warn"),
            ("WARN", "warn"),
            ("err", "error"),
            ("Error", "error"),
            ("panic", "fatal"),
            ("fatal", "fatal"),
            ("  info  ", "info"),
        ] {
            let mut e = event(input);
            normalize_level(&mut e);
            assert_eq!(e.level, expected, "input {input:?}");
        }
    }

    #[test]
    fn unknown_level_becomes_info() {
        let mut e = event("critical");
        normalize_level(&mut e);
        assert_eq!(e.level, "info");

        let mut e = event("");
        normalize_level(&mut e);
        assert_eq!(e.level, "info");
    }

    #[test]
    fn epoch_timestamp_is_replaced_with_now() {
        let mut e = event("info");
        e.timestamp = DateTime::<Utc>::UNIX_EPOCH;
        normalize_timestamp(&mut e);
        assert!(e.timestamp > Utc::now() - chrono::Duration::seconds(5));
    }

    #[test]
    fn set_timestamp_is_left_alone() {
        let mut e = event("info");
        let before = e.timestamp;
        normalize_timestamp(&mut e);
        assert_eq!(e.timestamp, before);
    }

    #[test]
    fn parse_then_normalize_is_idempotent() {
        let mut once = event("");
        once.raw = r#"{"severity":"warning","region":"eu-1"}"#.to_string();
        parse_json(&mut once);
        normalize(&mut once);

        let mut twice = once.clone();
        parse_json(&mut twice);
        normalize(&mut twice);

        assert_eq!(once.level, "warn");
        assert_eq!(twice.level, once.level);
        assert_eq!(twice.timestamp, once.timestamp);
        assert_eq!(twice.fields, once.fields);
        assert_eq!(twice.message, once.message);
    }
}
