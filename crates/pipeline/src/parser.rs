//! Structured-payload extraction from the raw message text.

use serde_json::Value;

use mintlog_core::LogEvent;

fn fill_if_empty(slot: &mut String, value: &Value) {
    if slot.is_empty() {
        if let Value::String(s) = value {
            *slot = s.clone();
        }
    }
}

/// If `raw` parses as a JSON object, merge its keys into the event.
///
/// Well-known keys populate the corresponding canonical field only when it
/// is currently empty; everything else lands in `fields`. Non-JSON raw
/// text is a silent no-op.
pub fn parse_json(event: &mut LogEvent) {
    if event.raw.is_empty() {
        return;
    }

    let parsed = match serde_json::from_str::<Value>(&event.raw) {
        Ok(Value::Object(map)) => map,
        _ => return,
    };

    for (key, value) in parsed {
        match key.as_str() {
            "message" | "msg" => fill_if_empty(&mut event.message, &value),
            "level" | "severity" => fill_if_empty(&mut event.level, &value),
            "service" | "app" => fill_if_empty(&mut event.service, &value),
            "host" | "hostname" => fill_if_empty(&mut event.host, &value),
            "trace_id" => fill_if_empty(&mut event.trace_id, &value),
            "span_id" => fill_if_empty(&mut event.span_id, &value),
            _ => {
                event.fields.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn event_with_raw(raw: &str) -> LogEvent {
        LogEvent {
            id: "e-1".to_string(),
            tenant_id: "t-1".to_string(),
            timestamp: Utc::now(),
            level: String::new(),
            message: String::new(),
            service: String::new(),
            host: String::new(),
            trace_id: String::new(),
            span_id: String::new(),
            fields: serde_json::Map::new(),
            tags: Vec::new(),
            raw: raw.to_string(),
        }
    }

    #[test]
    fn known_keys_fill_empty_canonical_fields() {
        let mut event =
            event_with_raw(r#"{"msg":"db down","severity":"error","app":"billing","hostname":"db-3"}"#);
        parse_json(&mut event);
        assert_eq!(event.message, "db down");
        assert_eq!(event.level, "error");
        assert_eq!(event.service, "billing");
        assert_eq!(event.host, "db-3");
        assert!(event.fields.is_empty());
    }

    #[test]
    fn populated_fields_are_not_overwritten() {
        let mut event = event_with_raw(r#"{"message":"from raw","level":"debug"}"#);
        event.message = "already set".to_string();
        parse_json(&mut event);
        assert_eq!(event.message, "already set");
        assert_eq!(event.level, "debug");
    }

    #[test]
    fn unknown_keys_land_in_fields() {
        let mut event = event_with_raw(r#"{"user_id":42,"region":"eu-1"}"#);
        parse_json(&mut event);
        assert_eq!(event.fields["user_id"], json!(42));
        assert_eq!(event.fields["region"], "eu-1");
    }

    #[test]
    fn non_json_raw_is_a_silent_noop() {
        let mut event = event_with_raw("plain text line");
        parse_json(&mut event);
        assert!(event.message.is_empty());
        assert!(event.fields.is_empty());
    }

    #[test]
    fn json_array_raw_is_ignored() {
        let mut event = event_with_raw(r#"[1,2,3]"#);
        parse_json(&mut event);
        assert!(event.fields.is_empty());
    }

    #[test]
    fn non_string_values_never_fill_canonical_fields() {
        let mut event = event_with_raw(r#"{"message":7,"trace_id":true}"#);
        parse_json(&mut event);
        assert!(event.message.is_empty());
        assert!(event.trace_id.is_empty());
    }
}
