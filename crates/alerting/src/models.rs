//! Alert event wire model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::EventState;

/// Published to `alerts.events.<tenant>` on every transition across the
/// firing boundary; consumed by the notification dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub rule_id: Uuid,
    pub tenant_id: Uuid,
    pub rule_name: String,
    pub state: EventState,
    pub value: i32,
    pub threshold: i32,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_event_wire_shape() {
        let event = AlertEvent {
            rule_id: Uuid::nil(),
            tenant_id: Uuid::nil(),
            rule_name: "api errors".to_string(),
            state: EventState::Firing,
            value: 7,
            threshold: 3,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["state"], "firing");
        assert_eq!(json["value"], 7);
        assert_eq!(json["threshold"], 3);
        assert!(json["rule_name"].is_string());

        let back: AlertEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.state, EventState::Firing);
    }
}
