//! The alert state machine.
//!
//! Two persisted states, edge-triggered events: only transitions across
//! the `firing` boundary are published; within-state ticks are silent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persisted per-rule state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    Ok,
    Firing,
}

impl AlertState {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertState::Ok => "ok",
            AlertState::Firing => "firing",
        }
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown alert state: {0}")]
pub struct UnknownState(pub String);

impl FromStr for AlertState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(AlertState::Ok),
            "firing" => Ok(AlertState::Firing),
            other => Err(UnknownState(other.to_string())),
        }
    }
}

/// State label carried on published alert events. `resolved` is a
/// synthesized label for the `firing → ok` edge; it is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventState {
    Firing,
    Resolved,
}

impl EventState {
    pub fn as_str(self) -> &'static str {
        match self {
            EventState::Firing => "firing",
            EventState::Resolved => "resolved",
        }
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transition function. Ties break toward `firing` (the evaluator compares
/// with `>=`).
pub fn next_state(current: AlertState, exceeded: bool) -> AlertState {
    match (current, exceeded) {
        (AlertState::Ok, false) => AlertState::Ok,
        (AlertState::Ok, true) => AlertState::Firing,
        (AlertState::Firing, true) => AlertState::Firing,
        (AlertState::Firing, false) => AlertState::Ok,
    }
}

/// The event to publish for a state change, if any. Only the two edges
/// across the `firing` boundary produce events.
pub fn transition_event(current: AlertState, next: AlertState) -> Option<EventState> {
    match (current, next) {
        (AlertState::Ok, AlertState::Firing) => Some(EventState::Firing),
        (AlertState::Firing, AlertState::Ok) => Some(EventState::Resolved),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table() {
        assert_eq!(next_state(AlertState::Ok, false), AlertState::Ok);
        assert_eq!(next_state(AlertState::Ok, true), AlertState::Firing);
        assert_eq!(next_state(AlertState::Firing, true), AlertState::Firing);
        assert_eq!(next_state(AlertState::Firing, false), AlertState::Ok);
    }

    #[test]
    fn only_boundary_edges_emit_events() {
        assert_eq!(
            transition_event(AlertState::Ok, AlertState::Firing),
            Some(EventState::Firing)
        );
        assert_eq!(
            transition_event(AlertState::Firing, AlertState::Ok),
            Some(EventState::Resolved)
        );
        assert_eq!(transition_event(AlertState::Ok, AlertState::Ok), None);
        assert_eq!(transition_event(AlertState::Firing, AlertState::Firing), None);
    }

    #[test]
    fn contiguous_exceeded_run_emits_exactly_two_events() {
        // value >= threshold for ticks 2..=4 only.
        let exceeded = [false, false, true, true, true, false, false];
        let mut state = AlertState::Ok;
        let mut events = Vec::new();
        for e in exceeded {
            let next = next_state(state, e);
            if let Some(event) = transition_event(state, next) {
                events.push(event);
            }
            state = next;
        }
        assert_eq!(events, vec![EventState::Firing, EventState::Resolved]);
    }

    #[test]
    fn state_strings_roundtrip() {
        assert_eq!("ok".parse::<AlertState>().unwrap(), AlertState::Ok);
        assert_eq!("firing".parse::<AlertState>().unwrap(), AlertState::Firing);
        assert!("resolved".parse::<AlertState>().is_err());
        assert!("OK".parse::<AlertState>().is_err());
    }

    #[test]
    fn event_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EventState::Resolved).unwrap(),
            "\"resolved\""
        );
        assert_eq!(
            serde_json::from_str::<EventState>("\"firing\"").unwrap(),
            EventState::Firing
        );
        assert!(serde_json::from_str::<EventState>("\"ok\"").is_err());
    }
}
