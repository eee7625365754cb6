//! Incident status machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Triggered,
    Acknowledged,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Triggered => "triggered",
            IncidentStatus::Acknowledged => "acknowledged",
            IncidentStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown incident status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for IncidentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "triggered" => Ok(IncidentStatus::Triggered),
            "acknowledged" => Ok(IncidentStatus::Acknowledged),
            "resolved" => Ok(IncidentStatus::Resolved),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// The allowed transitions: triggered → acknowledged|resolved,
/// acknowledged → resolved, resolved → nothing.
pub fn valid_transition(from: IncidentStatus, to: IncidentStatus) -> bool {
    use IncidentStatus::*;
    match from {
        Triggered => matches!(to, Acknowledged | Resolved),
        Acknowledged => matches!(to, Resolved),
        Resolved => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use IncidentStatus::*;

    #[test]
    fn allowed_transitions() {
        assert!(valid_transition(Triggered, Acknowledged));
        assert!(valid_transition(Triggered, Resolved));
        assert!(valid_transition(Acknowledged, Resolved));
    }

    #[test]
    fn disallowed_transitions() {
        assert!(!valid_transition(Resolved, Acknowledged));
        assert!(!valid_transition(Resolved, Triggered));
        assert!(!valid_transition(Acknowledged, Triggered));
        assert!(!valid_transition(Triggered, Triggered));
        assert!(!valid_transition(Resolved, Resolved));
    }

    #[test]
    fn status_parses_lowercase_only() {
        assert_eq!("triggered".parse::<IncidentStatus>().unwrap(), Triggered);
        assert!("Triggered".parse::<IncidentStatus>().is_err());
        assert!("closed".parse::<IncidentStatus>().is_err());
    }
}
