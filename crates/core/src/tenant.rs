//! Tenant identity resolved from an API key, and the scope model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity attached to every authenticated request. Cached in Redis keyed
/// by the API key hash; never contains the raw key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantInfo {
    pub id: Uuid,
    pub name: String,
    pub plan: String,
    pub retention_days: i32,
    pub scopes: Vec<String>,
    pub rate_limit: i32,
}

pub mod scopes {
    pub const INGEST_LOGS: &str = "ingest:logs";
    pub const SEARCH_LOGS: &str = "search:logs";
    pub const ALERTS_READ: &str = "alerts:read";
    pub const ALERTS_WRITE: &str = "alerts:write";
    pub const INCIDENTS_READ: &str = "incidents:read";
    pub const INCIDENTS_WRITE: &str = "incidents:write";
    pub const NOTIFICATIONS_READ: &str = "notifications:read";
    pub const NOTIFICATIONS_WRITE: &str = "notifications:write";
    pub const ADMIN: &str = "admin";

    pub const ALL: &[&str] = &[
        INGEST_LOGS,
        SEARCH_LOGS,
        ALERTS_READ,
        ALERTS_WRITE,
        INCIDENTS_READ,
        INCIDENTS_WRITE,
        NOTIFICATIONS_READ,
        NOTIFICATIONS_WRITE,
        ADMIN,
    ];
}

/// `admin` implicitly satisfies any required scope.
pub fn has_scope(granted: &[String], required: &str) -> bool {
    granted
        .iter()
        .any(|s| s == required || s == scopes::ADMIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_scope_matches() {
        let granted = vec!["ingest:logs".to_string()];
        assert!(has_scope(&granted, scopes::INGEST_LOGS));
        assert!(!has_scope(&granted, scopes::SEARCH_LOGS));
    }

    #[test]
    fn admin_satisfies_everything() {
        let granted = vec!["admin".to_string()];
        for scope in scopes::ALL {
            assert!(has_scope(&granted, scope));
        }
    }

    #[test]
    fn empty_grants_nothing() {
        assert!(!has_scope(&[], scopes::ADMIN));
    }
}
