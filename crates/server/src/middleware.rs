//! Auth and rate-limit middleware shared by both HTTP daemons.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{error, warn};

use mintlog_core::tenant::has_scope;
use mintlog_core::TenantInfo;

use crate::error::ApiError;
use crate::state::AppState;

/// Resolve `X-API-Key` and attach the tenant to the request. 401 on
/// missing, unknown, inactive, or expired keys.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let raw_key = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if raw_key.is_empty() {
        return Err(ApiError::unauthorized("missing X-API-Key header"));
    }

    let info = match state.resolver.resolve(&raw_key).await {
        Ok(Some(info)) => info,
        Ok(None) => return Err(ApiError::unauthorized("invalid or expired API key")),
        Err(e) => {
            error!(error = %e, "api key resolution failed");
            return Err(ApiError::unauthorized("invalid or expired API key"));
        }
    };

    req.extensions_mut().insert(info);
    Ok(next.run(req).await)
}

/// Per-tenant sliding-window rate limit. A limiter outage admits the
/// request rather than failing closed.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(info) = req.extensions().get::<TenantInfo>().cloned() else {
        return Ok(next.run(req).await);
    };

    match state
        .limiter
        .allow(&info.id.to_string(), i64::from(info.rate_limit))
        .await
    {
        Ok((true, _)) => Ok(next.run(req).await),
        Ok((false, _)) => Err(ApiError::too_many_requests("rate limit exceeded")),
        Err(e) => {
            warn!(error = %e, "rate limiter unavailable, admitting request");
            Ok(next.run(req).await)
        }
    }
}

/// Handler-level scope guard; `admin` satisfies every scope.
pub fn require_scope(info: &TenantInfo, scope: &str) -> Result<(), ApiError> {
    if has_scope(&info.scopes, scope) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!("insufficient scope: {scope}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn tenant(scopes: &[&str]) -> TenantInfo {
        TenantInfo {
            id: Uuid::nil(),
            name: "t".to_string(),
            plan: "free".to_string(),
            retention_days: 30,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            rate_limit: 1000,
        }
    }

    #[test]
    fn scope_guard_allows_and_denies() {
        let info = tenant(&["search:logs"]);
        assert!(require_scope(&info, "search:logs").is_ok());
        let err = require_scope(&info, "alerts:write").unwrap_err();
        assert_eq!(err.code, 403);
        assert!(err.message.contains("alerts:write"));
    }

    #[test]
    fn admin_passes_any_scope_guard() {
        let info = tenant(&["admin"]);
        assert!(require_scope(&info, "incidents:write").is_ok());
    }
}
