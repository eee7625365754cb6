//! Tenant and API key administration.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mintlog_core::tenant::scopes;
use mintlog_core::TenantInfo;
use mintlog_store::{api_keys, tenants};

use crate::auth::{hash_key, key_prefix};
use crate::error::{internal_error, ApiError};
use crate::middleware::require_scope;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub retention_days: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub rate_limit: i32,
}

/// The raw key is returned exactly once, at creation.
#[derive(Debug, Serialize)]
pub struct CreateKeyResponse {
    pub key: String,
    pub prefix: String,
    pub id: Uuid,
}

/// `POST /v1/admin/tenants`
pub async fn create_tenant(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Json(req): Json<CreateTenantRequest>,
) -> Result<(StatusCode, Json<tenants::Tenant>), ApiError> {
    require_scope(&info, scopes::ADMIN)?;

    if req.name.is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    let plan = if req.plan.is_empty() { "free" } else { &req.plan };
    let retention_days = if req.retention_days <= 0 {
        30
    } else {
        req.retention_days
    };

    let tenant = tenants::create(&state.pool, &req.name, plan, retention_days)
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(tenant)))
}

/// `POST /v1/admin/tenants/{id}/keys`
pub async fn create_key(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Path(tenant_id): Path<Uuid>,
    Json(req): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<CreateKeyResponse>), ApiError> {
    require_scope(&info, scopes::ADMIN)?;

    tenants::get(&state.pool, tenant_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| ApiError::not_found("tenant not found"))?;

    let key_scopes = if req.scopes.is_empty() {
        scopes::ALL.iter().map(|s| s.to_string()).collect()
    } else {
        req.scopes
    };
    let rate_limit = if req.rate_limit <= 0 {
        1000
    } else {
        req.rate_limit
    };

    let raw_key = format!("mlk_{}", Uuid::new_v4());
    let prefix = key_prefix(&raw_key).to_string();

    let key = api_keys::create(
        &state.pool,
        tenant_id,
        &hash_key(&raw_key),
        &prefix,
        &req.name,
        &key_scopes,
        rate_limit,
        None,
    )
    .await
    .map_err(internal_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateKeyResponse {
            key: raw_key,
            prefix,
            id: key.id,
        }),
    ))
}
