//! Alert rule CRUD.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use mintlog_core::tenant::scopes;
use mintlog_core::TenantInfo;
use mintlog_store::alert_rules::{self, AlertRule};

use crate::error::{internal_error, ApiError};
use crate::middleware::require_scope;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    pub name: String,
    pub query: serde_json::Value,
    pub threshold: i32,
    pub window_seconds: i32,
    #[serde(default)]
    pub eval_interval: String,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRuleRequest {
    pub name: Option<String>,
    pub query: Option<serde_json::Value>,
    pub threshold: Option<i32>,
    pub window_seconds: Option<i32>,
    pub eval_interval: Option<String>,
    pub is_active: Option<bool>,
}

fn validate_query(query: &serde_json::Value) -> Result<(), ApiError> {
    if !query.is_object() {
        return Err(ApiError::bad_request(
            "query must be an object mapping fields to values",
        ));
    }
    Ok(())
}

/// `POST /v1/alerts/rules`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Json(req): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<AlertRule>), ApiError> {
    require_scope(&info, scopes::ALERTS_WRITE)?;

    if req.name.is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    validate_query(&req.query)?;
    if req.threshold < 1 {
        return Err(ApiError::bad_request("threshold must be at least 1"));
    }
    if req.window_seconds < 1 {
        return Err(ApiError::bad_request("window_seconds must be at least 1"));
    }

    let eval_interval = if req.eval_interval.is_empty() {
        "30s"
    } else {
        &req.eval_interval
    };

    let rule = alert_rules::create(
        &state.pool,
        info.id,
        &req.name,
        &req.query,
        req.threshold,
        req.window_seconds,
        eval_interval,
        req.is_active.unwrap_or(true),
    )
    .await
    .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(rule)))
}

/// `GET /v1/alerts/rules`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
) -> Result<Json<Vec<AlertRule>>, ApiError> {
    require_scope(&info, scopes::ALERTS_READ)?;
    let rules = alert_rules::list(&state.pool, info.id)
        .await
        .map_err(internal_error)?;
    Ok(Json(rules))
}

/// `GET /v1/alerts/rules/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Path(id): Path<Uuid>,
) -> Result<Json<AlertRule>, ApiError> {
    require_scope(&info, scopes::ALERTS_READ)?;
    let rule = alert_rules::get(&state.pool, id, info.id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| ApiError::not_found("alert rule not found"))?;
    Ok(Json(rule))
}

/// `PUT /v1/alerts/rules/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRuleRequest>,
) -> Result<Json<AlertRule>, ApiError> {
    require_scope(&info, scopes::ALERTS_WRITE)?;

    if let Some(ref query) = req.query {
        validate_query(query)?;
    }
    if matches!(req.threshold, Some(t) if t < 1) {
        return Err(ApiError::bad_request("threshold must be at least 1"));
    }
    if matches!(req.window_seconds, Some(w) if w < 1) {
        return Err(ApiError::bad_request("window_seconds must be at least 1"));
    }

    let rule = alert_rules::update(
        &state.pool,
        id,
        info.id,
        req.name.as_deref(),
        req.query.as_ref(),
        req.threshold,
        req.window_seconds,
        req.eval_interval.as_deref(),
        req.is_active,
    )
    .await
    .map_err(internal_error)?
    .ok_or_else(|| ApiError::not_found("alert rule not found"))?;

    Ok(Json(rule))
}

/// `DELETE /v1/alerts/rules/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_scope(&info, scopes::ALERTS_WRITE)?;
    let deleted = alert_rules::delete(&state.pool, id, info.id)
        .await
        .map_err(internal_error)?;
    if !deleted {
        return Err(ApiError::not_found("alert rule not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
