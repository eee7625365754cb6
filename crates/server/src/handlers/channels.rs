//! Notification channel CRUD.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use mintlog_core::tenant::scopes;
use mintlog_core::TenantInfo;
use mintlog_notify::ChannelType;
use mintlog_store::channels::{self, NotificationChannel};

use crate::error::{internal_error, ApiError};
use crate::middleware::require_scope;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChannelRequest {
    pub name: String,
    #[serde(default)]
    pub channel_type: String,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

/// `POST /v1/notifications/channels`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Json(req): Json<ChannelRequest>,
) -> Result<(StatusCode, Json<NotificationChannel>), ApiError> {
    require_scope(&info, scopes::NOTIFICATIONS_WRITE)?;

    if req.name.is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }

    let channel_type = if req.channel_type.is_empty() {
        ChannelType::Webhook
    } else {
        req.channel_type
            .parse::<ChannelType>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?
    };
    let config = req.config.unwrap_or_else(|| json!({}));

    let channel = channels::create(
        &state.pool,
        info.id,
        &req.name,
        channel_type.as_str(),
        &config,
    )
    .await
    .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(channel)))
}

/// `GET /v1/notifications/channels`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
) -> Result<Json<Vec<NotificationChannel>>, ApiError> {
    require_scope(&info, scopes::NOTIFICATIONS_READ)?;
    let channels = channels::list(&state.pool, info.id)
        .await
        .map_err(internal_error)?;
    Ok(Json(channels))
}

/// `GET /v1/notifications/channels/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationChannel>, ApiError> {
    require_scope(&info, scopes::NOTIFICATIONS_READ)?;
    let channel = channels::get(&state.pool, id, info.id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| ApiError::not_found("channel not found"))?;
    Ok(Json(channel))
}

/// `DELETE /v1/notifications/channels/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_scope(&info, scopes::NOTIFICATIONS_WRITE)?;
    let deleted = channels::delete(&state.pool, id, info.id)
        .await
        .map_err(internal_error)?;
    if !deleted {
        return Err(ApiError::not_found("channel not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
