//! Incident endpoints: list/create/get, status transitions, timeline.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mintlog_core::tenant::scopes;
use mintlog_core::TenantInfo;
use mintlog_incident::{IncidentError, IncidentStatus};
use mintlog_store::incidents::{Incident, TimelineEntry};

use crate::error::{internal_error, ApiError};
use crate::middleware::require_scope;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub title: String,
    #[serde(default)]
    pub severity: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PatchRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct TimelineRequest {
    #[serde(default)]
    pub event_type: String,
    pub content: String,
}

/// Incident plus its timeline when requested singly.
#[derive(Debug, Serialize)]
pub struct IncidentResponse {
    #[serde(flatten)]
    pub incident: Incident,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineEntry>>,
}

fn map_incident_error(err: IncidentError) -> ApiError {
    match err {
        IncidentError::InvalidTransition { .. } => ApiError::bad_request(err.to_string()),
        IncidentError::NotFound => ApiError::not_found("incident not found"),
        other => internal_error(other),
    }
}

/// `POST /v1/incidents`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<IncidentResponse>), ApiError> {
    require_scope(&info, scopes::INCIDENTS_WRITE)?;

    if req.title.is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }

    let incident = state
        .incidents
        .create(info.id, &req.title, &req.severity, None)
        .await
        .map_err(map_incident_error)?;

    Ok((
        StatusCode::CREATED,
        Json(IncidentResponse {
            incident,
            timeline: None,
        }),
    ))
}

/// `GET /v1/incidents?status=<s>`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<IncidentResponse>>, ApiError> {
    require_scope(&info, scopes::INCIDENTS_READ)?;

    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<IncidentStatus>()
                .map_err(|e| ApiError::bad_request(e.to_string()))?,
        ),
    };

    let incidents = state
        .incidents
        .list(info.id, status)
        .await
        .map_err(map_incident_error)?;

    Ok(Json(
        incidents
            .into_iter()
            .map(|incident| IncidentResponse {
                incident,
                timeline: None,
            })
            .collect(),
    ))
}

/// `GET /v1/incidents/{id}`, including the timeline.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Path(id): Path<Uuid>,
) -> Result<Json<IncidentResponse>, ApiError> {
    require_scope(&info, scopes::INCIDENTS_READ)?;

    let incident = state
        .incidents
        .get(id, info.id)
        .await
        .map_err(map_incident_error)?
        .ok_or_else(|| ApiError::not_found("incident not found"))?;

    let timeline = state
        .incidents
        .get_timeline(id)
        .await
        .map_err(map_incident_error)?;

    Ok(Json(IncidentResponse {
        incident,
        timeline: Some(timeline),
    }))
}

/// `PATCH /v1/incidents/{id}`: status transition; disallowed pairs are a
/// 400 with no write.
pub async fn patch(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Path(id): Path<Uuid>,
    Json(req): Json<PatchRequest>,
) -> Result<Json<IncidentResponse>, ApiError> {
    require_scope(&info, scopes::INCIDENTS_WRITE)?;

    if req.status.is_empty() {
        return Err(ApiError::bad_request("status is required"));
    }
    let status = req
        .status
        .parse::<IncidentStatus>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let incident = state
        .incidents
        .update_status(id, info.id, status)
        .await
        .map_err(map_incident_error)?;

    Ok(Json(IncidentResponse {
        incident,
        timeline: None,
    }))
}

/// `POST /v1/incidents/{id}/timeline`
pub async fn add_timeline(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Path(id): Path<Uuid>,
    Json(req): Json<TimelineRequest>,
) -> Result<(StatusCode, Json<TimelineEntry>), ApiError> {
    require_scope(&info, scopes::INCIDENTS_WRITE)?;

    // The incident must exist under the caller's tenant before appending.
    state
        .incidents
        .get(id, info.id)
        .await
        .map_err(map_incident_error)?
        .ok_or_else(|| ApiError::not_found("incident not found"))?;

    let event_type = if req.event_type.is_empty() {
        "comment"
    } else {
        &req.event_type
    };

    let entry = state
        .incidents
        .add_timeline(id, event_type, &req.content)
        .await
        .map_err(map_incident_error)?;

    Ok((StatusCode::CREATED, Json(entry)))
}
