//! Router construction and the shared middleware stack.
//!
//! Layer order (outermost first): request-id stamp → request-id propagate
//! → panic recovery → trace → CORS. Under `/v1`, auth runs before the
//! rate limit so the limiter keys on the resolved tenant.

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers::{admin, alerts, channels, incidents, search};
use crate::ingest;
use crate::middleware as mw;
use crate::state::AppState;

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "panic recovered in request handler");
    ApiError::internal("internal server error").into_response()
}

fn common_layers(router: Router) -> Router {
    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// The `apid` surface: search, CRUD, incidents, admin.
pub fn api_router(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .route("/logs/search", post(search::search))
        .route("/logs/tail", post(search::tail))
        .route("/logs/aggregate", post(search::aggregate))
        .route("/alerts/rules", get(alerts::list).post(alerts::create))
        .route(
            "/alerts/rules/{id}",
            get(alerts::get).put(alerts::update).delete(alerts::delete),
        )
        .route(
            "/notifications/channels",
            get(channels::list).post(channels::create),
        )
        .route(
            "/notifications/channels/{id}",
            get(channels::get).delete(channels::delete),
        )
        .route("/incidents", get(incidents::list).post(incidents::create))
        .route(
            "/incidents/{id}",
            get(incidents::get).patch(incidents::patch),
        )
        .route("/incidents/{id}/timeline", post(incidents::add_timeline))
        .route("/admin/tenants", post(admin::create_tenant))
        .route("/admin/tenants/{id}/keys", post(admin::create_key))
        .layer(from_fn_with_state(state.clone(), mw::rate_limit))
        .layer(from_fn_with_state(state.clone(), mw::auth));

    common_layers(
        Router::new()
            .route("/healthz", get(healthz))
            .nest("/v1", v1)
            .with_state(state),
    )
}

/// The `ingestd` surface: log intake only.
pub fn ingest_router(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .route("/ingest/logs", post(ingest::ingest_logs))
        .layer(from_fn_with_state(state.clone(), mw::rate_limit))
        .layer(from_fn_with_state(state.clone(), mw::auth));

    common_layers(
        Router::new()
            .route("/healthz", get(healthz))
            .nest("/v1", v1)
            .with_state(state),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn healthz_reports_ok() {
        let app = Router::new().route("/healthz", get(healthz));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }
}
