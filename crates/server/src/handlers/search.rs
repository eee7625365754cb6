//! Log search, SSE tail, and aggregation endpoints.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio_stream::wrappers::ReceiverStream;
use tracing::error;

use mintlog_core::tenant::scopes;
use mintlog_core::TenantInfo;
use mintlog_search::indices::tenant_index_pattern;
use mintlog_search::query::{
    build_aggregate_query, build_search_query, build_tail_query, AggregateRequest, SearchRequest,
    TailRequest,
};

use crate::error::{internal_error, ApiError};
use crate::middleware::require_scope;
use crate::state::AppState;

const TAIL_POLL: Duration = Duration::from_secs(2);
const TAIL_LOOKBACK_SECS: i64 = 10;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub hits: Vec<Value>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct AggregateResponse {
    pub buckets: Value,
}

/// `POST /v1/logs/search`
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    require_scope(&info, scopes::SEARCH_LOGS)?;

    let tenant = info.id.to_string();
    let query = build_search_query(&tenant, &req);
    let indices = vec![tenant_index_pattern(&tenant)];

    let result = state
        .searcher
        .search(&indices, &query)
        .await
        .map_err(internal_error)?;

    Ok(Json(SearchResponse {
        hits: result.hits,
        total: result.total,
    }))
}

/// `POST /v1/logs/tail`: Server-Sent Events, polling every 2 seconds
/// with a 10-second initial look-back. One `data:` frame per document.
pub async fn tail(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Json(req): Json<TailRequest>,
) -> Result<Sse<ReceiverStream<Result<Event, Infallible>>>, ApiError> {
    require_scope(&info, scopes::SEARCH_LOGS)?;

    let tenant = info.id.to_string();
    let searcher = state.searcher.clone();
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Event, Infallible>>(64);

    tokio::spawn(async move {
        let indices = vec![tenant_index_pattern(&tenant)];
        let mut since = Utc::now() - chrono::Duration::seconds(TAIL_LOOKBACK_SECS);
        let mut ticker = tokio::time::interval(TAIL_POLL);
        ticker.tick().await; // first tick fires immediately

        loop {
            ticker.tick().await;
            let query = build_tail_query(&tenant, &req, since);
            match searcher.search(&indices, &query).await {
                Ok(result) => {
                    for hit in result.hits {
                        let event = Event::default().data(hit.to_string());
                        if tx.send(Ok(event)).await.is_err() {
                            return; // client disconnected
                        }
                    }
                }
                Err(e) => error!(error = %e, "tail search failed"),
            }
            since = Utc::now();
        }
    });

    Ok(Sse::new(ReceiverStream::new(rx)))
}

/// `POST /v1/logs/aggregate`
pub async fn aggregate(
    State(state): State<Arc<AppState>>,
    Extension(info): Extension<TenantInfo>,
    Json(req): Json<AggregateRequest>,
) -> Result<Json<AggregateResponse>, ApiError> {
    require_scope(&info, scopes::SEARCH_LOGS)?;

    let tenant = info.id.to_string();
    let query = build_aggregate_query(&tenant, &req);
    let indices = vec![tenant_index_pattern(&tenant)];

    let buckets = state
        .searcher
        .aggregate(&indices, &query)
        .await
        .map_err(internal_error)?;

    Ok(Json(AggregateResponse { buckets }))
}
