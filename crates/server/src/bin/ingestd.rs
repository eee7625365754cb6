//! Log intake daemon.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mintlog_bus::{ensure_streams_and_connect, Publisher};
use mintlog_core::config;
use mintlog_search::{OpenSearchClient, Searcher};
use mintlog_server::auth::KeyResolver;
use mintlog_server::{ingest_router, AppState};
use mintlog_store::{Cache, RateLimiter};

const CACHE_TTL: Duration = Duration::from_secs(300);
const RATE_WINDOW: Duration = Duration::from_secs(60);
const HTTP_DRAIN: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    config::load_dotenv();
    let cfg = config::Config::from_env();
    cfg.log_summary();

    let pool = match mintlog_store::init_pool(&cfg.postgres).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "postgres connect failed");
            std::process::exit(1);
        }
    };

    let redis = match mintlog_store::cache::connect(&cfg.redis.url()).await {
        Ok(conn) => conn,
        Err(e) => {
            error!(error = %e, "redis connect failed");
            std::process::exit(1);
        }
    };

    let js = match ensure_streams_and_connect(&cfg.nats.url).await {
        Ok((_, js)) => js,
        Err(e) => {
            error!(error = %e, "nats connect failed");
            std::process::exit(1);
        }
    };

    let os_client = match OpenSearchClient::new(&cfg.opensearch) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "opensearch client failed");
            std::process::exit(1);
        }
    };

    let cache = Cache::new(redis.clone(), CACHE_TTL);
    let state = Arc::new(AppState {
        pool: pool.clone(),
        publisher: Publisher::new(js),
        searcher: Searcher::new(os_client),
        resolver: KeyResolver::new(pool.clone(), cache),
        limiter: RateLimiter::new(redis, RATE_WINDOW),
        incidents: mintlog_incident::Service::new(pool),
    });

    let listener = match tokio::net::TcpListener::bind(&cfg.http.ingest_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %cfg.http.ingest_addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(addr = %cfg.http.ingest_addr, "ingestd listening");

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    let app = ingest_router(state);
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    mintlog_bus::shutdown::wait_for_signal().await;
    let _ = shutdown_tx.send(true);

    if tokio::time::timeout(HTTP_DRAIN, server).await.is_err() {
        warn!("http drain timed out");
    }
    info!("ingestd stopped");
}
