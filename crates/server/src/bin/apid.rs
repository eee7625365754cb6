//! Control-plane and search API daemon. Also hosts the bulk indexer and
//! the incident auto-create consumer as background tasks.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mintlog_bus::{ensure_streams_and_connect, Publisher};
use mintlog_core::config;
use mintlog_incident::AutoCreateConsumer;
use mintlog_search::indices::ensure_index_template;
use mintlog_search::{BulkIndexer, OpenSearchClient, Searcher};
use mintlog_server::auth::KeyResolver;
use mintlog_server::{api_router, AppState};
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
    ensure_index_template(&os_client).await;

    let cache = Cache::new(redis.clone(), CACHE_TTL);
    let incidents = mintlog_incident::Service::new(pool.clone());
    let state = Arc::new(AppState {
        pool: pool.clone(),
        publisher: Publisher::new(js.clone()),
        searcher: Searcher::new(os_client.clone()),
        resolver: KeyResolver::new(pool, cache),
        limiter: RateLimiter::new(redis, RATE_WINDOW),
        incidents: incidents.clone(),
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Bulk indexer (logs.parsed → search store).
    let indexer = BulkIndexer::new(os_client);
    let indexer_js = js.clone();
    let indexer_rx = shutdown_rx.clone();
    let indexer_task = tokio::spawn(async move {
        if let Err(e) = indexer.run(&indexer_js, indexer_rx).await {
            error!(error = %e, "bulk indexer failed");
        }
    });

    // Incident auto-create consumer (incidents.events).
    let consumer = AutoCreateConsumer::new(incidents);
    let consumer_js = js;
    let consumer_rx = shutdown_rx.clone();
    let consumer_task = tokio::spawn(async move {
        if let Err(e) = consumer.run(&consumer_js, consumer_rx).await {
            error!(error = %e, "incident consumer failed");
        }
    });

    let listener = match tokio::net::TcpListener::bind(&cfg.http.api_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %cfg.http.api_addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(addr = %cfg.http.api_addr, "apid listening");

    let app = api_router(state);
    let mut server_rx = shutdown_rx.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_rx.changed().await;
            })
            .await
    });

    mintlog_bus::shutdown::wait_for_signal().await;
    let _ = shutdown_tx.send(true);

    if tokio::time::timeout(HTTP_DRAIN, server).await.is_err() {
        warn!("http drain timed out");
    }
    // The indexer performs its final flush before this join resolves.
    let _ = tokio::time::timeout(Duration::from_secs(10), indexer_task).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), consumer_task).await;
    info!("apid stopped");
}
