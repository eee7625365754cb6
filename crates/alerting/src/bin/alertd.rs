//! Alert evaluator daemon.

use tracing::error;
use tracing_subscriber::EnvFilter;

use mintlog_alerting::Evaluator;
use mintlog_bus::{ensure_streams_and_connect, Publisher};
use mintlog_core::config;
use mintlog_search::{OpenSearchClient, Searcher};

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

    let js = match ensure_streams_and_connect(&cfg.nats.url).await {
        Ok((_, js)) => js,
        Err(e) => {
            error!(error = %e, "nats connect failed");
            std::process::exit(1);
        }
    };

    let client = match OpenSearchClient::new(&cfg.opensearch) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "opensearch client failed");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        mintlog_bus::shutdown::wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let evaluator = Evaluator::new(pool, Searcher::new(client), Publisher::new(js));
    evaluator.run(shutdown_rx).await;
}
