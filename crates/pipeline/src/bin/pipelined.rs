//! Pipeline worker daemon.

use tracing::error;
use tracing_subscriber::EnvFilter;

use mintlog_bus::{ensure_streams_and_connect, Publisher};
use mintlog_core::config;
use mintlog_pipeline::Worker;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    config::load_dotenv();
    let cfg = config::Config::from_env();
    cfg.log_summary();

    let js = match ensure_streams_and_connect(&cfg.nats.url).await {
        Ok((_, js)) => js,
        Err(e) => {
            error!(error = %e, "nats connect failed");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        mintlog_bus::shutdown::wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let worker = Worker::new(Publisher::new(js.clone()));
    if let Err(e) = worker.run(&js, shutdown_rx).await {
        error!(error = %e, "pipeline worker failed");
        std::process::exit(1);
    }
}
