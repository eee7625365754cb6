//! Durable publish/subscribe bus on NATS JetStream.
//!
//! This crate owns the stream topology (work-queue streams for the log
//! pipeline, interest streams for alert/incident events), a JSON publisher,
//! and the durable pull-consumer builder every daemon subscribes through.

pub mod consumer;
pub mod error;
pub mod publisher;
pub mod shutdown;
pub mod streams;

pub use consumer::{durable_consumer, SubscriptionSpec};
pub use error::BusError;
pub use publisher::Publisher;

use async_nats::jetstream;

/// Connect to NATS and open a JetStream context.
pub async fn connect(url: &str) -> Result<(async_nats::Client, jetstream::Context), BusError> {
    let client = async_nats::ConnectOptions::new()
        .retry_on_initial_connect()
        .connect(url)
        .await
        .map_err(|e| BusError::Connection(format!("nats connect: {e}")))?;
    let js = jetstream::new(client.clone());
    Ok((client, js))
}

/// Connect and make sure the stream topology exists. This is the first
/// call every daemon makes against the bus.
pub async fn ensure_streams_and_connect(
    url: &str,
) -> Result<(async_nats::Client, jetstream::Context), BusError> {
    let (client, js) = connect(url).await?;
    streams::ensure_streams(&js).await?;
    Ok((client, js))
}
