//! Pipeline worker: consumes raw events, transforms, and re-publishes.

use std::time::Duration;

use async_nats::jetstream;
use futures::StreamExt;
use tokio::sync::watch;
use tracing::{error, info, warn};

use mintlog_bus::consumer::{ack, durable_consumer, nak, SubscriptionSpec};
use mintlog_bus::streams::{logs_parsed_subject, STREAM_LOGS_RAW, SUBJECT_LOGS_RAW_ALL};
use mintlog_bus::{BusError, Publisher};
use mintlog_core::LogEvent;

use crate::transform;

const SUBSCRIPTION: SubscriptionSpec = SubscriptionSpec {
    stream: STREAM_LOGS_RAW,
    subject: SUBJECT_LOGS_RAW_ALL,
    group: "pipeline-workers",
    ack_wait: Duration::from_secs(30),
    max_deliver: 3,
};

pub struct Worker {
    publisher: Publisher,
}

impl Worker {
    pub fn new(publisher: Publisher) -> Self {
        Self { publisher }
    }

    /// Consume `logs.raw.>` until shutdown. Unmarshal or publish failures
    /// nak the message and rely on redelivery.
    pub async fn run(
        &self,
        js: &jetstream::Context,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), BusError> {
        let consumer = durable_consumer(js, &SUBSCRIPTION).await?;
        let mut messages = consumer
            .messages()
            .await
            .map_err(|e| BusError::Consumer(e.to_string()))?;
        info!(subject = SUBJECT_LOGS_RAW_ALL, "pipeline worker started");

        loop {
            tokio::select! {
                maybe = messages.next() => {
                    match maybe {
                        Some(Ok(msg)) => self.handle(msg).await,
                        Some(Err(e)) => warn!(error = %e, "pipeline message stream error"),
                        None => {
                            warn!("pipeline message stream closed");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!("pipeline worker shutting down");
                    break;
                }
            }
        }
        Ok(())
    }

    async fn handle(&self, msg: jetstream::Message) {
        let mut event: LogEvent = match serde_json::from_slice(&msg.payload) {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "pipeline: failed to unmarshal event");
                nak(&msg).await;
                return;
            }
        };

        transform(&mut event);

        let subject = logs_parsed_subject(&event.tenant_id);
        match self.publisher.publish(subject, &event).await {
            Ok(()) => ack(&msg).await,
            Err(e) => {
                error!(error = %e, event_id = %event.id, "pipeline: failed to publish parsed event");
                nak(&msg).await;
            }
        }
    }
}
