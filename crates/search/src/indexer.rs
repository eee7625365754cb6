//! Bulk indexer: consumes parsed log events from the bus and batch-writes
//! them to the search store.
//!
//! The buffer is owned by a single task driving a `select!` over the
//! message stream, the flush ticker, and the shutdown signal, so the size
//! trigger and the time trigger cannot race. Each buffered item keeps its
//! delivery handle; acks and naks are issued per event once the batch
//! outcome is known.
//!
//! Outcome policy: a transport failure naks the whole batch (it will
//! redeliver), while item-level bulk errors are logged and acked:
//! document ids make retries idempotent, and redelivering already-indexed
//! events would duplicate work without fixing the recorded error.

use std::time::Duration;

use async_nats::jetstream;
use futures::StreamExt;
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use mintlog_bus::consumer::{ack, durable_consumer, nak, SubscriptionSpec};
use mintlog_bus::streams::{STREAM_LOGS_PARSED, SUBJECT_LOGS_PARSED_ALL};
use mintlog_core::LogEvent;

use crate::batcher::MicroBatcher;
use crate::client::OpenSearchClient;
use crate::error::SearchError;
use crate::indices::index_name;

const BATCH_SIZE: usize = 500;
const FLUSH_EVERY: Duration = Duration::from_secs(2);
/// How often the time trigger is checked; bounds batch age at
/// `FLUSH_EVERY + TICK`.
const TICK: Duration = Duration::from_millis(500);

const SUBSCRIPTION: SubscriptionSpec = SubscriptionSpec {
    stream: STREAM_LOGS_PARSED,
    subject: SUBJECT_LOGS_PARSED_ALL,
    group: "opensearch-indexers",
    ack_wait: Duration::from_secs(30),
    max_deliver: 3,
};

struct BulkItem {
    index: String,
    id: String,
    doc: String,
    msg: jetstream::Message,
}

pub struct BulkIndexer {
    client: OpenSearchClient,
}

impl BulkIndexer {
    pub fn new(client: OpenSearchClient) -> Self {
        Self { client }
    }

    /// Run until the shutdown signal fires, then perform one final flush.
    pub async fn run(
        self,
        js: &jetstream::Context,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), SearchError> {
        let consumer = durable_consumer(js, &SUBSCRIPTION).await?;
        let mut messages = consumer
            .messages()
            .await
            .map_err(|e| mintlog_bus::BusError::Consumer(e.to_string()))?;

        let mut batcher: MicroBatcher<BulkItem> = MicroBatcher::new(BATCH_SIZE, FLUSH_EVERY);
        let mut tick = tokio::time::interval(TICK);
        info!(subject = SUBJECT_LOGS_PARSED_ALL, "bulk indexer started");

        loop {
            tokio::select! {
                maybe = messages.next() => {
                    match maybe {
                        Some(Ok(msg)) => {
                            self.buffer_message(&mut batcher, msg).await;
                            if let Some(items) = batcher.try_flush() {
                                self.flush(items).await;
                            }
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "indexer message stream error");
                        }
                        None => {
                            warn!("indexer message stream closed");
                            break;
                        }
                    }
                }
                _ = tick.tick() => {
                    if let Some(items) = batcher.try_flush() {
                        self.flush(items).await;
                    }
                }
                _ = shutdown.changed() => {
                    info!("bulk indexer shutting down");
                    break;
                }
            }
        }

        // Final flush so buffered events are not stranded until redelivery.
        let items = batcher.flush();
        if !items.is_empty() {
            self.flush(items).await;
        }
        Ok(())
    }

    async fn buffer_message(&self, batcher: &mut MicroBatcher<BulkItem>, msg: jetstream::Message) {
        let event: LogEvent = match serde_json::from_slice(&msg.payload) {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "indexer: unmarshal failed");
                nak(&msg).await;
                return;
            }
        };

        let doc = match serde_json::to_string(&event) {
            Ok(doc) => doc,
            Err(e) => {
                error!(error = %e, event_id = %event.id, "indexer: serialize failed");
                nak(&msg).await;
                return;
            }
        };

        batcher.push(BulkItem {
            index: index_name(&event.tenant_id, event.timestamp),
            id: event.id,
            doc,
            msg,
        });
    }

    /// Write one batch and ack/nak every buffered message by outcome.
    async fn flush(&self, items: Vec<BulkItem>) {
        let mut body = String::with_capacity(items.len() * 256);
        for item in &items {
            let meta = json!({"index": {"_index": item.index, "_id": item.id}});
            body.push_str(&meta.to_string());
            body.push('\n');
            body.push_str(&item.doc);
            body.push('\n');
        }

        match self.client.bulk(body).await {
            Ok(resp) => {
                if resp.errors {
                    warn!(count = items.len(), "bulk index had item errors");
                }
                for item in &items {
                    ack(&item.msg).await;
                }
                debug!(count = items.len(), "bulk indexed");
            }
            Err(e) => {
                error!(error = %e, count = items.len(), "bulk index failed");
                for item in &items {
                    nak(&item.msg).await;
                }
            }
        }
    }
}
