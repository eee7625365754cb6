//! Durable pull-consumer builder and ack helpers.
//!
//! Each consumer group is one named durable pull consumer; processes that
//! pull from the same durable share the work-queue load. Redelivery is
//! bounded by `max_deliver`, after which the bus dead-letters the message.

use std::time::Duration;

use async_nats::jetstream;
use async_nats::jetstream::consumer::{pull, AckPolicy, PullConsumer};
use async_nats::jetstream::AckKind;
use tracing::warn;

use crate::error::BusError;

/// One durable subscription: stream + subject filter + group name + retry
/// discipline.
#[derive(Debug, Clone)]
pub struct SubscriptionSpec {
    pub stream: &'static str,
    pub subject: &'static str,
    pub group: &'static str,
    pub ack_wait: Duration,
    pub max_deliver: i64,
}

/// Bind a durable pull consumer for the given subscription, creating it on
/// first use.
pub async fn durable_consumer(
    js: &jetstream::Context,
    spec: &SubscriptionSpec,
) -> Result<PullConsumer, BusError> {
    let stream = js
        .get_stream(spec.stream)
        .await
        .map_err(|e| BusError::Stream(format!("get stream {}: {e}", spec.stream)))?;

    stream
        .get_or_create_consumer(
            spec.group,
            pull::Config {
                durable_name: Some(spec.group.to_string()),
                filter_subject: spec.subject.to_string(),
                ack_policy: AckPolicy::Explicit,
                ack_wait: spec.ack_wait,
                max_deliver: spec.max_deliver,
                ..Default::default()
            },
        )
        .await
        .map_err(|e| BusError::Consumer(format!("consumer {}: {e}", spec.group)))
}

/// Acknowledge successful processing, removing the message from a
/// work-queue stream.
pub async fn ack(msg: &jetstream::Message) {
    if let Err(e) = msg.ack().await {
        warn!(subject = %msg.subject, error = %e, "failed to ack message");
    }
}

/// Negative-acknowledge; the message redelivers after the ack-wait.
pub async fn nak(msg: &jetstream::Message) {
    if let Err(e) = msg.ack_with(AckKind::Nak(None)).await {
        warn!(subject = %msg.subject, error = %e, "failed to nak message");
    }
}
