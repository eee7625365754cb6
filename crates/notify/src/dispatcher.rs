//! Alert event dispatcher.
//!
//! Consumes `alerts.events.>`, fans each event out to the tenant's active
//! webhook channels, and publishes an incident auto-create message for
//! firing transitions. The bus message is acked once channel iteration and
//! fan-out complete, regardless of per-channel outcomes: redelivery is
//! kept for failures before delivery starts, and a slow webhook must not
//! starve the queue.

use std::time::Duration;

use async_nats::jetstream;
use futures::StreamExt;
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{error, info, warn};

use mintlog_alerting::{AlertEvent, EventState};
use mintlog_bus::consumer::{ack, durable_consumer, nak, SubscriptionSpec};
use mintlog_bus::streams::{
    incidents_events_subject, STREAM_ALERTS_EVENTS, SUBJECT_ALERTS_EVENTS_ALL,
};
use mintlog_bus::{BusError, Publisher};
use mintlog_store::channels;

use crate::models::{ChannelType, WebhookConfig};
use crate::webhook::{NotifyError, WebhookSender};

const SUBSCRIPTION: SubscriptionSpec = SubscriptionSpec {
    stream: STREAM_ALERTS_EVENTS,
    subject: SUBJECT_ALERTS_EVENTS_ALL,
    group: "notifier-workers",
    ack_wait: Duration::from_secs(60),
    max_deliver: 3,
};

pub struct Dispatcher {
    pool: PgPool,
    publisher: Publisher,
    webhook: WebhookSender,
}

impl Dispatcher {
    pub fn new(pool: PgPool, publisher: Publisher) -> Result<Self, NotifyError> {
        Ok(Self {
            pool,
            publisher,
            webhook: WebhookSender::new()?,
        })
    }

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
        info!(subject = SUBJECT_ALERTS_EVENTS_ALL, "notification dispatcher started");

        loop {
            tokio::select! {
                maybe = messages.next() => {
                    match maybe {
                        Some(Ok(msg)) => self.handle(msg).await,
                        Some(Err(e)) => warn!(error = %e, "dispatcher message stream error"),
                        None => {
                            warn!("dispatcher message stream closed");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!("notification dispatcher shutting down");
                    break;
                }
            }
        }
        Ok(())
    }

    async fn handle(&self, msg: jetstream::Message) {
        let event: AlertEvent = match serde_json::from_slice(&msg.payload) {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "dispatcher: unmarshal failed");
                nak(&msg).await;
                return;
            }
        };

        let channels = match channels::list_active(&self.pool, event.tenant_id).await {
            Ok(channels) => channels,
            Err(e) => {
                error!(tenant_id = %event.tenant_id, error = %e, "dispatcher: failed to list channels");
                nak(&msg).await;
                return;
            }
        };

        for channel in &channels {
            if !matches!(
                channel.channel_type.parse::<ChannelType>(),
                Ok(ChannelType::Webhook)
            ) {
                warn!(
                    channel_id = %channel.id,
                    channel_type = %channel.channel_type,
                    "dispatcher: skipping unsupported channel type"
                );
                continue;
            }

            let cfg: WebhookConfig = match serde_json::from_value(channel.config.clone()) {
                Ok(cfg) => cfg,
                Err(e) => {
                    error!(channel_id = %channel.id, error = %e, "dispatcher: invalid webhook config");
                    continue;
                }
            };

            match self.webhook.send(&cfg, &event).await {
                Ok(()) => info!(
                    channel_id = %channel.id,
                    rule_id = %event.rule_id,
                    state = %event.state,
                    "webhook delivered"
                ),
                Err(e) => error!(
                    channel_id = %channel.id,
                    error = %e,
                    "dispatcher: webhook delivery failed"
                ),
            }
        }

        // Firing transitions fan out to the incident service; one publish
        // per bus delivery (redelivery may duplicate).
        if event.state == EventState::Firing {
            self.auto_create_incident(&event).await;
        }

        ack(&msg).await;
    }

    async fn auto_create_incident(&self, event: &AlertEvent) {
        let payload = json!({
            "type": "auto_create",
            "tenant_id": event.tenant_id,
            "title": format!("Alert: {}", event.rule_name),
            "severity": "high",
            "alert_rule_id": event.rule_id,
        });

        let subject = incidents_events_subject(&event.tenant_id.to_string());
        if let Err(e) = self.publisher.publish(subject, &payload).await {
            error!(
                rule_id = %event.rule_id,
                error = %e,
                "dispatcher: failed to publish incident event"
            );
        }
    }
}
