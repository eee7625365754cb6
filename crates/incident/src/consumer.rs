//! Incident auto-create consumer.
//!
//! Listens on `incidents.events.>` in its own durable group, distinct
//! from the notifier's; that separation is what breaks the alert-event /
//! incident cycle at the topology level. Messages that are not `auto_create` are
//! acked and ignored.

use std::time::Duration;

use async_nats::jetstream;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use mintlog_bus::consumer::{ack, durable_consumer, nak, SubscriptionSpec};
use mintlog_bus::streams::{STREAM_INCIDENTS_EVENTS, SUBJECT_INCIDENTS_EVENTS_ALL};
use mintlog_bus::BusError;

use crate::service::Service;

const SUBSCRIPTION: SubscriptionSpec = SubscriptionSpec {
    stream: STREAM_INCIDENTS_EVENTS,
    subject: SUBJECT_INCIDENTS_EVENTS_ALL,
    group: "incident-creators",
    ack_wait: Duration::from_secs(30),
    max_deliver: 3,
};

#[derive(Debug, Deserialize)]
struct IncidentEvent {
    #[serde(rename = "type", default)]
    event_type: String,
    tenant_id: Uuid,
    #[serde(default)]
    title: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    alert_rule_id: Option<Uuid>,
}

pub struct AutoCreateConsumer {
    service: Service,
}

impl AutoCreateConsumer {
    pub fn new(service: Service) -> Self {
        Self { service }
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
        info!(subject = SUBJECT_INCIDENTS_EVENTS_ALL, "incident auto-create consumer started");

        loop {
            tokio::select! {
                maybe = messages.next() => {
                    match maybe {
                        Some(Ok(msg)) => self.handle(msg).await,
                        Some(Err(e)) => warn!(error = %e, "incident consumer stream error"),
                        None => {
                            warn!("incident consumer stream closed");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!("incident auto-create consumer shutting down");
                    break;
                }
            }
        }
        Ok(())
    }

    async fn handle(&self, msg: jetstream::Message) {
        let event: IncidentEvent = match serde_json::from_slice(&msg.payload) {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "incident consumer: unmarshal failed");
                nak(&msg).await;
                return;
            }
        };

        if event.event_type != "auto_create" {
            ack(&msg).await;
            return;
        }

        match self
            .service
            .create(
                event.tenant_id,
                &event.title,
                &event.severity,
                event.alert_rule_id,
            )
            .await
        {
            Ok(incident) => {
                info!(
                    tenant_id = %event.tenant_id,
                    incident_id = %incident.id,
                    title = %incident.title,
                    "auto-created incident"
                );
                ack(&msg).await;
            }
            Err(e) => {
                error!(error = %e, "incident consumer: failed to create incident");
                nak(&msg).await;
            }
        }
    }
}
