//! JSON publisher over JetStream.

use async_nats::jetstream;
use serde::Serialize;

use crate::error::BusError;

/// Publishes serializable values to a subject and waits for the stream ack.
#[derive(Clone)]
pub struct Publisher {
    js: jetstream::Context,
}

impl Publisher {
    pub fn new(js: jetstream::Context) -> Self {
        Self { js }
    }

    /// Serialize `value` as JSON and publish it, waiting for the JetStream
    /// acknowledgement so failures surface to the caller.
    pub async fn publish<T: Serialize>(&self, subject: String, value: &T) -> Result<(), BusError> {
        let data = serde_json::to_vec(value).map_err(|e| BusError::Serialize(e.to_string()))?;
        let subject_for_err = subject.clone();
        self.js
            .publish(subject, data.into())
            .await
            .map_err(|e| BusError::Publish(format!("publish {subject_for_err}: {e}")))?
            .await
            .map_err(|e| BusError::Publish(format!("ack {subject_for_err}: {e}")))?;
        Ok(())
    }
}
