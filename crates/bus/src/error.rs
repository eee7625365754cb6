//! Bus error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("consumer error: {0}")]
    Consumer(String),

    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("publish error: {0}")]
    Publish(String),
}
