//! Search store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("bus error: {0}")]
    Bus(#[from] mintlog_bus::BusError),
}
