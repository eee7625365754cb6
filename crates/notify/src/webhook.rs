//! HTTP webhook delivery.
//!
//! Payloads go out as JSON POSTs with optional channel headers and an
//! HMAC-SHA256 signature header when the channel has a shared secret.
//! Delivery retries on a fixed ladder; an attempt succeeds only on a 2xx
//! response.

use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use sha2::Sha256;
use tracing::warn;

use crate::models::WebhookConfig;

/// Delay before each retry; four attempts total.
const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(5),
    Duration::from_secs(30),
];
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const SIGNATURE_HEADER: &str = "X-Mintlog-Signature";
const USER_AGENT_VALUE: &str = "mintlog-notifier/1.0";

/// Errors that can occur during webhook delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned status {0}")]
    Status(u16),

    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid HMAC key")]
    Key,
}

/// Hex HMAC-SHA256 of the request body under the channel secret.
pub fn sign(body: &[u8], secret: &str) -> Result<String, NotifyError> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| NotifyError::Key)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Value for the signature header.
pub fn signature_header_value(body: &[u8], secret: &str) -> Result<String, NotifyError> {
    Ok(format!("sha256={}", sign(body, secret)?))
}

pub struct WebhookSender {
    client: reqwest::Client,
}

impl WebhookSender {
    pub fn new() -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Deliver `payload` to the channel, retrying on transport errors and
    /// non-2xx responses. Returns the last error after the ladder is
    /// exhausted.
    pub async fn send<T: Serialize>(
        &self,
        cfg: &WebhookConfig,
        payload: &T,
    ) -> Result<(), NotifyError> {
        let body = serde_json::to_vec(payload)?;

        let mut last_err = None;
        for attempt in 0..=RETRY_DELAYS.len() {
            if attempt > 0 {
                tokio::time::sleep(RETRY_DELAYS[attempt - 1]).await;
            }

            match self.attempt(cfg, &body).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        url = %cfg.url,
                        attempt = attempt + 1,
                        error = %e,
                        "webhook delivery failed"
                    );
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or(NotifyError::Status(0)))
    }

    async fn attempt(&self, cfg: &WebhookConfig, body: &[u8]) -> Result<(), NotifyError> {
        let mut request = self
            .client
            .post(&cfg.url)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, USER_AGENT_VALUE)
            .body(body.to_vec());

        for (key, value) in &cfg.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        if !cfg.secret.is_empty() {
            request = request.header(SIGNATURE_HEADER, signature_header_value(body, &cfg.secret)?);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_matches_known_vector() {
        // RFC 2202-style vector for HMAC-SHA256.
        let digest = sign(b"The quick brown fox jumps over the lazy dog", "key").unwrap();
        assert_eq!(
            digest,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn signature_header_is_prefixed() {
        let value = signature_header_value(b"{}", "s3cr3t").unwrap();
        assert!(value.starts_with("sha256="));
        assert_eq!(value.len(), "sha256=".len() + 64);
    }

    #[test]
    fn same_body_and_secret_sign_identically() {
        let a = sign(b"payload", "secret").unwrap();
        let b = sign(b"payload", "secret").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, sign(b"payload", "other").unwrap());
        assert_ne!(a, sign(b"different", "secret").unwrap());
    }

    #[test]
    fn ladder_is_one_initial_plus_three_retries() {
        assert_eq!(RETRY_DELAYS.len(), 3);
        assert_eq!(RETRY_DELAYS[0], Duration::from_secs(1));
        assert_eq!(RETRY_DELAYS[1], Duration::from_secs(5));
        assert_eq!(RETRY_DELAYS[2], Duration::from_secs(30));
    }
}
