//! Channel configuration models.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported channel kinds. Stored as a lowercase string; parsers reject
/// anything unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Webhook,
}

impl ChannelType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelType::Webhook => "webhook",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown channel type: {0}")]
pub struct UnknownChannelType(pub String);

impl FromStr for ChannelType {
    type Err = UnknownChannelType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "webhook" => Ok(ChannelType::Webhook),
            other => Err(UnknownChannelType(other.to_string())),
        }
    }
}

/// Channel-specific config for `webhook` channels, stored as JSON on the
/// channel row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Shared secret for the HMAC signature header; empty disables signing.
    #[serde(default)]
    pub secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_type_rejects_unknown_values() {
        assert_eq!("webhook".parse::<ChannelType>().unwrap(), ChannelType::Webhook);
        assert!("email".parse::<ChannelType>().is_err());
        assert!(serde_json::from_str::<ChannelType>("\"slack\"").is_err());
    }

    #[test]
    fn webhook_config_defaults() {
        let cfg: WebhookConfig =
            serde_json::from_str(r#"{"url":"https://example.com/hook"}"#).unwrap();
        assert_eq!(cfg.url, "https://example.com/hook");
        assert!(cfg.headers.is_empty());
        assert!(cfg.secret.is_empty());
    }

    #[test]
    fn webhook_config_full() {
        let cfg: WebhookConfig = serde_json::from_str(
            r#"{"url":"https://example.com","headers":{"X-Env":"prod"},"secret":"s3cr3t"}"#,
        )
        .unwrap();
        assert_eq!(cfg.headers["X-Env"], "prod");
        assert_eq!(cfg.secret, "s3cr3t");
    }
}
