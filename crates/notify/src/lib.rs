//! Notification delivery: webhook channels with HMAC-signed payloads and
//! a bounded retry ladder, fed by the alert event dispatcher.

pub mod dispatcher;
pub mod models;
pub mod webhook;

pub use dispatcher::Dispatcher;
pub use models::{ChannelType, WebhookConfig};
pub use webhook::{NotifyError, WebhookSender};
