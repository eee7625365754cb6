//! Control-plane storage: Postgres for tenants, keys, rules, state,
//! channels, and incidents; Redis for the API-key cache and the per-tenant
//! rate limiter.
//!
//! Every query from the API boundary carries the caller's tenant id in the
//! predicate; lookups that miss return `None` rather than an error.

pub mod alert_rules;
pub mod alert_state;
pub mod api_keys;
pub mod cache;
pub mod channels;
pub mod error;
pub mod incidents;
pub mod postgres;
pub mod ratelimit;
pub mod tenants;

pub use cache::Cache;
pub use error::StoreError;
pub use postgres::init_pool;
pub use ratelimit::RateLimiter;
