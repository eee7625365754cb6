//! Per-tenant sliding-window rate limiter on a Redis sorted set.
//!
//! Each request adds a member scored by its arrival time; members older
//! than the window are trimmed before counting. The count *before* the
//! current request decides admission, so a limit of N admits exactly N
//! requests per window.

use std::time::Duration;

use chrono::Utc;
use redis::aio::MultiplexedConnection;

use crate::error::StoreError;

#[derive(Clone)]
pub struct RateLimiter {
    conn: MultiplexedConnection,
    window: Duration,
}

impl RateLimiter {
    pub fn new(conn: MultiplexedConnection, window: Duration) -> Self {
        Self { conn, window }
    }

    /// Returns `(allowed, remaining)` for the tenant under the given
    /// per-window limit.
    pub async fn allow(&self, tenant_id: &str, limit: i64) -> Result<(bool, i64), StoreError> {
        let key = format!("ratelimit:{tenant_id}");
        let now = Utc::now();
        let now_ms = now.timestamp_millis();
        let window_start_ms = now_ms - self.window.as_millis() as i64;
        let member = now.timestamp_micros();

        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.cmd("ZREMRANGEBYSCORE")
            .arg(&key)
            .arg(0)
            .arg(window_start_ms)
            .ignore()
            .zcard(&key)
            .zadd(&key, member, now_ms)
            .ignore()
            .expire(&key, self.window.as_secs() as i64 + 1)
            .ignore();

        let (count,): (i64,) = pipe.query_async(&mut conn).await?;

        let remaining = (limit - count - 1).max(0);
        Ok((count < limit, remaining))
    }
}
