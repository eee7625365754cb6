//! JSON value cache on Redis.
//!
//! Used for the API-key → tenant lookup (`apikey:<hash>`, 5 minute TTL).
//! The raw key is never cached, only its hash appears in the key name.

use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Open a multiplexed async connection; fails fast if Redis is unreachable.
pub async fn connect(url: &str) -> Result<MultiplexedConnection, StoreError> {
    let client = redis::Client::open(url).map_err(StoreError::Redis)?;
    let conn = client.get_multiplexed_async_connection().await?;
    Ok(conn)
}

#[derive(Clone)]
pub struct Cache {
    conn: MultiplexedConnection,
    ttl: Duration,
}

impl Cache {
    pub fn new(conn: MultiplexedConnection, ttl: Duration) -> Self {
        Self { conn, ttl }
    }

    /// Fetch and deserialize a cached value; `None` on miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Store a value with the cache TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let data = serde_json::to_string(value)?;
        let mut conn = self.conn.clone();
        let () = conn.set_ex(key, data, self.ttl.as_secs()).await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let () = conn.del(key).await?;
        Ok(())
    }
}
