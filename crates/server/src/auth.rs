//! API key resolution.
//!
//! Raw keys arrive in `X-API-Key`, get hashed with SHA-256, and resolve to
//! a tenant through a Redis cache (`apikey:<hash>`, 5 minute TTL) with
//! fall-through to Postgres. The raw key is never persisted or cached.

use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::debug;

use mintlog_core::TenantInfo;
use mintlog_store::{api_keys, Cache, StoreError};

/// Hex SHA-256 of a raw key, the only form that touches storage.
pub fn hash_key(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Display prefix: the first 8 characters of the raw key.
pub fn key_prefix(raw: &str) -> &str {
    if raw.len() < 8 {
        raw
    } else {
        &raw[..8]
    }
}

#[derive(Clone)]
pub struct KeyResolver {
    pool: PgPool,
    cache: Cache,
}

impl KeyResolver {
    pub fn new(pool: PgPool, cache: Cache) -> Self {
        Self { pool, cache }
    }

    /// Resolve a raw key to its tenant. `Ok(None)` means unknown, inactive,
    /// or expired. Cache failures fall through to Postgres.
    pub async fn resolve(&self, raw_key: &str) -> Result<Option<TenantInfo>, StoreError> {
        let hash = hash_key(raw_key);
        let cache_key = format!("apikey:{hash}");

        match self.cache.get::<TenantInfo>(&cache_key).await {
            Ok(Some(info)) => return Ok(Some(info)),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "api key cache read failed"),
        }

        let Some(row) = api_keys::get_by_hash(&self.pool, &hash).await? else {
            return Ok(None);
        };

        let info = TenantInfo {
            id: row.tenant_id,
            name: row.tenant_name,
            plan: row.tenant_plan,
            retention_days: row.retention_days,
            scopes: row.scopes,
            rate_limit: row.rate_limit,
        };

        if let Err(e) = self.cache.set(&cache_key, &info).await {
            debug!(error = %e, "api key cache write failed");
        }

        Ok(Some(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256() {
        // sha256("mlk_test")
        let hash = hash_key("mlk_test");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash_key("mlk_test"), hash);
        assert_ne!(hash_key("mlk_other"), hash);
    }

    #[test]
    fn known_digest() {
        assert_eq!(
            hash_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn prefix_is_first_eight_chars() {
        assert_eq!(key_prefix("mlk_0123456789"), "mlk_0123");
        assert_eq!(key_prefix("short"), "short");
    }
}
