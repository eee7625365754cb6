use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub postgres: PostgresConfig,
    pub nats: NatsConfig,
    pub opensearch: OpenSearchConfig,
    pub redis: RedisConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            postgres: PostgresConfig::from_env(),
            nats: NatsConfig::from_env(),
            opensearch: OpenSearchConfig::from_env(),
            redis: RedisConfig::from_env(),
            http: HttpConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  postgres:    host={}, db={}",
            self.postgres.host,
            self.postgres.database
        );
        tracing::info!("  nats:        url={}", self.nats.url);
        tracing::info!("  opensearch:  url={}", self.opensearch.url);
        tracing::info!("  redis:       addr={}", self.redis.addr);
        tracing::info!(
            "  http:        ingest={}, api={}",
            self.http.ingest_addr,
            self.http.api_addr
        );
    }
}

// ── PostgreSQL ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

impl PostgresConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("POSTGRES_HOST", "localhost"),
            port: env_u16("POSTGRES_PORT", 5432),
            user: env_or("POSTGRES_USER", "mintlog"),
            password: env_or("POSTGRES_PASSWORD", "mintlog"),
            database: env_or("POSTGRES_DB", "mintlog"),
            max_connections: env_u32("POSTGRES_MAX_CONNECTIONS", 10),
        }
    }

    pub fn dsn(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode=disable",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

// ── NATS ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    pub url: String,
}

impl NatsConfig {
    fn from_env() -> Self {
        Self {
            url: env_or("NATS_URL", "nats://localhost:4222"),
        }
    }
}

// ── OpenSearch ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSearchConfig {
    pub url: String,
    pub user: String,
    pub password: String,
}

impl OpenSearchConfig {
    fn from_env() -> Self {
        Self {
            url: env_or("OPENSEARCH_URL", "http://localhost:9200"),
            user: env_or("OPENSEARCH_USER", "admin"),
            password: env_or("OPENSEARCH_PASSWORD", "M1ntl0g!Pass"),
        }
    }
}

// ── Redis ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub addr: String,
    pub password: String,
    pub db: i64,
}

impl RedisConfig {
    fn from_env() -> Self {
        Self {
            addr: env_or("REDIS_ADDR", "localhost:6379"),
            password: env_or("REDIS_PASSWORD", ""),
            db: env_i64("REDIS_DB", 0),
        }
    }

    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}/{}", self.addr, self.db)
        } else {
            format!("redis://:{}@{}/{}", self.password, self.addr, self.db)
        }
    }
}

// ── HTTP listeners ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub ingest_addr: String,
    pub api_addr: String,
}

impl HttpConfig {
    fn from_env() -> Self {
        Self {
            ingest_addr: env_or("INGEST_ADDR", "0.0.0.0:8080"),
            api_addr: env_or("API_ADDR", "0.0.0.0:8081"),
        }
    }
}
