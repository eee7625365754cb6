//! Shared application state for the HTTP daemons.

use sqlx::PgPool;

use mintlog_bus::Publisher;
use mintlog_search::Searcher;
use mintlog_store::RateLimiter;

use crate::auth::KeyResolver;

pub struct AppState {
    pub pool: PgPool,
    pub publisher: Publisher,
    pub searcher: Searcher,
    pub resolver: KeyResolver,
    pub limiter: RateLimiter,
    pub incidents: mintlog_incident::Service,
}
