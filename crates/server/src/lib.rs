//! HTTP surface: the `apid` control-plane/search API and the `ingestd`
//! log intake endpoint, sharing auth, rate-limit, and error plumbing.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::{api_router, ingest_router};
pub use state::AppState;
