//! Search store integration: a thin OpenSearch REST client, per-tenant
//! date-partitioned indices, the bulk indexer daemon, and the query DSL
//! builders used by the API surface and the alert evaluator.

pub mod batcher;
pub mod client;
pub mod error;
pub mod indexer;
pub mod indices;
pub mod query;
pub mod searcher;

pub use client::OpenSearchClient;
pub use error::SearchError;
pub use indexer::BulkIndexer;
pub use indices::index_name;
pub use searcher::{Searcher, SearchResult};
