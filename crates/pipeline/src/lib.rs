//! Log transformation pipeline: parse embedded JSON, normalize level and
//! timestamp, enrich, and re-publish for indexing.

pub mod enrich;
pub mod normalizer;
pub mod parser;
pub mod worker;

pub use enrich::enrich;
pub use normalizer::{normalize, normalize_level, normalize_timestamp};
pub use parser::parse_json;
pub use worker::Worker;

use mintlog_core::LogEvent;

/// The full transform chain, applied in order.
pub fn transform(event: &mut LogEvent) {
    parse_json(event);
    normalize(event);
    enrich(event);
}
