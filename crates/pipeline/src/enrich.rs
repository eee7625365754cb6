//! Enrichment stage.

use mintlog_core::LogEvent;

/// Stable, dependency-free extension point for enrichment (geo lookup,
/// deploy metadata, ...). Currently passes events through unchanged.
pub fn enrich(_event: &mut LogEvent) {}
