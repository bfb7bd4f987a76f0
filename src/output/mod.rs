//! Output module for run summaries and query results
//!
//! Everything here writes to stdout; diagnostics go through `tracing`.

mod summary;

pub use summary::{print_query_results, print_summary, CrawlSummary, StopReason};
