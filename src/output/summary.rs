//! End-of-run summary and query result printing

use crate::index::QueryMatch;
use chrono::{DateTime, Utc};
use std::fmt;

/// Why the crawl loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The cursor reached the end of the queue
    Exhausted,
    /// Continuation was disabled and the seed was processed
    SinglePage,
    /// `max-pages` fetches were made
    PageLimit,
    /// A stop was requested (Ctrl-C)
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Exhausted => "frontier exhausted",
            Self::SinglePage => "single-page mode",
            Self::PageLimit => "page limit reached",
            Self::Interrupted => "interrupted",
        };
        f.write_str(text)
    }
}

/// Counters for one crawl run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stop_reason: StopReason,

    /// Pages fetched, parsed and marked visited
    pub pages_visited: u64,
    /// Pages whose fetch failed
    pub pages_failed: u64,
    /// Visited pages that produced at least one paragraph
    pub pages_with_content: u64,
    /// Records written to the vector store
    pub records_indexed: u64,
    /// Pages whose indexing was abandoned
    pub pages_index_failed: u64,
    /// Entries still queued when the loop stopped
    pub pages_pending: u64,
    /// The record id the next run would start from when resuming
    pub next_record_id: u64,
}

impl CrawlSummary {
    /// Starts a summary clocked at `started_at` with all counters at zero
    pub fn started(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            stop_reason: StopReason::Exhausted,
            pages_visited: 0,
            pages_failed: 0,
            pages_with_content: 0,
            records_indexed: 0,
            pages_index_failed: 0,
            pages_pending: 0,
            next_record_id: 0,
        }
    }

    /// Run length in whole seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Pages handed out by the frontier, whatever happened to them
    pub fn pages_attempted(&self) -> u64 {
        self.pages_visited + self.pages_failed
    }
}

/// Prints the summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Run:");
    println!("  Started:  {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  Duration: {}s", summary.duration_seconds());
    println!("  Stopped:  {}", summary.stop_reason);
    println!();

    println!("Pages:");
    println!("  Visited:       {}", summary.pages_visited);
    println!("  With content:  {}", summary.pages_with_content);
    println!("  Fetch failed:  {}", summary.pages_failed);
    println!("  Still queued:  {}", summary.pages_pending);
    println!();

    println!("Index:");
    println!("  Records indexed:       {}", summary.records_indexed);
    println!("  Pages failed to index: {}", summary.pages_index_failed);
    println!("  Next record id:        {}", summary.next_record_id);
}

/// Prints ranked query results to stdout
pub fn print_query_results(query: &str, matches: &[QueryMatch]) {
    println!("=== Results for \"{}\" ===\n", query);

    if matches.is_empty() {
        println!("No matching records.");
        return;
    }

    for (rank, found) in matches.iter().enumerate() {
        let date = found
            .metadata
            .publishing_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "undated".to_string());
        println!(
            "{}. [{}] {} ({}, distance {:.4})",
            rank + 1,
            found.id,
            found.metadata.title,
            date,
            found.distance
        );
        println!("   {}", found.metadata.url);
        println!("   {}", preview(&found.document, 160));
        println!();
    }
}

/// First `max_chars` characters of `text`, with an ellipsis if cut
fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
