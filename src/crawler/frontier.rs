//! Crawl frontier: visited set, append-only queue and traversal cursor
//!
//! URLs are identified by their slug (see [`crate::url::shares_slug`]), so a
//! page reachable under a locale prefix or with and without a trailing slash
//! is only fetched once.

use crate::url::shares_slug;

/// Visited pages plus the queue of pages still to process
///
/// The queue is never reordered or shrunk. The cursor only moves forward, so
/// every entry is handed out by [`Frontier::next`] at most once and the
/// traversal ends once the cursor reaches the end of the queue.
#[derive(Debug, Default, Clone)]
pub struct Frontier {
    visited: Vec<String>,
    queue: Vec<String>,
    cursor: usize,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier whose first entry is `seed`
    pub fn with_seed(seed: impl Into<String>) -> Self {
        let mut frontier = Self::new();
        frontier.queue.push(seed.into());
        frontier
    }

    /// Returns true if a page with the same slug was already processed
    pub fn visited(&self, url: &str) -> bool {
        self.visited.iter().any(|seen| shares_slug(url, seen))
    }

    /// Records a processed page
    pub fn mark_visited(&mut self, url: &str) {
        if !self.visited(url) {
            self.visited.push(url.to_string());
        }
    }

    /// Returns true if a page with the same slug is already queued
    pub fn queued(&self, url: &str) -> bool {
        self.queue.iter().any(|queued| shares_slug(url, queued))
    }

    /// Appends `url` unless its slug is already visited or queued
    ///
    /// # Returns
    ///
    /// `true` if the URL was newly added
    pub fn enqueue(&mut self, url: &str) -> bool {
        if self.queued(url) || self.visited(url) {
            tracing::trace!("Skipping already known URL: {}", url);
            return false;
        }
        self.queue.push(url.to_string());
        true
    }

    /// Returns true while the cursor has not reached the end of the queue
    pub fn has_next(&self) -> bool {
        self.cursor < self.queue.len()
    }

    /// Hands out the entry under the cursor and advances it
    pub fn next(&mut self) -> Option<String> {
        let url = self.queue.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(url)
    }

    /// Number of processed pages
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of entries ever queued, including handed-out ones
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of entries not yet handed out
    pub fn pending(&self) -> usize {
        self.queue.len() - self.cursor
    }

    /// Processed pages in processing order
    pub fn visited_urls(&self) -> &[String] {
        &self.visited
    }

    /// Every queued entry in discovery order
    pub fn queued_urls(&self) -> &[String] {
        &self.queue
    }
}
