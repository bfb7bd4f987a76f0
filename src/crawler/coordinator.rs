//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that processes one page at a time:
//! - Taking the next URL from the frontier
//! - Fetching and parsing the page
//! - Extracting title, date and paragraphs
//! - Indexing the paragraphs when a pipeline is attached
//! - Discovering links and queueing the new ones
//!
//! Per-page failures are logged and counted, never propagated.

use crate::config::Config;
use crate::crawler::{build_http_client, extract_links, fetch_url, FetchResult, Frontier};
use crate::document::{parse_document, DocumentKind};
use crate::extract::{extract_content, ExtractedContent};
use crate::index::{IndexingPipeline, RecordIds};
use crate::output::{CrawlSummary, StopReason};
use crate::url::LinkFilter;
use crate::ScoutError;
use chrono::Utc;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Caller choices for one run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Keep following the queue after the seed page; otherwise stop after it
    pub continue_crawl: bool,
}

/// Mutable state of one crawl run
///
/// The frontier (visited set, queue, cursor) and the record id counter live
/// here rather than in globals, so independent runs never share state.
#[derive(Debug, Clone)]
pub struct CrawlSession {
    frontier: Frontier,
    record_ids: RecordIds,
}

impl CrawlSession {
    /// Starts a session whose queue holds only `seed`
    pub fn new(seed: &str, record_ids: RecordIds) -> Self {
        Self {
            frontier: Frontier::with_seed(seed),
            record_ids,
        }
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn record_ids(&self) -> RecordIds {
        self.record_ids
    }

    /// Records `current_url` as processed and queues the unseen `links`
    ///
    /// # Returns
    ///
    /// The number of newly queued URLs
    pub fn discover_links(&mut self, current_url: &str, links: &[String]) -> usize {
        self.frontier.mark_visited(current_url);
        links
            .iter()
            .filter(|link| self.frontier.enqueue(link))
            .count()
    }
}

/// What a fetched page turned into
struct ProcessedPage {
    content: ExtractedContent,
    links: Vec<String>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    client: Client,
    filter: LinkFilter,
    session: CrawlSession,
    pipeline: Option<IndexingPipeline>,
    options: RunOptions,
    stop: Arc<AtomicBool>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration; the seed comes from `[crawler]`
    /// * `options` - Single-page or continued crawl
    /// * `pipeline` - Indexing pipeline, `None` to crawl without persisting
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ScoutError)` - Failed to build the HTTP client
    pub fn new(
        config: Config,
        options: RunOptions,
        pipeline: Option<IndexingPipeline>,
    ) -> Result<Self, ScoutError> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;
        let filter = LinkFilter::from_site(&config.site);
        let first_id = config
            .store
            .as_ref()
            .map(|store| store.first_record_id)
            .unwrap_or(1);
        let session = CrawlSession::new(&config.crawler.seed_url, RecordIds::new(first_id));

        Ok(Self {
            config: Arc::new(config),
            client,
            filter,
            session,
            pipeline,
            options,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Continues record ids after the store's highest id when configured to
    ///
    /// Without `resume-record-ids` or without a pipeline, numbering starts at
    /// `first-record-id` every run.
    pub async fn init_record_ids(&mut self) -> Result<(), ScoutError> {
        let Some(store_config) = self.config.store.as_ref() else {
            return Ok(());
        };
        let Some(pipeline) = self.pipeline.as_ref() else {
            return Ok(());
        };
        if !store_config.resume_record_ids {
            return Ok(());
        }

        let high_water_mark = pipeline.store().max_record_id().await?;
        self.session.record_ids =
            RecordIds::resume_after(high_water_mark, store_config.first_record_id);
        tracing::info!(
            "Resuming record ids at {}",
            self.session.record_ids.peek()
        );
        Ok(())
    }

    /// Flag that stops the loop before its next fetch once set
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn session(&self) -> &CrawlSession {
        &self.session
    }

    /// Runs the main crawl loop
    ///
    /// The loop ends when the cursor reaches the end of the queue, after the
    /// seed in single-page mode, after `max-pages` fetches, or when the stop
    /// flag is set.
    pub async fn run(&mut self) -> CrawlSummary {
        let mut summary = CrawlSummary::started(Utc::now());
        let start_time = Instant::now();
        let max_pages = self.config.crawler.max_pages;
        let mut pages_fetched = 0usize;

        tracing::info!(
            "Starting crawl at {} (indexing {})",
            self.config.crawler.seed_url,
            if self.pipeline.is_some() { "on" } else { "off" }
        );

        let stop_reason = loop {
            if self.stop.load(Ordering::SeqCst) {
                tracing::info!("Stop requested, ending crawl");
                break StopReason::Interrupted;
            }
            if max_pages > 0 && pages_fetched >= max_pages {
                tracing::info!("Reached max-pages limit of {}", max_pages);
                break StopReason::PageLimit;
            }

            let Some(url) = self.session.frontier.next() else {
                tracing::info!("Frontier is empty, crawl complete");
                break StopReason::Exhausted;
            };

            if self.session.frontier.visited(&url) {
                tracing::debug!("Already visited {}, skipping", url);
                continue;
            }

            pages_fetched += 1;
            self.process_url(&url, &mut summary).await;

            if pages_fetched % 10 == 0 {
                let elapsed = start_time.elapsed();
                let rate = pages_fetched as f64 / elapsed.as_secs_f64();
                tracing::info!(
                    "Progress: {} pages fetched, {} records indexed, {} in frontier, {:.2} pages/sec",
                    pages_fetched,
                    summary.records_indexed,
                    self.session.frontier.pending(),
                    rate
                );
            }

            if !self.options.continue_crawl {
                break StopReason::SinglePage;
            }
        };

        summary.finished_at = Utc::now();
        summary.stop_reason = stop_reason;
        summary.pages_pending = self.session.frontier.pending() as u64;
        summary.next_record_id = self.session.record_ids.peek();

        tracing::info!(
            "Crawl finished ({}): {} pages visited, {} records indexed in {:?}",
            stop_reason,
            summary.pages_visited,
            summary.records_indexed,
            start_time.elapsed()
        );

        summary
    }

    /// Processes a single URL
    ///
    /// A failed fetch leaves the URL out of the visited set; the cursor has
    /// already moved past it, so it is not retried in this run.
    async fn process_url(&mut self, url: &str, summary: &mut CrawlSummary) {
        tracing::debug!("Visiting {}", url);

        let page = match fetch_url(&self.client, url).await {
            FetchResult::Success {
                final_url,
                status_code,
                content_type,
                body,
            } => {
                let kind = DocumentKind::detect(&final_url, content_type.as_deref());
                tracing::trace!(
                    "Fetched {} ({}, {:?}, {} bytes)",
                    final_url,
                    status_code,
                    kind,
                    body.len()
                );
                self.process_body(&body, kind, &final_url)
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Skipping {}: HTTP {}", url, status_code);
                summary.pages_failed += 1;
                return;
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Skipping {}: {}", url, error);
                summary.pages_failed += 1;
                return;
            }
        };

        let content = &page.content;
        tracing::debug!(
            "Extracted '{}' ({}) with {} paragraphs",
            content.title,
            content
                .publishing_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "no date".to_string()),
            content.paragraphs.len()
        );

        if !content.is_empty() {
            summary.pages_with_content += 1;
            if let Some(pipeline) = &self.pipeline {
                match pipeline
                    .index(&mut self.session.record_ids, url, content)
                    .await
                {
                    Ok(written) => {
                        summary.records_indexed += written as u64;
                        tracing::debug!("Indexed {} records from {}", written, url);
                    }
                    Err(e) => {
                        summary.pages_index_failed += 1;
                        tracing::error!("Indexing failed for {}: {}", url, e);
                    }
                }
            }
        }

        let added = self.session.discover_links(url, &page.links);
        summary.pages_visited += 1;
        tracing::debug!(
            "Found {} links on {}, {} new",
            page.links.len(),
            url,
            added
        );
    }

    /// Parses a body and runs extraction and link discovery on it
    ///
    /// The parsed tree is dropped before this returns.
    fn process_body(&self, body: &str, kind: DocumentKind, page_url: &str) -> ProcessedPage {
        let document = parse_document(body, kind);
        let content = extract_content(
            document.as_ref(),
            &self.config.site,
            &self.config.segmenter,
        );
        let links = extract_links(document.as_ref(), kind, page_url, &self.filter);
        ProcessedPage { content, links }
    }
}
