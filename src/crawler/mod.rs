//! Crawler module for page fetching and traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching
//! - The slug-keyed frontier
//! - Link extraction for HTML pages and XML sitemaps
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod links;

pub use coordinator::{Coordinator, CrawlSession, RunOptions};
pub use fetcher::{build_http_client, fetch_url, user_agent_string, FetchResult};
pub use frontier::Frontier;
pub use links::extract_links;
