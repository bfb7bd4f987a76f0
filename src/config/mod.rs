//! Configuration module for Blogscout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use blogscout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("blogscout.toml")).unwrap();
//! println!("Crawl starts at: {}", config.crawler.seed_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, EmbeddingConfig, SegmenterConfig, SiteConfig, StoreConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, resolve_api_key};
pub use validation::{require_persistence, validate};
