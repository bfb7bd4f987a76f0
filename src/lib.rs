//! Blogscout: a blog crawler that feeds a vector index
//!
//! This crate walks a blog starting from a sitemap or a seed page, extracts
//! title, publication date and paragraph chunks from every article, and pushes
//! the chunks through an embedding step into a vector store for semantic search.

pub mod config;
pub mod crawler;
pub mod document;
pub mod extract;
pub mod index;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Blogscout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Indexing error: {0}")]
    Index(#[from] index::IndexError),

    #[error("Vector store error: {0}")]
    Store(#[from] index::StoreError),

    #[error("Embedding error: {0}")]
    Embed(#[from] index::EmbedError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

/// Result type alias for Blogscout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlSession, Frontier, RunOptions};
pub use extract::ExtractedContent;
pub use index::{IndexingPipeline, RecordIds};
pub use output::CrawlSummary;
pub use url::{slug_of, LinkFilter};
