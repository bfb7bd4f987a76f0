//! Indexing of extracted article text into a vector store
//!
//! This module contains:
//! - The embedding collaborator ([`Embedder`]) and its HTTP implementation
//! - The vector store collaborator ([`VectorStore`]) and its SQLite implementation
//! - The per-page [`IndexingPipeline`]
//! - The record id counter owned by a crawl session ([`RecordIds`])

mod embedder;
mod pipeline;
mod schema;
mod sqlite;
mod store;

pub use embedder::{Embedder, HttpEmbedder};
pub use pipeline::IndexingPipeline;
pub use sqlite::SqliteVectorStore;
pub use store::{QueryMatch, RecordMetadata, UpsertBatch, VectorStore};

use thiserror::Error;

/// Errors from the embedding collaborator
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("Failed to build embedding client: {0}")]
    Client(String),

    #[error("Embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Embedding endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Embedding endpoint returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

/// Errors from the vector store collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed upsert batch: {0}")]
    Shape(String),

    #[error("Store-side embedding failed: {0}")]
    Embed(#[from] EmbedError),

    #[error("Store connection lock poisoned")]
    LockPoisoned,
}

/// Errors from indexing one page
#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Got {actual} embeddings for {expected} paragraphs")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Record id space exhausted: {count} ids requested after {next}")]
    IdsExhausted { next: u64, count: usize },
}

/// Monotonic record id counter for one crawl run
///
/// Ids are handed out in contiguous blocks, one per paragraph. A block is
/// only committed once the page's upsert succeeded, so a failed page leaves
/// the counter untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordIds {
    next: u64,
}

impl RecordIds {
    /// Starts counting at `first`
    pub fn new(first: u64) -> Self {
        Self { next: first }
    }

    /// Continues after `high_water_mark`, never going below `first`
    pub fn resume_after(high_water_mark: Option<u64>, first: u64) -> Self {
        let next = high_water_mark
            .map(|max| max.saturating_add(1))
            .unwrap_or(first)
            .max(first);
        Self { next }
    }

    /// The id the next record will get
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Ids for the next `count` records, without advancing
    ///
    /// Fails when the block would run past `u64::MAX`.
    pub fn block(&self, count: usize) -> Result<Vec<String>, IndexError> {
        let end = self.end_of_block(count)?;
        Ok((self.next..end).map(|id| id.to_string()).collect())
    }

    /// Advances past a block of `count` ids
    pub fn commit(&mut self, count: usize) -> Result<(), IndexError> {
        self.next = self.end_of_block(count)?;
        Ok(())
    }

    fn end_of_block(&self, count: usize) -> Result<u64, IndexError> {
        u64::try_from(count)
            .ok()
            .and_then(|count| self.next.checked_add(count))
            .ok_or(IndexError::IdsExhausted {
                next: self.next,
                count,
            })
    }
}

impl Default for RecordIds {
    fn default() -> Self {
        Self::new(1)
    }
}
