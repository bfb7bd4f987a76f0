//! Vector store collaborator interface

use crate::index::StoreError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Metadata shared by every record of one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub url: String,
    pub title: String,
    /// Serialized as `YYYY-MM-DD`, or `null` when the page had no date
    pub publishing_date: Option<NaiveDate>,
}

/// Index-aligned arrays for one upsert call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsertBatch {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    /// `None` when the store computes embeddings itself
    pub embeddings: Option<Vec<Vec<f32>>>,
    pub metadatas: Vec<RecordMetadata>,
}

impl UpsertBatch {
    /// Number of records in the batch
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if the batch holds no records
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Checks that all arrays have the same length
    pub fn validate(&self) -> Result<(), StoreError> {
        let expected = self.ids.len();
        let mut lengths = vec![
            ("documents", self.documents.len()),
            ("metadatas", self.metadatas.len()),
        ];
        if let Some(embeddings) = &self.embeddings {
            lengths.push(("embeddings", embeddings.len()));
        }

        for (name, len) in lengths {
            if len != expected {
                return Err(StoreError::Shape(format!(
                    "{} ids but {} {}",
                    expected, len, name
                )));
            }
        }
        Ok(())
    }
}

/// One ranked query result
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub id: String,
    pub document: String,
    pub metadata: RecordMetadata,
    /// Cosine distance, smaller is closer
    pub distance: f32,
}

/// External vector store
///
/// Upserts are idempotent by id: writing an existing id replaces the record.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts or replaces every record of `batch`
    async fn upsert(&self, batch: UpsertBatch) -> Result<(), StoreError>;

    /// Returns the `k` records closest to `embedding`, closest first
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<QueryMatch>, StoreError>;

    /// Whether `upsert` accepts batches without embeddings
    fn computes_embeddings(&self) -> bool {
        false
    }

    /// Highest numeric record id already stored, if the store can tell
    async fn max_record_id(&self) -> Result<Option<u64>, StoreError> {
        Ok(None)
    }
}
