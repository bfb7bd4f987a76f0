//! Per-page indexing: embed once, assign a contiguous id block, upsert

use crate::extract::ExtractedContent;
use crate::index::store::{QueryMatch, RecordMetadata, UpsertBatch, VectorStore};
use crate::index::{Embedder, IndexError, RecordIds};
use std::sync::Arc;

/// Sends one page's paragraphs through the embedder into the vector store
#[derive(Clone)]
pub struct IndexingPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl IndexingPipeline {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// The store records are written to
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Indexes every paragraph of one page
    ///
    /// The embedder is called once for the whole page, unless the store
    /// computes embeddings itself. Records get the ids `ids.block(n)` and the
    /// counter is only advanced after the upsert succeeded, so a failure
    /// anywhere leaves `ids` unchanged.
    ///
    /// # Returns
    ///
    /// The number of records written; zero for a page without paragraphs.
    pub async fn index(
        &self,
        ids: &mut RecordIds,
        url: &str,
        content: &ExtractedContent,
    ) -> Result<usize, IndexError> {
        let count = content.paragraphs.len();
        if count == 0 {
            return Ok(0);
        }
        let record_ids = ids.block(count)?;

        let embeddings = if self.store.computes_embeddings() {
            None
        } else {
            let vectors = self.embedder.embed(&content.paragraphs).await?;
            if vectors.len() != count {
                return Err(IndexError::LengthMismatch {
                    expected: count,
                    actual: vectors.len(),
                });
            }
            Some(vectors)
        };

        let metadata = RecordMetadata {
            url: url.to_string(),
            title: content.title.clone(),
            publishing_date: content.publishing_date,
        };

        let batch = UpsertBatch {
            ids: record_ids,
            documents: content.paragraphs.clone(),
            embeddings,
            metadatas: vec![metadata; count],
        };
        self.store.upsert(batch).await?;

        ids.commit(count)?;
        Ok(count)
    }

    /// Embeds `text` and returns the `k` closest stored records
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<QueryMatch>, IndexError> {
        let vectors = self.embedder.embed(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(IndexError::LengthMismatch {
                expected: 1,
                actual: vectors.len(),
            });
        }
        Ok(self.store.query(&vectors[0], k).await?)
    }
}
