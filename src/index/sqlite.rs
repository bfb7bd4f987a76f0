//! SQLite vector store implementation
//!
//! Records live in one table keyed by `(collection, id)`. Embeddings are
//! stored as little-endian `f32` blobs and metadata as JSON. Queries are an
//! exact scan ranked by cosine distance.

use crate::index::schema::{initialize_schema, COSINE};
use crate::index::store::{QueryMatch, RecordMetadata, UpsertBatch, VectorStore};
use crate::index::{Embedder, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// SQLite-backed vector store
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    collection: String,
    embedder: Option<Arc<dyn Embedder>>,
}

impl SqliteVectorStore {
    /// Opens or creates the database at `path` and the named collection
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `collection` - Collection this store reads and writes
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteVectorStore)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn open(path: &Path, collection: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Self::from_connection(conn, collection)
    }

    /// Creates an in-memory database
    pub fn open_in_memory(collection: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::from_connection(conn, collection)
    }

    fn from_connection(conn: Connection, collection: &str) -> Result<Self, StoreError> {
        initialize_schema(&conn)?;
        conn.execute(
            "INSERT OR IGNORE INTO collections (name, distance, created_at) VALUES (?1, ?2, ?3)",
            params![collection, COSINE, Utc::now().to_rfc3339()],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
            embedder: None,
        })
    }

    /// Makes the store embed documents itself when a batch has no embeddings
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Number of records in this store's collection
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn write_batch(
        &self,
        batch: &UpsertBatch,
        embeddings: Option<&[Vec<f32>]>,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO records (collection, id, document, embedding, metadata, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(collection, id) DO UPDATE SET
                    document = excluded.document,
                    embedding = excluded.embedding,
                    metadata = excluded.metadata,
                    updated_at = excluded.updated_at",
            )?;

            for (i, id) in batch.ids.iter().enumerate() {
                let blob = embeddings.map(|vectors| encode_embedding(&vectors[i]));
                let metadata = serde_json::to_string(&batch.metadatas[i])?;
                stmt.execute(params![
                    self.collection,
                    id,
                    batch.documents[i],
                    blob,
                    metadata,
                    now
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn scan(&self, embedding: &[f32], k: usize) -> Result<Vec<QueryMatch>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT id, document, embedding, metadata FROM records
             WHERE collection = ?1 AND embedding IS NOT NULL",
        )?;

        let rows = stmt.query_map(params![self.collection], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Vec<u8>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut matches = Vec::new();
        for row in rows {
            let (id, document, blob, metadata) = row?;
            let stored = decode_embedding(&blob);
            if stored.len() != embedding.len() {
                tracing::trace!("Skipping record {} with dimension {}", id, stored.len());
                continue;
            }
            let metadata: RecordMetadata = serde_json::from_str(&metadata)?;
            matches.push(QueryMatch {
                id,
                document,
                metadata,
                distance: cosine_distance(embedding, &stored),
            });
        }

        matches.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(k);
        Ok(matches)
    }

    fn highest_numeric_id(&self) -> Result<Option<u64>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut stmt = conn.prepare("SELECT id FROM records WHERE collection = ?1")?;
        let ids = stmt.query_map(params![self.collection], |row| row.get::<_, String>(0))?;

        let mut max = None;
        for id in ids {
            if let Ok(value) = id?.parse::<u64>() {
                max = Some(max.map_or(value, |current: u64| current.max(value)));
            }
        }
        Ok(max)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(&self, batch: UpsertBatch) -> Result<(), StoreError> {
        batch.validate()?;
        if batch.is_empty() {
            return Ok(());
        }

        let computed;
        let embeddings = match (&batch.embeddings, &self.embedder) {
            (Some(embeddings), _) => Some(embeddings.as_slice()),
            (None, Some(embedder)) => {
                computed = embedder.embed(&batch.documents).await?;
                if computed.len() != batch.len() {
                    return Err(StoreError::Shape(format!(
                        "{} ids but {} computed embeddings",
                        batch.len(),
                        computed.len()
                    )));
                }
                Some(computed.as_slice())
            }
            (None, None) => None,
        };

        self.write_batch(&batch, embeddings)?;
        tracing::trace!(
            "Upserted {} records into collection {}",
            batch.len(),
            self.collection
        );
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<QueryMatch>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.scan(embedding, k)
    }

    fn computes_embeddings(&self) -> bool {
        self.embedder.is_some()
    }

    async fn max_record_id(&self) -> Result<Option<u64>, StoreError> {
        self.highest_numeric_id()
    }
}

fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|value| value.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect()
}

/// `1 - cos(a, b)`; a zero vector is at distance 1 from everything
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}
