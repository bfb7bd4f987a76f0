//! Database schema for the SQLite vector store

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Named collections and the distance they are searched with
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    distance TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- One row per indexed paragraph
CREATE TABLE IF NOT EXISTS records (
    collection TEXT NOT NULL REFERENCES collections(name),
    id TEXT NOT NULL,
    document TEXT NOT NULL,
    embedding BLOB,
    metadata TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection);
"#;

/// Distance metric recorded for new collections
pub const COSINE: &str = "cosine";

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
