use serde::Deserialize;

/// Main configuration structure for Blogscout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub site: SiteConfig,
    #[serde(default)]
    pub segmenter: SegmenterConfig,
    /// Embedding provider; required only when persisting
    #[serde(default)]
    pub embedding: Option<EmbeddingConfig>,
    /// Vector store; required only when persisting
    #[serde(default)]
    pub store: Option<StoreConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Sitemap or page URL the crawl starts from
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on fetched pages, 0 means unlimited
    #[serde(rename = "max-pages", default)]
    pub max_pages: usize,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Target site description: which links are articles and which are not
///
/// Everything here is data so the same pipeline can be pointed at another
/// blog by swapping the prefix and the deny-lists.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Absolute URL prefix every article link must start with
    #[serde(rename = "blog-prefix")]
    pub blog_prefix: String,

    /// Substrings that disqualify a candidate link
    #[serde(rename = "blocked-fragments", default)]
    pub blocked_fragments: Vec<String>,

    /// Exact URLs of non-article pages (home, contact, careers...)
    #[serde(rename = "excluded-pages", default)]
    pub excluded_pages: Vec<String>,

    /// Class on the `div` that carries the publication date
    #[serde(rename = "date-marker-class", default = "default_date_marker")]
    pub date_marker_class: String,
}

/// Paragraph grouping parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SegmenterConfig {
    /// Chunks must be strictly longer than this many characters
    #[serde(rename = "min-chunk-chars", default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,

    /// Number of `p`/`ul` siblings that closes a chunk
    #[serde(rename = "siblings-per-chunk", default = "default_siblings_per_chunk")]
    pub siblings_per_chunk: usize,

    /// Chunks containing this substring are dropped
    #[serde(rename = "excluded-substring", default = "default_excluded_substring")]
    pub excluded_substring: String,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_chunk_chars: default_min_chunk_chars(),
            siblings_per_chunk: default_siblings_per_chunk(),
            excluded_substring: default_excluded_substring(),
        }
    }
}

/// OpenAI-compatible embedding endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL; `/embeddings` is appended
    pub endpoint: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Requested vector size, when the model supports it
    #[serde(default)]
    pub dimensions: Option<usize>,

    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: usize,
}

/// Vector store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Logical collection name, records of different collections never mix
    #[serde(default = "default_collection")]
    pub collection: String,

    /// First record id handed out in a run
    #[serde(rename = "first-record-id", default = "default_first_record_id")]
    pub first_record_id: u64,

    /// Continue numbering after the highest id already in the store
    #[serde(rename = "resume-record-ids", default)]
    pub resume_record_ids: bool,

    /// Let the store embed documents itself during upsert
    #[serde(rename = "store-side-embeddings", default)]
    pub store_side_embeddings: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_date_marker() -> String {
    "publication-info".to_string()
}

fn default_min_chunk_chars() -> usize {
    80
}

fn default_siblings_per_chunk() -> usize {
    3
}

fn default_excluded_substring() -> String {
    "https://".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_retries() -> usize {
    3
}

fn default_collection() -> String {
    "blog".to_string()
}

fn default_first_record_id() -> u64 {
    1
}
