//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end: sitemap, article, indexing.

use async_trait::async_trait;
use blogscout::config::{
    Config, CrawlerConfig, EmbeddingConfig, SegmenterConfig, SiteConfig, StoreConfig,
    UserAgentConfig,
};
use blogscout::crawler::{Coordinator, RunOptions};
use blogscout::index::{
    EmbedError, Embedder, HttpEmbedder, IndexingPipeline, QueryMatch, SqliteVectorStore,
    StoreError, UpsertBatch, VectorStore,
};
use blogscout::output::StopReason;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PARAGRAPH_A: &str =
    "Vector databases store embeddings and answer nearest neighbour queries in milliseconds.";
const PARAGRAPH_B: &str =
    "They are the backbone of most retrieval augmented generation systems built today.";
const PARAGRAPH_C: &str =
    "Picking one means trading recall, latency and operational cost against each other.";

/// Creates a test configuration pointed at the mock server's blog
fn create_test_config(base_url: &str, seed_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            seed_url: format!("{}{}", base_url, seed_path),
            request_timeout_secs: 5,
            max_pages: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        site: SiteConfig {
            blog_prefix: format!("{}/blog/", base_url),
            blocked_fragments: vec![
                "category".to_string(),
                "wp-content".to_string(),
                ".png".to_string(),
            ],
            excluded_pages: vec![format!("{}/blog/", base_url)],
            date_marker_class: "publication-info".to_string(),
        },
        segmenter: SegmenterConfig::default(),
        embedding: None,
        store: None,
    }
}

fn sitemap(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{}</loc></url>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

/// An article yielding two chunks: three paragraphs, a heading, two more, a heading
fn article(title: &str, base_url: &str) -> String {
    format!(
        r##"<html><body>
        <h1>{title}</h1>
        <div class="meta publication-info">Posted on Mar 5, 2021 by Jane</div>
        <div class="content">
          <p>{a}</p><p>{b}</p><p>{c}</p>
          <h2>Indexes</h2>
          <p>{c}</p><p>{a}</p>
          <h2>Further reading</h2>
        </div>
        <a href="{base}/blog/category/databases/">Databases</a>
        <a href="{base}/blog/wp-content/uploads/diagram.png">Diagram</a>
        <a href="/blog/">Blog home</a>
        <a href="#comments">Comments</a>
        </body></html>"##,
        title = title,
        a = PARAGRAPH_A,
        b = PARAGRAPH_B,
        c = PARAGRAPH_C,
        base = base_url
    )
}

async fn mount_sitemap(server: &MockServer, at: &str, locs: &[String]) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(sitemap(locs))
                .insert_header("content-type", "application/xml; charset=UTF-8"),
        )
        .mount(server)
        .await;
}

async fn mount_article(server: &MockServer, at: &str, title: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article(title, &server.uri()))
                .insert_header("content-type", "text/html; charset=UTF-8"),
        )
        .mount(server)
        .await;
}

/// Embedder that records its calls and can fail the first N of them
#[derive(Default)]
struct FakeEmbedder {
    calls: Mutex<Vec<Vec<String>>>,
    failures_left: AtomicUsize,
}

impl FakeEmbedder {
    fn failing_first(failures: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.calls.lock().unwrap().push(texts.to_vec());
        if self.failures_left.load(Ordering::SeqCst) > 0 {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
            return Err(EmbedError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(texts
            .iter()
            .map(|t| vec![t.len() as f32, t.split_whitespace().count() as f32])
            .collect())
    }
}

/// Store that keeps every batch it receives
#[derive(Default)]
struct FakeStore {
    batches: Mutex<Vec<UpsertBatch>>,
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn upsert(&self, batch: UpsertBatch) -> Result<(), StoreError> {
        batch.validate()?;
        self.batches.lock().unwrap().push(batch);
        Ok(())
    }

    async fn query(&self, _: &[f32], _: usize) -> Result<Vec<QueryMatch>, StoreError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_sitemap_to_indexed_article() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_sitemap(
        &server,
        "/blog/post-sitemap.xml",
        &[
            format!("{}/blog/first-post/", base_url),
            format!("{}/careers/", base_url),
            "https://elsewhere.example/blog/other-post/".to_string(),
        ],
    )
    .await;
    mount_article(&server, "/blog/first-post/", "Getting started with vectors").await;

    let embedder = Arc::new(FakeEmbedder::default());
    let store = Arc::new(FakeStore::default());
    let pipeline = IndexingPipeline::new(embedder.clone(), store.clone());

    let config = create_test_config(&base_url, "/blog/post-sitemap.xml");
    let options = RunOptions {
        continue_crawl: true,
    };
    let mut coordinator = Coordinator::new(config, options, Some(pipeline)).unwrap();
    let summary = coordinator.run().await;

    // Seed plus exactly one article ever entered the queue
    let frontier = coordinator.session().frontier();
    assert_eq!(
        frontier.queued_urls(),
        &[
            format!("{}/blog/post-sitemap.xml", base_url),
            format!("{}/blog/first-post/", base_url)
        ]
    );
    assert_eq!(
        frontier.visited_urls(),
        &[
            format!("{}/blog/post-sitemap.xml", base_url),
            format!("{}/blog/first-post/", base_url)
        ]
    );

    assert_eq!(summary.stop_reason, StopReason::Exhausted);
    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.pages_with_content, 1);
    assert_eq!(summary.records_indexed, 2);
    assert_eq!(summary.pages_index_failed, 0);
    assert_eq!(summary.next_record_id, 3);

    // One embed call carrying every paragraph of the page
    let calls = embedder.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        vec![
            format!("{}{}{}", PARAGRAPH_A, PARAGRAPH_B, PARAGRAPH_C),
            format!("{}{}", PARAGRAPH_C, PARAGRAPH_A),
        ]
    );

    // One upsert with index-aligned arrays
    let batches = store.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.ids, vec!["1", "2"]);
    assert_eq!(batch.documents, calls[0]);
    assert_eq!(batch.embeddings.as_ref().map(Vec::len), Some(2));
    assert_eq!(batch.metadatas.len(), 2);
    for metadata in &batch.metadatas {
        assert_eq!(metadata.url, format!("{}/blog/first-post/", base_url));
        assert_eq!(metadata.title, "Getting started with vectors");
        assert_eq!(metadata.publishing_date, NaiveDate::from_ymd_opt(2021, 3, 5));
    }
}

#[tokio::test]
async fn test_single_page_mode_only_reads_seed() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_sitemap(
        &server,
        "/blog/post-sitemap.xml",
        &[format!("{}/blog/first-post/", base_url)],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/blog/first-post/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let embedder = Arc::new(FakeEmbedder::default());
    let store = Arc::new(FakeStore::default());
    let pipeline = IndexingPipeline::new(embedder.clone(), store.clone());

    let config = create_test_config(&base_url, "/blog/post-sitemap.xml");
    let mut coordinator = Coordinator::new(config, RunOptions::default(), Some(pipeline)).unwrap();
    let summary = coordinator.run().await;

    assert_eq!(summary.stop_reason, StopReason::SinglePage);
    assert_eq!(summary.pages_visited, 1);
    assert_eq!(summary.pages_pending, 1);
    assert!(embedder.calls.lock().unwrap().is_empty());
    assert!(store.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_fetch_and_failed_indexing_do_not_stop_crawl() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_sitemap(
        &server,
        "/blog/post-sitemap.xml",
        &[
            format!("{}/blog/gone/", base_url),
            format!("{}/blog/first-post/", base_url),
            format!("{}/blog/second-post/", base_url),
        ],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/blog/gone/"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;
    mount_article(&server, "/blog/first-post/", "First").await;
    mount_article(&server, "/blog/second-post/", "Second").await;

    let embedder = Arc::new(FakeEmbedder::failing_first(1));
    let store = Arc::new(FakeStore::default());
    let pipeline = IndexingPipeline::new(embedder.clone(), store.clone());

    let config = create_test_config(&base_url, "/blog/post-sitemap.xml");
    let options = RunOptions {
        continue_crawl: true,
    };
    let mut coordinator = Coordinator::new(config, options, Some(pipeline)).unwrap();
    let summary = coordinator.run().await;

    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.pages_visited, 3);
    assert_eq!(summary.pages_index_failed, 1);
    assert_eq!(summary.records_indexed, 2);

    // The failed page did not consume ids
    let batches = store.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].ids, vec!["1", "2"]);
    assert_eq!(batches[0].metadatas[0].title, "Second");
    assert_eq!(embedder.calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_sqlite_store_is_queryable_and_resumes_ids() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("index.db");

    mount_article(&server, "/blog/first-post/", "First").await;

    let mut config = create_test_config(&base_url, "/blog/first-post/");
    config.store = Some(StoreConfig {
        database_path: db_path.to_string_lossy().into_owned(),
        collection: "blog".to_string(),
        first_record_id: 1,
        resume_record_ids: true,
        store_side_embeddings: false,
    });

    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::default());

    for expected_next in [3u64, 5] {
        let store = Arc::new(SqliteVectorStore::open(&db_path, "blog").unwrap());
        let pipeline = IndexingPipeline::new(Arc::clone(&embedder), store);
        let mut coordinator =
            Coordinator::new(config.clone(), RunOptions::default(), Some(pipeline)).unwrap();
        coordinator.init_record_ids().await.unwrap();
        let summary = coordinator.run().await;

        assert_eq!(summary.records_indexed, 2);
        assert_eq!(summary.next_record_id, expected_next);
    }

    let store = Arc::new(SqliteVectorStore::open(&db_path, "blog").unwrap());
    assert_eq!(store.count().unwrap(), 4);

    let pipeline = IndexingPipeline::new(embedder, store);
    let matches = pipeline
        .query(&format!("{}{}", PARAGRAPH_C, PARAGRAPH_A), 1)
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(
        matches[0].metadata.url,
        format!("{}/blog/first-post/", base_url)
    );
    assert_eq!(matches[0].metadata.title, "First");
    assert!(matches[0].distance < 1e-4);
}

#[tokio::test]
async fn test_http_embedder_end_to_end() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_article(&server, "/blog/first-post/", "First").await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"embedding": [0.1, 0.2, 0.3], "index": 0},
                {"embedding": [0.3, 0.2, 0.1], "index": 1}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedding_config = EmbeddingConfig {
        endpoint: format!("{}/v1", base_url),
        model: "embed-small".to_string(),
        api_key_env: "UNUSED".to_string(),
        dimensions: Some(3),
        timeout_secs: 5,
        max_retries: 0,
    };
    let embedder = Arc::new(HttpEmbedder::new(&embedding_config, "secret").unwrap());
    let store = Arc::new(SqliteVectorStore::open_in_memory("blog").unwrap());
    let pipeline = IndexingPipeline::new(embedder, store.clone());

    let config = create_test_config(&base_url, "/blog/first-post/");
    let mut coordinator = Coordinator::new(config, RunOptions::default(), Some(pipeline)).unwrap();
    let summary = coordinator.run().await;

    assert_eq!(summary.records_indexed, 2);
    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(store.max_record_id().await.unwrap(), Some(2));
}
