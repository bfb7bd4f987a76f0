//! Embedding collaborator and its OpenAI-compatible HTTP implementation

use crate::config::EmbeddingConfig;
use crate::index::EmbedError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Turns texts into vectors
///
/// The result has the same length and order as the input.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Embeddings client for OpenAI-compatible `/embeddings` endpoints
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    max_retries: usize,
    base_backoff: Duration,
}

impl HttpEmbedder {
    /// Builds a client from the `[embedding]` section and a resolved API key
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> Result<Self, EmbedError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| EmbedError::Client("API key is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| EmbedError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            dimensions: config.dimensions,
            max_retries: config.max_retries,
            base_backoff: Duration::from_millis(500),
        })
    }

    /// Overrides the delay before the first retry
    pub fn with_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    fn retry_backoff(&self, attempt: usize) -> Duration {
        let capped = attempt.min(5) as u32;
        self.base_backoff * (1 << capped)
    }

    async fn request_once(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Attempt> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimensions,
        };

        let response = match self.client.post(&self.endpoint).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                let retryable = e.is_timeout() || e.is_connect() || e.is_request();
                return Err(Attempt::failed(EmbedError::Request(e), retryable));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            return Err(Attempt::failed(
                EmbedError::Status {
                    status: status.as_u16(),
                    body,
                },
                retryable,
            ));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Attempt::failed(EmbedError::Request(e), false))?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != texts.len() {
            return Err(Attempt::failed(
                EmbedError::CountMismatch {
                    expected: texts.len(),
                    actual: parsed.data.len(),
                },
                false,
            ));
        }

        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

struct Attempt {
    error: EmbedError,
    retryable: bool,
}

impl Attempt {
    fn failed(error: EmbedError, retryable: bool) -> Self {
        Self { error, retryable }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut attempt = 0usize;
        loop {
            match self.request_once(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(failure) if failure.retryable && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_backoff(attempt);
                    tracing::warn!(
                        "Embedding request failed ({}), retry {}/{} in {:?}",
                        failure.error,
                        attempt,
                        self.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
