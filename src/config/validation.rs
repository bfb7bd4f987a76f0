use crate::config::parser::resolve_api_key;
use crate::config::types::{
    Config, CrawlerConfig, EmbeddingConfig, SegmenterConfig, SiteConfig, StoreConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_site_config(&config.site)?;
    validate_segmenter_config(&config.segmenter)?;
    if let Some(embedding) = &config.embedding {
        validate_embedding_config(embedding)?;
    }
    if let Some(store) = &config.store {
        validate_store_config(store)?;
    }
    Ok(())
}

/// Checks everything persistence needs before the first fetch goes out
///
/// Both `[embedding]` and `[store]` must be configured and the API key
/// variable must be set.
///
/// # Returns
///
/// The embedding config, store config and resolved API key
pub fn require_persistence(
    config: &Config,
) -> Result<(&EmbeddingConfig, &StoreConfig, String), ConfigError> {
    let embedding = config.embedding.as_ref().ok_or_else(|| {
        ConfigError::MissingCredential("[embedding] section is required to persist".to_string())
    })?;
    let store = config.store.as_ref().ok_or_else(|| {
        ConfigError::MissingCredential("[store] section is required to persist".to_string())
    })?;
    let api_key = resolve_api_key(embedding)?;
    Ok((embedding, store, api_key))
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_http_url("seed-url", &config.seed_url)?;

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("blog-prefix", &config.blog_prefix)?;

    if config.blocked_fragments.iter().any(|f| f.is_empty()) {
        // An empty fragment would block every link
        return Err(ConfigError::Validation(
            "blocked-fragments cannot contain empty strings".to_string(),
        ));
    }

    for page in &config.excluded_pages {
        validate_http_url("excluded-pages", page)?;
    }

    if config.date_marker_class.trim().is_empty() {
        return Err(ConfigError::Validation(
            "date-marker-class cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_segmenter_config(config: &SegmenterConfig) -> Result<(), ConfigError> {
    if config.siblings_per_chunk < 1 {
        return Err(ConfigError::Validation(format!(
            "siblings-per-chunk must be >= 1, got {}",
            config.siblings_per_chunk
        )));
    }
    Ok(())
}

fn validate_embedding_config(config: &EmbeddingConfig) -> Result<(), ConfigError> {
    validate_http_url("embedding endpoint", &config.endpoint)?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "embedding model cannot be empty".to_string(),
        ));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api-key-env cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "embedding timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.dimensions == Some(0) {
        return Err(ConfigError::Validation(
            "embedding dimensions must be positive".to_string(),
        ));
    }

    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.collection.trim().is_empty() {
        return Err(ConfigError::Validation(
            "collection cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Requires an absolute http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact-email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
