/// Returns the slug of a URL: its last non-empty `/`-separated segment
///
/// The URL is split as a plain string, so a trailing slash is ignored and a
/// bare host yields the host itself.
///
/// # Examples
///
/// ```
/// use blogscout::url::slug_of;
///
/// assert_eq!(slug_of("https://example.com/blog/my-post/"), Some("my-post"));
/// assert_eq!(slug_of("https://example.com/blog/my-post"), Some("my-post"));
/// assert_eq!(slug_of(""), None);
/// ```
pub fn slug_of(url: &str) -> Option<&str> {
    url.split('/').rev().find(|segment| !segment.is_empty())
}

/// Checks whether `candidate`'s slug appears as a path segment of `existing`
///
/// This is the crawl's identity rule. It is segment containment rather than
/// full-URL equality, so `/blog/post/` and `/blog/br/post` collide, and so do
/// two unrelated pages that happen to share a generic final segment.
pub fn shares_slug(candidate: &str, existing: &str) -> bool {
    match slug_of(candidate) {
        Some(slug) => existing.split('/').any(|segment| segment == slug),
        None => false,
    }
}

/// Drops everything from the first `#` on
pub fn strip_fragment(url: &str) -> &str {
    match url.split_once('#') {
        Some((head, _)) => head,
        None => url,
    }
}
