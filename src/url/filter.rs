use crate::config::SiteConfig;
use crate::url::slug::strip_fragment;
use std::collections::HashSet;

/// Why a candidate link was accepted or turned away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// The link looks like an article of the target blog
    Accept(String),
    /// The link does not start with the blog prefix
    OutsidePrefix,
    /// The link contains a deny-listed fragment
    Blocked(String),
    /// The link is one of the known non-article pages
    Excluded,
}

/// Data-driven filter deciding which discovered links are articles
///
/// Frontier dedup is not part of this filter; the frontier applies it when
/// the accepted link is enqueued.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    blog_prefix: String,
    blocked_fragments: Vec<String>,
    excluded_pages: HashSet<String>,
}

impl LinkFilter {
    /// Builds a filter from the site section of the configuration
    pub fn from_site(site: &SiteConfig) -> Self {
        Self {
            blog_prefix: site.blog_prefix.clone(),
            blocked_fragments: site.blocked_fragments.clone(),
            excluded_pages: site.excluded_pages.iter().cloned().collect(),
        }
    }

    /// Runs a candidate through the filter chain
    ///
    /// The fragment is stripped first; the returned `Accept` carries the
    /// stripped URL.
    pub fn check(&self, candidate: &str) -> FilterDecision {
        let candidate = strip_fragment(candidate.trim());

        if !candidate.starts_with(&self.blog_prefix) {
            return FilterDecision::OutsidePrefix;
        }

        if let Some(fragment) = self
            .blocked_fragments
            .iter()
            .find(|fragment| candidate.contains(fragment.as_str()))
        {
            return FilterDecision::Blocked(fragment.clone());
        }

        if self.excluded_pages.contains(candidate) {
            return FilterDecision::Excluded;
        }

        FilterDecision::Accept(candidate.to_string())
    }

    /// Convenience wrapper returning only accepted, fragment-free URLs
    pub fn accept(&self, candidate: &str) -> Option<String> {
        match self.check(candidate) {
            FilterDecision::Accept(url) => Some(url),
            _ => None,
        }
    }
}
