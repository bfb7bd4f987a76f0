//! Link discovery for HTML pages and XML sitemaps
//!
//! This module turns a parsed page into candidate article URLs:
//! - XML: the text of every `<loc>` element
//! - HTML: the `href` of every `<a>` element, resolved against the page URL
//!
//! Every candidate then goes through the site's [`LinkFilter`]. Dedup against
//! the frontier happens when the caller enqueues the result.

use crate::document::{Document, DocumentKind};
use crate::url::{resolve_link, LinkFilter};
use url::Url;

/// Extracts filtered candidate URLs from one page, in document order
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `kind` - Which parser produced `document`
/// * `page_url` - The page's own URL, used to resolve relative links
/// * `filter` - The site's link filter
///
/// # Returns
///
/// Fragment-free URLs that passed the filter. Duplicates within the page are
/// kept; the frontier removes them.
pub fn extract_links(
    document: &dyn Document,
    kind: DocumentKind,
    page_url: &str,
    filter: &LinkFilter,
) -> Vec<String> {
    let candidates = match kind {
        DocumentKind::Xml => document
            .find_all("loc")
            .into_iter()
            .map(|loc| loc.text.trim().to_string())
            .collect::<Vec<_>>(),
        DocumentKind::Html => {
            let base_url = match Url::parse(page_url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Cannot resolve links of {}: {}", page_url, e);
                    return Vec::new();
                }
            };
            document
                .find_all("a")
                .into_iter()
                .filter_map(|anchor| anchor.href)
                .filter_map(|href| resolve_link(&href, &base_url))
                .collect()
        }
    };

    candidates
        .iter()
        .filter_map(|candidate| filter.accept(candidate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::document::{HtmlDocument, XmlDocument};

    fn filter() -> LinkFilter {
        LinkFilter::from_site(&SiteConfig {
            blog_prefix: "https://example.com/blog/".to_string(),
            blocked_fragments: vec!["category".to_string(), "wp-content".to_string()],
            excluded_pages: vec!["https://example.com/blog/".to_string()],
            date_marker_class: "publication-info".to_string(),
        })
    }

    #[test]
    fn test_sitemap_locs() {
        let doc = XmlDocument::parse(
            r#"<urlset>
                <url><loc> https://example.com/blog/first/ </loc></url>
                <url><loc>https://example.com/careers/</loc></url>
                <url><loc>https://other.com/blog/x/</loc></url>
            </urlset>"#,
        );
        let links = extract_links(&doc, DocumentKind::Xml, "https://example.com/s.xml", &filter());
        assert_eq!(links, vec!["https://example.com/blog/first/"]);
    }

    #[test]
    fn test_html_anchors() {
        let doc = HtmlDocument::parse(
            r##"<body>
                <a href="https://example.com/blog/first/">abs</a>
                <a href="/blog/second/#comments">rel</a>
                <a href="https://example.com/blog/category/news/">cat</a>
                <a href="https://example.com/blog/wp-content/a.png">img</a>
                <a href="https://example.com/blog/">root</a>
                <a href="#top">top</a>
                <a>no href</a>
            </body>"##,
        );
        let links = extract_links(
            &doc,
            DocumentKind::Html,
            "https://example.com/blog/current/",
            &filter(),
        );
        assert_eq!(
            links,
            vec![
                "https://example.com/blog/first/",
                "https://example.com/blog/second/"
            ]
        );
    }

    #[test]
    fn test_html_mode_ignores_loc() {
        let doc = HtmlDocument::parse("<loc>https://example.com/blog/first/</loc>");
        let links = extract_links(
            &doc,
            DocumentKind::Html,
            "https://example.com/blog/current/",
            &filter(),
        );
        assert!(links.is_empty());
    }

    #[test]
    fn test_unparseable_page_url() {
        let doc = HtmlDocument::parse(r#"<a href="/blog/first/">x</a>"#);
        assert!(extract_links(&doc, DocumentKind::Html, "not a url", &filter()).is_empty());
    }
}
