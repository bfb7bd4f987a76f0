//! Document parsing behind a small capability interface
//!
//! Extraction code never looks at raw markup. It asks a [`Document`] for
//! elements by tag name and walks sibling runs, and the two implementations
//! (lenient HTML via `scraper`, lenient XML via `quick-xml`) answer those
//! questions for their input mode. Neither implementation fails on malformed
//! input: missing elements simply come back empty.

mod html;
mod xml;

pub use html::HtmlDocument;
pub use xml::XmlDocument;

/// Which parser a fetched body goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    Xml,
}

impl DocumentKind {
    /// Picks the parser from the response media type, falling back to the URL
    ///
    /// Any media type mentioning `xml` (`application/xml`, `text/xml`,
    /// `application/rss+xml`...) selects XML, except XHTML. Without a usable
    /// header a `.xml` path suffix selects XML.
    pub fn detect(url: &str, content_type: Option<&str>) -> Self {
        if let Some(content_type) = content_type {
            let media_type = content_type
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase();
            if media_type.contains("html") {
                return Self::Html;
            }
            if media_type.contains("xml") {
                return Self::Xml;
            }
        }

        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.to_ascii_lowercase().ends_with(".xml") {
            Self::Xml
        } else {
            Self::Html
        }
    }
}

/// Owned snapshot of one element
///
/// `position` is an opaque handle the producing document uses to find the
/// element again for sibling traversal; it means nothing to other documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name
    pub name: String,
    /// Entries of the `class` attribute
    pub classes: Vec<String>,
    /// Concatenated text of the element and its descendants
    pub text: String,
    /// Value of the `href` attribute, if any
    pub href: Option<String>,
    pub(crate) position: usize,
}

impl Element {
    /// Returns true if the class list contains `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Returns true if this element is one of `names`
    pub fn is_one_of(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.name == *name)
    }
}

/// Read-only queries over a parsed page
pub trait Document {
    /// First element with the given tag in document order
    fn first(&self, tag: &str) -> Option<Element>;

    /// Every element with the given tag, in document order
    fn find_all(&self, tag: &str) -> Vec<Element>;

    /// Element siblings following `element`, in document order
    ///
    /// Text nodes between elements are skipped.
    fn next_siblings(&self, element: &Element) -> Vec<Element>;
}

/// Parses a body with the parser for `kind`
///
/// The returned tree lives only as long as one page's processing.
pub fn parse_document(body: &str, kind: DocumentKind) -> Box<dyn Document> {
    match kind {
        DocumentKind::Html => Box::new(HtmlDocument::parse(body)),
        DocumentKind::Xml => Box::new(XmlDocument::parse(body)),
    }
}
