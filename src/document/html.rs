use crate::document::{Document, Element};
use scraper::{ElementRef, Html};

/// Lenient HTML tree backed by `scraper`
///
/// html5ever repairs whatever it is given, so parsing never fails; a
/// truncated or tag-soup page just yields fewer elements.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parses a full HTML document
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// All elements in document order, starting at `<html>`
    fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
    }
}

fn snapshot(element: ElementRef<'_>, position: usize) -> Element {
    let value = element.value();
    Element {
        name: value.name().to_string(),
        classes: value.classes().map(str::to_string).collect(),
        text: element.text().collect::<String>(),
        href: value.attr("href").map(str::to_string),
        position,
    }
}

impl Document for HtmlDocument {
    fn first(&self, tag: &str) -> Option<Element> {
        self.elements()
            .enumerate()
            .find(|(_, element)| element.value().name() == tag)
            .map(|(position, element)| snapshot(element, position))
    }

    fn find_all(&self, tag: &str) -> Vec<Element> {
        self.elements()
            .enumerate()
            .filter(|(_, element)| element.value().name() == tag)
            .map(|(position, element)| snapshot(element, position))
            .collect()
    }

    fn next_siblings(&self, element: &Element) -> Vec<Element> {
        let Some(anchor) = self.elements().nth(element.position) else {
            return Vec::new();
        };

        let siblings: Vec<ElementRef<'_>> =
            anchor.next_siblings().filter_map(ElementRef::wrap).collect();
        if siblings.is_empty() {
            return Vec::new();
        }

        // Siblings come after the anchor in document order, so one forward
        // pass assigns every position.
        let mut result = Vec::with_capacity(siblings.len());
        let mut pending = siblings.iter().peekable();
        for (position, candidate) in self.elements().enumerate().skip(element.position + 1) {
            match pending.peek() {
                Some(next) if next.id() == candidate.id() => {
                    result.push(snapshot(candidate, position));
                    pending.next();
                }
                Some(_) => {}
                None => break,
            }
        }
        result
    }
}
