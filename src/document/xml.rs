use crate::document::{Document, Element};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug)]
struct XmlNode {
    name: String,
    classes: Vec<String>,
    href: Option<String>,
    text: String,
    parent: Option<usize>,
}

/// Lenient XML tree backed by `quick-xml`
///
/// Nodes are kept in an arena in document order. A syntax error stops the
/// read; everything parsed up to that point stays queryable.
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
}

impl XmlDocument {
    /// Parses an XML document such as a sitemap
    pub fn parse(body: &str) -> Self {
        let mut reader = Reader::from_str(body);
        reader.config_mut().trim_text(true);

        let mut nodes: Vec<XmlNode> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => {
                    let index = push_node(&mut nodes, &start, open.last().copied());
                    open.push(index);
                }
                Ok(Event::Empty(start)) => {
                    push_node(&mut nodes, &start, open.last().copied());
                }
                Ok(Event::End(_)) => {
                    open.pop();
                }
                Ok(Event::Text(text)) => {
                    let text = text
                        .unescape()
                        .map(|cow| cow.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                    append_text(&mut nodes, &open, &text);
                }
                Ok(Event::CData(data)) => {
                    let text = String::from_utf8_lossy(&data).into_owned();
                    append_text(&mut nodes, &open, &text);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(
                        "XML parse stopped at byte {}: {}",
                        reader.buffer_position(),
                        e
                    );
                    break;
                }
            }
        }

        Self { nodes }
    }

    fn snapshot(&self, position: usize) -> Element {
        let node = &self.nodes[position];
        Element {
            name: node.name.clone(),
            classes: node.classes.clone(),
            text: node.text.clone(),
            href: node.href.clone(),
            position,
        }
    }
}

fn push_node(nodes: &mut Vec<XmlNode>, start: &BytesStart<'_>, parent: Option<usize>) -> usize {
    // Sitemaps are namespaced; match on the local name only
    let name = String::from_utf8_lossy(start.local_name().as_ref()).to_ascii_lowercase();

    let mut classes = Vec::new();
    let mut href = None;
    for attribute in start.attributes().flatten() {
        let value = attribute
            .unescape_value()
            .map(|cow| cow.into_owned())
            .unwrap_or_default();
        match attribute.key.local_name().as_ref() {
            b"class" => classes = value.split_whitespace().map(str::to_string).collect(),
            b"href" => href = Some(value),
            _ => {}
        }
    }

    nodes.push(XmlNode {
        name,
        classes,
        href,
        text: String::new(),
        parent,
    });
    nodes.len() - 1
}

/// Text belongs to the innermost open element and all of its ancestors
fn append_text(nodes: &mut [XmlNode], open: &[usize], text: &str) {
    for &index in open {
        nodes[index].text.push_str(text);
    }
}

impl Document for XmlDocument {
    fn first(&self, tag: &str) -> Option<Element> {
        self.nodes
            .iter()
            .position(|node| node.name == tag)
            .map(|position| self.snapshot(position))
    }

    fn find_all(&self, tag: &str) -> Vec<Element> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.name == tag)
            .map(|(position, _)| self.snapshot(position))
            .collect()
    }

    fn next_siblings(&self, element: &Element) -> Vec<Element> {
        let Some(node) = self.nodes.get(element.position) else {
            return Vec::new();
        };
        let parent = node.parent;

        self.nodes
            .iter()
            .enumerate()
            .skip(element.position + 1)
            .filter(|(_, candidate)| candidate.parent == parent)
            .map(|(position, _)| self.snapshot(position))
            .collect()
    }
}
