use crate::config::SegmenterConfig;
use crate::document::Document;

const CONTENT_TAGS: &[&str] = &["p", "ul"];
const HEADING_TAGS: &[&str] = &["h1", "h2", "h3"];

/// Groups article text into embedding-sized chunks
///
/// Starting at the first `p`, the segmenter walks that element and its
/// following siblings. Text of `p` and `ul` elements is appended to a buffer;
/// the buffer is closed by a heading (`h1`..`h3`) or by reaching
/// `siblings_per_chunk` accumulated elements. Text still buffered when the
/// siblings run out is dropped. A closed buffer becomes a chunk only when it is longer than
/// `min_chunk_chars` characters and does not contain `excluded_substring`.
///
/// Pages without any `p` produce no chunks.
pub fn segment_paragraphs(document: &dyn Document, config: &SegmenterConfig) -> Vec<String> {
    let Some(first) = document.first("p") else {
        return Vec::new();
    };

    let mut run = document.next_siblings(&first);
    run.insert(0, first);

    let mut chunker = Chunker::new(config);
    for element in &run {
        if element.is_one_of(CONTENT_TAGS) {
            chunker.push(&element.text);
        }
        if element.is_one_of(HEADING_TAGS) || chunker.is_full() {
            chunker.close();
        }
    }

    chunker.into_chunks()
}

struct Chunker<'a> {
    config: &'a SegmenterConfig,
    buffer: String,
    accumulated: usize,
    chunks: Vec<String>,
}

impl<'a> Chunker<'a> {
    fn new(config: &'a SegmenterConfig) -> Self {
        Self {
            config,
            buffer: String::new(),
            accumulated: 0,
            chunks: Vec::new(),
        }
    }

    fn push(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.accumulated += 1;
    }

    fn is_full(&self) -> bool {
        self.accumulated >= self.config.siblings_per_chunk
    }

    /// Keeps or discards the buffer, then starts a new one
    fn close(&mut self) {
        if self.keeps(&self.buffer) {
            self.chunks.push(self.buffer.clone());
        }
        self.buffer.clear();
        self.accumulated = 0;
    }

    fn keeps(&self, chunk: &str) -> bool {
        let excluded = &self.config.excluded_substring;
        !chunk.is_empty()
            && chunk.chars().count() > self.config.min_chunk_chars
            && (excluded.is_empty() || !chunk.contains(excluded.as_str()))
    }

    fn into_chunks(self) -> Vec<String> {
        self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HtmlDocument;

    const LONG_A: &str = "Vector databases store embeddings and answer nearest neighbour queries.";
    const LONG_B: &str = "They back most retrieval augmented generation systems built today.";

    fn segment(html: &str) -> Vec<String> {
        let doc = HtmlDocument::parse(html);
        segment_paragraphs(&doc, &SegmenterConfig::default())
    }

    #[test]
    fn test_three_paragraphs_then_heading_make_one_chunk() {
        let chunks = segment(&format!(
            "<body><p>{}</p><p>{}</p><p>More.</p><h2>Next</h2></body>",
            LONG_A, LONG_B
        ));
        assert_eq!(chunks, vec![format!("{}{}More.", LONG_A, LONG_B)]);
    }

    #[test]
    fn test_short_text_makes_no_chunk() {
        let chunks = segment("<body><p>Short.</p><p>Also short.</p><p>Tiny.</p><h2>Next</h2></body>");
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_exactly_min_length_is_dropped() {
        let text = "a".repeat(80);
        let chunks = segment(&format!("<body><p>{}</p><h2>x</h2></body>", text));
        assert!(chunks.is_empty());

        let text = "a".repeat(81);
        let chunks = segment(&format!("<body><p>{}</p><h2>x</h2></body>", text));
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_links_exclude_chunk() {
        let chunks = segment(&format!(
            "<body><p>{}</p><p>See https://example.com for details on {}</p><h2>x</h2></body>",
            LONG_A, LONG_B
        ));
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_heading_closes_early() {
        let chunks = segment(&format!(
            "<body><p>{a}{b}</p><h3>Break</h3><p>{b}{a}</p><p>{a}</p><p>{b}</p></body>",
            a = LONG_A,
            b = LONG_B
        ));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], format!("{}{}", LONG_A, LONG_B));
        assert_eq!(chunks[1], format!("{b}{a}{a}{b}", a = LONG_A, b = LONG_B));
    }

    #[test]
    fn test_lists_count_as_content() {
        let chunks = segment(&format!(
            "<body><p>{}</p><ul><li>{}</li></ul><div>ignored</div><h2>x</h2></body>",
            LONG_A, LONG_B
        ));
        assert_eq!(chunks, vec![format!("{}{}", LONG_A, LONG_B)]);
    }

    #[test]
    fn test_trailing_buffer_is_dropped() {
        let chunks = segment(&format!("<body><p>{}</p><p>{}</p></body>", LONG_A, LONG_B));
        assert!(chunks.is_empty());

        let chunks = segment(&format!("<body><p>{}</p><p>tail</p></body>", "x".repeat(120)));
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_tabs_are_kept() {
        let chunks = segment(&format!("<body><p>{}\t{}</p><h2>x</h2></body>", LONG_A, LONG_B));
        assert_eq!(chunks, vec![format!("{}\t{}", LONG_A, LONG_B)]);
    }

    #[test]
    fn test_no_paragraph_no_chunks() {
        assert!(segment("<body><div>Only divs here</div></body>").is_empty());
    }

    #[test]
    fn test_custom_group_size() {
        let doc = HtmlDocument::parse(&format!(
            "<body><p>{a}{b}</p><p>{b}{a}</p></body>",
            a = LONG_A,
            b = LONG_B
        ));
        let config = SegmenterConfig {
            siblings_per_chunk: 1,
            ..SegmenterConfig::default()
        };
        assert_eq!(segment_paragraphs(&doc, &config).len(), 2);
    }
}
