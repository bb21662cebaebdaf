use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Terminal punctuation followed by a whitespace run; the split happens right after the punctuation
static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[.!?]\s+").expect("sentence boundary pattern is valid")
});

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Splits documents into model-sized chunks along paragraph and sentence boundaries
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_chars: usize,
}

impl Chunker {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Produce the ordered chunk list for a whole document.
    ///
    /// A paragraph that fits the budget becomes one chunk. Longer paragraphs are
    /// split into sentences which are packed greedily, joined by a single space.
    /// A sentence longer than the budget is emitted on its own, never cut.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();

        for paragraph in split_paragraphs(text) {
            if char_len(paragraph) <= self.max_chars {
                chunks.push(paragraph.to_string());
                continue;
            }

            let sentences = split_sentences(paragraph);
            debug!(
                "Paragraph of {} chars split into {} sentences",
                char_len(paragraph),
                sentences.len()
            );
            chunks.extend(self.pack_sentences(&sentences));
        }

        chunks
    }

    fn pack_sentences(&self, sentences: &[&str]) -> Vec<String> {
        let mut packed = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for sentence in sentences {
            let sentence_len = char_len(sentence);

            if current.is_empty() {
                current.push_str(sentence);
                current_len = sentence_len;
            } else if current_len + 1 + sentence_len <= self.max_chars {
                current.push(' ');
                current.push_str(sentence);
                current_len += 1 + sentence_len;
            } else {
                packed.push(std::mem::take(&mut current));
                current.push_str(sentence);
                current_len = sentence_len;
            }
        }

        if !current.is_empty() {
            packed.push(current);
        }

        packed
    }
}

/// Convenience wrapper around [`Chunker::chunk`]
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    Chunker::new(max_chars).chunk(text)
}

/// Paragraphs delimited by a blank line, trimmed, whitespace-only ones dropped
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split(PARAGRAPH_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Break a paragraph after every `.`, `!` or `?` that is followed by whitespace.
///
/// Abbreviations such as "Mr. Smith" are split as well.
pub fn split_sentences(paragraph: &str) -> Vec<&str> {
    let paragraph = paragraph.trim();
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(paragraph) {
        // The punctuation mark is a single ASCII byte
        let end = boundary.start() + 1;
        if end > start {
            sentences.push(&paragraph[start..end]);
        }
        start = boundary.end();
    }

    if start < paragraph.len() {
        sentences.push(&paragraph[start..]);
    }

    sentences
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
