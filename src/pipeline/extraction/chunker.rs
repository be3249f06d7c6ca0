//! Paragraph-then-sentence chunking for summarization prompts.

use std::sync::LazyLock;

use regex::Regex;

/// A run of text up to and including its terminal punctuation. Leading
/// punctuation stays attached to the text that follows it; a run of bare
/// punctuation is matched on its own so nothing is dropped.
static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[.!?]*[^.!?]+[.!?]*|[.!?]+").expect("valid sentence regex"));

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Paragraphs (blank-line separated) are packed greedily; the separator
/// counts toward the limit. A paragraph longer than the limit is split into
/// sentences that are packed the same way. A single sentence longer than the
/// limit becomes its own chunk. Chunks are trimmed and empty ones dropped.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunker = Packer::default();

    for paragraph in text.split(PARAGRAPH_SEPARATOR) {
        let paragraph_len = paragraph.chars().count();
        let joined_len = if chunker.is_empty() {
            paragraph_len
        } else {
            chunker.len + PARAGRAPH_SEPARATOR.len() + paragraph_len
        };

        if joined_len <= max_chars {
            if !chunker.is_empty() {
                chunker.push(PARAGRAPH_SEPARATOR, PARAGRAPH_SEPARATOR.len());
            }
            chunker.push(paragraph, paragraph_len);
            continue;
        }

        chunker.flush();

        if paragraph_len <= max_chars {
            chunker.push(paragraph, paragraph_len);
            continue;
        }

        for sentence in SENTENCE.find_iter(paragraph).map(|m| m.as_str()) {
            let sentence_len = sentence.chars().count();
            if !chunker.is_empty() && chunker.len + sentence_len > max_chars {
                chunker.flush();
            }
            chunker.push(sentence, sentence_len);
        }
    }

    chunker.flush();
    chunker.chunks
}

#[derive(Default)]
struct Packer {
    chunks: Vec<String>,
    current: String,
    len: usize,
}

impl Packer {
    fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    fn push(&mut self, s: &str, chars: usize) {
        self.current.push_str(s);
        self.len += chars;
    }

    fn flush(&mut self) {
        let trimmed = self.current.trim();
        if !trimmed.is_empty() {
            self.chunks.push(trimmed.to_string());
        }
        self.current.clear();
        self.len = 0;
    }
}
