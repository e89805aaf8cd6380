use crate::{Error, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 2000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Boundaries tried in order when cutting a chunk: paragraph, line,
/// sentence, word. A level wins if its last boundary in the window leaves a
/// long enough chunk.
const BOUNDARIES: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? "], &[" "]];

/// A window of transcript text.
///
/// `text` starts `overlap` bytes before the end of the previous chunk, so
/// `&text[overlap..]` is the part no earlier chunk covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    /// Byte offset of the chunk in the source text
    pub start: usize,
    /// Bytes shared with the previous chunk
    pub overlap: usize,
}

impl Chunk {
    pub fn fresh_text(&self) -> &str {
        &self.text[self.overlap..]
    }
}

/// Splits text into overlapping windows of at most `max_chars` characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    max_chars: usize,
    overlap_chars: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_CHUNK_SIZE,
            overlap_chars: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl TextSplitter {
    pub fn new(max_chars: usize, overlap_chars: usize) -> Result<Self> {
        if max_chars == 0 {
            return Err(Error::InvalidConfig("chunk size must be positive".to_string()));
        }
        if overlap_chars >= max_chars {
            return Err(Error::InvalidConfig(format!(
                "chunk overlap ({overlap_chars}) must be smaller than chunk size ({max_chars})"
            )));
        }
        Ok(Self {
            max_chars,
            overlap_chars,
        })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap_chars(&self) -> usize {
        self.overlap_chars
    }

    /// Split `text` into chunks. Empty input yields no chunks; input of at
    /// most `max_chars` characters yields exactly one.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        if text.is_empty() {
            return chunks;
        }

        let mut start = 0;
        let mut overlap = 0;
        loop {
            let hard_end = advance_chars(text, start, self.max_chars);
            let end = if hard_end == text.len() {
                hard_end
            } else {
                self.cut_point(text, start, hard_end)
            };

            chunks.push(Chunk {
                index: chunks.len(),
                text: text[start..end].to_string(),
                start,
                overlap,
            });

            if end == text.len() {
                return chunks;
            }

            let next = self.next_start(text, end);
            overlap = end - next;
            start = next;
        }
    }

    /// Byte offset to end the chunk starting at `start`, at the most natural
    /// boundary inside `start..hard_end`
    fn cut_point(&self, text: &str, start: usize, hard_end: usize) -> usize {
        // Chunks must stay longer than the overlap or the next one would not advance
        let min_chars = (self.overlap_chars + 1).max(self.max_chars / 2);
        let window = &text[start..hard_end];

        for level in BOUNDARIES {
            let cut = level
                .iter()
                .filter_map(|sep| window.rfind(sep).map(|pos| pos + sep.len()))
                .max();
            if let Some(cut) = cut {
                if window[..cut].chars().count() >= min_chars {
                    return start + cut;
                }
            }
        }
        hard_end
    }

    /// Start of the chunk after one ending at `end`: `overlap_chars` back,
    /// moved forward to the next word start when that lies before `end`
    fn next_start(&self, text: &str, end: usize) -> usize {
        let target = retreat_chars(text, end, self.overlap_chars);
        if is_word_start(text, target) {
            return target;
        }
        text[target..end]
            .char_indices()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| target + i + c.len_utf8())
            .unwrap_or(target)
    }
}

/// Byte offset `n` characters after `from`, clamped to the end of `text`
fn advance_chars(text: &str, from: usize, n: usize) -> usize {
    text[from..].char_indices().nth(n).map_or(text.len(), |(i, _)| from + i)
}

/// Byte offset `n` characters before `to`, clamped to the start of `text`
fn retreat_chars(text: &str, to: usize, n: usize) -> usize {
    if n == 0 {
        return to;
    }
    text[..to].char_indices().rev().nth(n - 1).map_or(0, |(i, _)| i)
}

fn is_word_start(text: &str, pos: usize) -> bool {
    pos == 0 || text[..pos].chars().next_back().is_some_and(char::is_whitespace)
}
