//! Fixed-size overlapping chunking for long documents.
//!
//! Completion endpoints impose context limits, so documents above a length threshold are
//! split into character-bounded segments before summarization. Consecutive chunks share a
//! configurable overlap region, keeping sentences that straddle a boundary visible in both
//! neighbors. The split is lazy: chunks borrow from the source text and are produced on
//! demand by an iterator.

/// Default target chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap shared by consecutive chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
/// Default document length above which chunking kicks in, in characters.
pub const DEFAULT_CHUNK_THRESHOLD: usize = 4000;
/// Default cap on the number of chunks summarized per document.
pub const DEFAULT_MAX_CHUNKS: usize = 3;

/// Chunking parameters resolved from configuration with defaults applied.
#[derive(Debug, Clone, Copy)]
pub struct ChunkSettings {
    /// Target chunk length in characters.
    pub chunk_size: usize,
    /// Overlap shared by consecutive chunks, in characters.
    pub overlap: usize,
    /// Document length above which chunking is used.
    pub threshold: usize,
    /// Maximum number of chunks summarized per document.
    pub max_chunks: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
            threshold: DEFAULT_CHUNK_THRESHOLD,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }
}

/// Lazy iterator over overlapping chunks of a document.
///
/// Produced by [`chunk_text`]. Yields nothing for empty input, exactly one chunk when the
/// input fits within the target size, and overlapping segments otherwise.
pub struct Chunks<'a> {
    text: &'a str,
    chunk_chars: usize,
    step_chars: usize,
    pos: usize,
    done: bool,
}

/// Split text into overlapping chunks of at most `chunk_size` characters.
///
/// `overlap` is clamped below `chunk_size` so the iterator always advances. Budgets are
/// counted in characters, never bytes, so multi-byte input cannot split a code point.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Chunks<'_> {
    let chunk_chars = chunk_size.max(1);
    let effective_overlap = overlap.min(chunk_chars - 1);
    Chunks {
        text,
        chunk_chars,
        step_chars: chunk_chars - effective_overlap,
        pos: 0,
        done: text.is_empty(),
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }

        let rest = &self.text[self.pos..];
        match byte_offset_of_char(rest, self.chunk_chars) {
            // Fewer than chunk_chars characters remain: emit the tail and stop.
            None => {
                self.done = true;
                Some(rest)
            }
            Some(end) => {
                let advance = byte_offset_of_char(rest, self.step_chars)
                    .expect("step_chars never exceeds chunk_chars");
                self.pos += advance;
                Some(&rest[..end])
            }
        }
    }
}

/// Byte offset of the `n`-th character of `s`, or `None` when `s` has at most `n` characters.
fn byte_offset_of_char(s: &str, n: usize) -> Option<usize> {
    s.char_indices().nth(n).map(|(offset, _)| offset)
}
