//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`]: prefers natural boundaries: paragraphs, lines,
//!   sentences, then words, falling back to a hard cut
//! - [`FixedSizeChunker`]: splits by character count with configurable overlap
//!
//! Sizes and overlaps are counted in characters. Chunk offsets are byte offsets
//! into the source text, so every chunk is an exact slice of it.

use crate::config::validate_chunking;
use crate::document::Chunk;
use crate::error::Result;

/// Separators tried by [`RecursiveChunker`], coarsest first.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

/// A strategy for splitting text into chunks.
///
/// Implementations produce chunks in document order with ids assigned
/// sequentially from 0. Empty text yields no chunks.
pub trait Chunker: Send + Sync {
    /// Split text into chunks.
    fn chunk(&self, text: &str) -> Vec<Chunk>;
}

/// Split `text` with a [`RecursiveChunker`].
///
/// # Errors
///
/// Returns [`RagError::InvalidConfiguration`](crate::RagError::InvalidConfiguration)
/// if `size == 0` or `overlap >= size`.
pub fn chunk(text: &str, size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(RecursiveChunker::new(size, overlap)?.chunk(text))
}

/// Byte index reached after advancing `count` characters from `from`, clamped to the end.
fn advance_chars(text: &str, from: usize, count: usize) -> usize {
    text[from..].char_indices().nth(count).map_or(text.len(), |(i, _)| from + i)
}

/// Byte index `count` characters before `to`, clamped to `floor`.
fn retreat_chars(text: &str, floor: usize, to: usize, count: usize) -> usize {
    if count == 0 {
        return to;
    }
    text[floor..to].char_indices().rev().nth(count - 1).map_or(floor, |(i, _)| floor + i)
}

fn make_chunk(text: &str, id: usize, start: usize, end: usize) -> Chunk {
    Chunk { id, text: text[start..end].to_string(), start_offset: start, end_offset: end }
}

/// Splits text at the coarsest natural boundary that fits the window.
///
/// For each chunk the next `chunk_size` characters form a window. Separators
/// from the priority list are tried in order; the chunk ends right after the
/// last occurrence of the first separator that gives a chunk longer than
/// `chunk_overlap`. Without any such separator the chunk is cut at the window
/// end. The following chunk starts `chunk_overlap` characters before that end,
/// moved forward to the next word start when one falls inside the overlap.
///
/// Every chunk has at most `chunk_size` characters, and neighbours share at
/// most `chunk_overlap` characters.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{Chunker, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(1000, 200)?;
/// let chunks = chunker.chunk(&document.text);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` using [`DEFAULT_SEPARATORS`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`](crate::RagError::InvalidConfiguration)
    /// if `chunk_size == 0` or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Replace the separator priority list. Empty separators are ignored.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators =
            separators.into_iter().map(Into::into).filter(|s: &String| !s.is_empty()).collect();
        self
    }

    /// Byte index where the chunk starting at `start` should end.
    fn find_break(&self, text: &str, start: usize) -> usize {
        let window_end = advance_chars(text, start, self.chunk_size);
        if window_end == text.len() {
            return window_end;
        }

        let window = &text[start..window_end];
        for separator in &self.separators {
            if let Some(pos) = window.rfind(separator.as_str()) {
                let end = start + pos + separator.len();
                if text[start..end].chars().count() > self.chunk_overlap {
                    return end;
                }
            }
        }

        window_end
    }

    /// Byte index where the chunk after `[start, end)` begins.
    fn next_start(&self, text: &str, start: usize, end: usize) -> usize {
        let mut next = retreat_chars(text, start, end, self.chunk_overlap);
        if next <= start {
            // Breaks are always longer than the overlap, so this only guards progress.
            return end;
        }

        let at_word_start = text[..next].chars().next_back().is_some_and(char::is_whitespace);
        if !at_word_start {
            if let Some((i, c)) = text[next..end].char_indices().find(|(_, c)| c.is_whitespace()) {
                next += i + c.len_utf8();
            }
        }
        next
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let end = self.find_break(text, start);
            chunks.push(make_chunk(text, chunks.len(), start, end));
            if end == text.len() {
                break;
            }
            start = self.next_start(text, start, end);
        }

        chunks
    }
}

/// Splits text into fixed-size character windows with configurable overlap.
///
/// Boundaries ignore the text's structure; every window except the last holds
/// exactly `chunk_size` characters.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(256, 50)?;
/// let chunks = chunker.chunk(&document.text);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`](crate::RagError::InvalidConfiguration)
    /// if `chunk_size == 0` or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut start = 0;
        let step = self.chunk_size - self.chunk_overlap;

        while start < text.len() {
            let end = advance_chars(text, start, self.chunk_size);
            chunks.push(make_chunk(text, chunks.len(), start, end));
            if end == text.len() {
                break;
            }
            start = advance_chars(text, start, step);
        }

        chunks
    }
}
