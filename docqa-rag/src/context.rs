//! Context assembly: ranked chunks into one bounded block of text.

use serde::{Deserialize, Serialize};

use crate::document::RetrievalResult;

/// The delimiter placed between chunk texts by default.
pub const DEFAULT_DELIMITER: &str = "\n\n";

/// Chunk texts selected for one query, in ranking order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Ids of the included chunks, in the order their texts appear.
    pub chunk_ids: Vec<usize>,
    /// The included chunk texts joined by the assembler's delimiter.
    pub text: String,
}

impl Context {
    /// Length of the rendered context in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether no chunk was included.
    pub fn is_empty(&self) -> bool {
        self.chunk_ids.is_empty()
    }

    /// The rendered context text.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Concatenates ranked chunks under a character budget.
///
/// Chunks are taken in the given order and never cut. Assembly stops before
/// the first chunk that would push the total length, delimiters included,
/// past `max_length`. The first chunk is always included, even when it alone
/// exceeds the budget.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_length: usize,
    delimiter: String,
}

impl ContextAssembler {
    /// Create an assembler with a `max_length` character budget.
    pub fn new(max_length: usize) -> Self {
        Self { max_length, delimiter: DEFAULT_DELIMITER.to_string() }
    }

    /// Use `delimiter` between chunk texts instead of a blank line.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Build the context for `results`.
    pub fn assemble(&self, results: &[RetrievalResult]) -> Context {
        let delimiter_len = self.delimiter.chars().count();
        let mut context = Context::default();
        let mut length = 0;

        for result in results {
            let chunk_len = result.chunk.text.chars().count();
            if context.is_empty() {
                length = chunk_len;
            } else {
                let next = length + delimiter_len + chunk_len;
                if next > self.max_length {
                    break;
                }
                context.text.push_str(&self.delimiter);
                length = next;
            }
            context.text.push_str(&result.chunk.text);
            context.chunk_ids.push(result.chunk.id);
        }

        context
    }
}

/// Assemble `results` with the default delimiter.
pub fn assemble(results: &[RetrievalResult], max_length: usize) -> Context {
    ContextAssembler::new(max_length).assemble(results)
}
