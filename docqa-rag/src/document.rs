//! Data types for documents, chunks, and retrieval results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source document containing extracted text and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Document {
    /// Opaque identifier for the document.
    pub id: String,
    /// The full extracted text of the document.
    pub text: String,
    /// Key-value metadata associated with the document.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    /// Optional URI pointing to the original source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), ..Default::default() }
    }
}

/// A contiguous segment of a [`Document`]'s text.
///
/// `start_offset` and `end_offset` are byte offsets into the document text and
/// always fall on character boundaries, so `text == document.text[start_offset..end_offset]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Chunk {
    /// Sequential identifier, starting at 0 in document order.
    pub id: usize,
    /// The text content of the chunk.
    pub text: String,
    /// Byte offset of the first character of the chunk.
    pub start_offset: usize,
    /// Byte offset one past the last character of the chunk.
    pub end_offset: usize,
}

impl Chunk {
    /// Length of the chunk in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant, whatever the metric).
    pub score: f32,
}

/// A generated answer together with the passages it was conditioned on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The language model's answer.
    pub text: String,
    /// The retrieved results, best match first.
    pub sources: Vec<RetrievalResult>,
}
