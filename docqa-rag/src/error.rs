//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Chunking or pipeline parameters are inconsistent. Raised before any work begins.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The embedding provider failed or produced unusable vectors.
    #[error("Embedding failure ({provider}): {message}")]
    EmbeddingFailure {
        /// The embedding provider (or component) that reported the failure.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A search was attempted against an index holding zero chunks.
    #[error("Vector index is empty")]
    EmptyIndex,

    /// The language model call failed.
    #[error("Generation failure ({provider}): {message}")]
    GenerationFailure {
        /// The generation client that reported the failure.
        provider: String,
        /// A description of the failure.
        message: String,
    },
}

impl RagError {
    /// Shorthand for an [`RagError::EmbeddingFailure`].
    pub fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingFailure { provider: provider.into(), message: message.into() }
    }

    /// Shorthand for a [`RagError::GenerationFailure`].
    pub fn generation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GenerationFailure { provider: provider.into(), message: message.into() }
    }

    /// Re-tag any error raised by an embedding provider as an embedding failure.
    ///
    /// Errors that already are [`RagError::EmbeddingFailure`] pass through unchanged.
    pub(crate) fn into_embedding_failure(self, provider: &str) -> Self {
        match self {
            err @ Self::EmbeddingFailure { .. } => err,
            other => Self::embedding(provider, other.to_string()),
        }
    }

    /// Re-tag any error raised by a generation client as a generation failure.
    pub(crate) fn into_generation_failure(self, provider: &str) -> Self {
        match self {
            err @ Self::GenerationFailure { .. } => err,
            other => Self::generation(provider, other.to_string()),
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
