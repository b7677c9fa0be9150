//! Query-time retrieval: embed the question, search the index.

use tracing::{debug, error};

use crate::document::RetrievalResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// Retrieves the chunks of a [`VectorIndex`] most relevant to a question.
///
/// Each call re-embeds the question; nothing is cached.
#[derive(Clone, Copy)]
pub struct Retriever<'a> {
    provider: &'a dyn EmbeddingProvider,
    index: &'a VectorIndex,
}

impl<'a> Retriever<'a> {
    /// Create a retriever over `index`, embedding questions with `provider`.
    pub fn new(provider: &'a dyn EmbeddingProvider, index: &'a VectorIndex) -> Self {
        Self { provider, index }
    }

    /// Return the top `k` results for `question`, best first.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyIndex`] if the index holds no chunks (the provider is not called)
    /// - [`RagError::InvalidConfiguration`] if `k == 0`
    /// - [`RagError::EmbeddingFailure`] if embedding the question fails or yields
    ///   a vector of the wrong dimensionality
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        if self.index.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if k == 0 {
            return Err(RagError::InvalidConfiguration("k must be greater than zero".to_string()));
        }

        let provider = self.provider.name();
        let query_vector = self.provider.embed(question).await.map_err(|e| {
            error!(provider, error = %e, "embedding failed during query");
            e.into_embedding_failure(provider)
        })?;

        let results = self.index.search(&query_vector, k)?;
        debug!(
            k,
            result_count = results.len(),
            top_score = ?results.first().map(|r| r.score),
            "retrieved chunks"
        );
        Ok(results)
    }
}
