//! Configuration for the RAG pipeline.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingBatching;
use crate::error::{RagError, Result};
use crate::index::SimilarityMetric;

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Character budget for the assembled context.
    pub max_context_length: usize,
    /// Similarity metric used by indexes built with this configuration.
    pub similarity_metric: SimilarityMetric,
    /// Number of chunk texts per embedding request during ingestion.
    pub embedding_batch_size: usize,
    /// Maximum number of embedding requests in flight during ingestion.
    pub embedding_concurrency: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            max_context_length: 6000,
            similarity_metric: SimilarityMetric::Cosine,
            embedding_batch_size: 32,
            embedding_concurrency: 4,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Load a configuration from `DOCQA_*` environment variables.
    ///
    /// Unset variables keep their default. Recognised variables:
    /// `DOCQA_CHUNK_SIZE`, `DOCQA_CHUNK_OVERLAP`, `DOCQA_TOP_K`,
    /// `DOCQA_MAX_CONTEXT_LENGTH`, `DOCQA_SIMILARITY_METRIC`,
    /// `DOCQA_EMBEDDING_BATCH_SIZE`, `DOCQA_EMBEDDING_CONCURRENCY`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if a variable does not parse
    /// or the resulting configuration fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        fn parse<T: FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
            default: T,
        ) -> Result<T>
        where
            T::Err: std::fmt::Display,
        {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => raw.trim().parse().map_err(|e| {
                    RagError::InvalidConfiguration(format!("{key}={raw:?} is not valid: {e}"))
                }),
            }
        }

        let defaults = RagConfig::default();
        RagConfig::builder()
            .chunk_size(parse(&lookup, "DOCQA_CHUNK_SIZE", defaults.chunk_size)?)
            .chunk_overlap(parse(&lookup, "DOCQA_CHUNK_OVERLAP", defaults.chunk_overlap)?)
            .top_k(parse(&lookup, "DOCQA_TOP_K", defaults.top_k)?)
            .max_context_length(parse(
                &lookup,
                "DOCQA_MAX_CONTEXT_LENGTH",
                defaults.max_context_length,
            )?)
            .similarity_metric(parse(
                &lookup,
                "DOCQA_SIMILARITY_METRIC",
                defaults.similarity_metric,
            )?)
            .embedding_batch_size(parse(
                &lookup,
                "DOCQA_EMBEDDING_BATCH_SIZE",
                defaults.embedding_batch_size,
            )?)
            .embedding_concurrency(parse(
                &lookup,
                "DOCQA_EMBEDDING_CONCURRENCY",
                defaults.embedding_concurrency,
            )?)
            .build()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `embedding_batch_size == 0` or `embedding_concurrency == 0`
    pub fn validate(&self) -> Result<()> {
        validate_chunking(self.chunk_size, self.chunk_overlap)?;
        if self.top_k == 0 {
            return Err(RagError::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }
        if self.embedding_batch_size == 0 {
            return Err(RagError::InvalidConfiguration(
                "embedding_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.embedding_concurrency == 0 {
            return Err(RagError::InvalidConfiguration(
                "embedding_concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The embedding batching derived from this configuration.
    pub fn batching(&self) -> EmbeddingBatching {
        EmbeddingBatching {
            batch_size: self.embedding_batch_size,
            concurrency: self.embedding_concurrency,
        }
    }
}

/// Reject chunk sizes that cannot make progress.
pub(crate) fn validate_chunking(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::InvalidConfiguration(
            "chunk_size must be greater than zero".to_string(),
        ));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::InvalidConfiguration(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the character budget for the assembled context.
    pub fn max_context_length(mut self, length: usize) -> Self {
        self.config.max_context_length = length;
        self
    }

    /// Set the similarity metric for built indexes.
    pub fn similarity_metric(mut self, metric: SimilarityMetric) -> Self {
        self.config.similarity_metric = metric;
        self
    }

    /// Set how many chunk texts go into one embedding request.
    pub fn embedding_batch_size(mut self, size: usize) -> Self {
        self.config.embedding_batch_size = size;
        self
    }

    /// Set how many embedding requests may run concurrently during ingestion.
    pub fn embedding_concurrency(mut self, concurrency: usize) -> Self {
        self.config.embedding_concurrency = concurrency;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
