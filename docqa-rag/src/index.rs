//! Exact in-memory vector index.
//!
//! [`VectorIndex`] holds one vector per chunk of a single document and answers
//! top-k queries by linear scan. It is built once and read-only afterwards, so
//! it can be shared between concurrent queries without locking.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::{Chunk, RetrievalResult};
use crate::embedding::{EmbeddingBatching, EmbeddingProvider};
use crate::error::{RagError, Result};

/// The similarity function an index ranks by. Higher scores are always better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Cosine similarity in `[-1, 1]`; 0 when either vector has zero magnitude.
    #[default]
    Cosine,
    /// Negative Euclidean distance; 0 for identical vectors.
    Euclidean,
}

impl SimilarityMetric {
    /// Score `candidate` against `query`.
    pub fn score(self, query: &[f32], candidate: &[f32]) -> f32 {
        let score = match self {
            Self::Cosine => cosine_similarity(query, candidate),
            Self::Euclidean => -euclidean_distance(query, candidate),
        };
        // -0.0 and 0.0 must tie
        score + 0.0
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => f.write_str("cosine"),
            Self::Euclidean => f.write_str("euclidean"),
        }
    }
}

impl FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" | "l2" => Ok(Self::Euclidean),
            other => Err(format!("unknown similarity metric '{other}'")),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

/// Best score first, then lowest chunk id.
fn rank(a: &RetrievalResult, b: &RetrievalResult) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.chunk.id.cmp(&b.chunk.id))
}

const INDEX: &str = "VectorIndex";

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Chunk vectors of one document, searchable by a fixed [`SimilarityMetric`].
///
/// Entries are kept in ascending chunk id order regardless of the order in
/// which their embeddings were produced.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{VectorIndex, SimilarityMetric, EmbeddingBatching};
///
/// let index = VectorIndex::build(chunks, &provider, SimilarityMetric::Cosine, EmbeddingBatching::default()).await?;
/// let results = index.search(&query_vector, 5)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    metric: SimilarityMetric,
    dimensions: usize,
    entries: Vec<Entry>,
}

impl VectorIndex {
    /// Create an index with no chunks. Searching it fails with [`RagError::EmptyIndex`].
    pub fn empty(metric: SimilarityMetric) -> Self {
        Self { metric, dimensions: 0, entries: Vec::new() }
    }

    /// Embed every chunk with `provider` and index the results.
    ///
    /// Chunk texts are sent in batches of `batching.batch_size`, with up to
    /// `batching.concurrency` batches in flight. Ingestion is all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingFailure`] if the provider fails, returns the
    /// wrong number of vectors, a vector whose length differs from
    /// [`EmbeddingProvider::dimensions`], or non-finite values.
    /// Returns [`RagError::InvalidConfiguration`] if the batching has a zero
    /// field or chunk ids are not unique.
    pub async fn build(
        chunks: Vec<Chunk>,
        provider: &dyn EmbeddingProvider,
        metric: SimilarityMetric,
        batching: EmbeddingBatching,
    ) -> Result<Self> {
        if batching.batch_size == 0 || batching.concurrency == 0 {
            return Err(RagError::InvalidConfiguration(
                "embedding batch size and concurrency must be greater than zero".to_string(),
            ));
        }
        if chunks.is_empty() {
            return Ok(Self::empty(metric));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let provider_name = provider.name();
        debug!(
            provider = provider_name,
            chunk_count = texts.len(),
            batch_size = batching.batch_size,
            concurrency = batching.concurrency,
            "embedding chunks"
        );

        let batches: Vec<Vec<Vec<f32>>> = stream::iter(texts.chunks(batching.batch_size))
            .map(|batch| async move {
                let vectors = provider
                    .embed_batch(batch)
                    .await
                    .map_err(|e| e.into_embedding_failure(provider_name))?;
                if vectors.len() != batch.len() {
                    return Err(RagError::embedding(
                        provider_name,
                        format!("returned {} vectors for {} texts", vectors.len(), batch.len()),
                    ));
                }
                Ok::<_, RagError>(vectors)
            })
            .buffered(batching.concurrency)
            .try_collect()
            .await
            .inspect_err(|e| error!(provider = provider_name, error = %e, "embedding failed"))?;

        let vectors: Vec<Vec<f32>> = batches.into_iter().flatten().collect();
        let index = Self::from_embeddings_with_dimensions(
            chunks,
            vectors,
            metric,
            provider.dimensions(),
            provider_name,
        )?;
        debug!(chunk_count = index.len(), dimensions = index.dimensions, "index built");
        Ok(index)
    }

    /// Index precomputed vectors, the `i`-th vector belonging to the `i`-th chunk.
    ///
    /// The index dimensionality is taken from the first vector.
    ///
    /// # Errors
    ///
    /// Same validation as [`build`](Self::build).
    pub fn from_embeddings(
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
        metric: SimilarityMetric,
    ) -> Result<Self> {
        let dimensions = vectors.first().map_or(0, Vec::len);
        Self::from_embeddings_with_dimensions(chunks, vectors, metric, dimensions, INDEX)
    }

    fn from_embeddings_with_dimensions(
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
        metric: SimilarityMetric,
        dimensions: usize,
        provider: &str,
    ) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(RagError::embedding(
                provider,
                format!("{} vectors for {} chunks", vectors.len(), chunks.len()),
            ));
        }
        if chunks.is_empty() {
            return Ok(Self::empty(metric));
        }
        if dimensions == 0 {
            return Err(RagError::embedding(provider, "embedding dimensionality is zero"));
        }

        let mut entries = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            if vector.len() != dimensions {
                return Err(RagError::embedding(
                    provider,
                    format!(
                        "chunk {} has {} dimensions, expected {dimensions}",
                        chunk.id,
                        vector.len()
                    ),
                ));
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(RagError::embedding(
                    provider,
                    format!("chunk {} has non-finite embedding values", chunk.id),
                ));
            }
            entries.push(Entry { chunk, vector });
        }

        entries.sort_by_key(|e| e.chunk.id);
        if let Some(pair) = entries.windows(2).find(|w| w[0].chunk.id == w[1].chunk.id) {
            return Err(RagError::InvalidConfiguration(format!(
                "duplicate chunk id {}",
                pair[0].chunk.id
            )));
        }

        Ok(Self { metric, dimensions, entries })
    }

    /// Return the `k` chunks most similar to `query`, best first.
    ///
    /// Ties are broken by ascending chunk id. Fewer than `k` results are
    /// returned only when the index holds fewer than `k` chunks.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyIndex`] if the index holds no chunks
    /// - [`RagError::InvalidConfiguration`] if `k == 0`
    /// - [`RagError::EmbeddingFailure`] if `query` has the wrong dimensionality
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        if self.entries.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if k == 0 {
            return Err(RagError::InvalidConfiguration("k must be greater than zero".to_string()));
        }
        if query.len() != self.dimensions {
            return Err(RagError::embedding(
                INDEX,
                format!(
                    "query has {} dimensions, index expects {}",
                    query.len(),
                    self.dimensions
                ),
            ));
        }

        let mut scored: Vec<RetrievalResult> = self
            .entries
            .iter()
            .map(|entry| RetrievalResult {
                chunk: entry.chunk.clone(),
                score: self.metric.score(query, &entry.vector),
            })
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_by(rank);
        Ok(scored)
    }

    /// The metric this index ranks by.
    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    /// Vector dimensionality, or 0 for an empty index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indexed chunks in ascending id order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// The vector stored for chunk `id`.
    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        self.entries
            .binary_search_by_key(&id, |e| e.chunk.id)
            .ok()
            .map(|i| self.entries[i].vector.as_slice())
    }
}
