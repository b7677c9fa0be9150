//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the full ingest-and-answer workflow by
//! composing a [`Chunker`], an [`EmbeddingProvider`], and a
//! [`GenerationClient`] under one [`RagConfig`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{Document, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .generation_client(Arc::new(my_llm))
//!     .build()?;
//!
//! let index = pipeline.ingest(&document).await?;
//! let answer = pipeline.answer(&index, "What is the main finding?").await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::context::ContextAssembler;
use crate::document::{Answer, Document, RetrievalResult};
use crate::embedding::{EmbeddingBatching, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::generation::GenerationClient;
use crate::index::{SimilarityMetric, VectorIndex};
use crate::prompt::PromptBuilder;
use crate::retriever::Retriever;

/// Chunk `document_text` and index it with `provider`.
///
/// Uses the [`RecursiveChunker`], cosine similarity, and default embedding batching.
///
/// # Errors
///
/// Returns [`RagError::InvalidConfiguration`] if `chunk_size == 0` or
/// `overlap >= chunk_size`, and [`RagError::EmbeddingFailure`] if embedding fails.
pub async fn ingest(
    document_text: &str,
    chunk_size: usize,
    overlap: usize,
    provider: &dyn EmbeddingProvider,
) -> Result<VectorIndex> {
    let chunks = RecursiveChunker::new(chunk_size, overlap)?.chunk(document_text);
    VectorIndex::build(chunks, provider, SimilarityMetric::Cosine, EmbeddingBatching::default())
        .await
}

/// Answer `question` from the top `k` chunks of `index`.
///
/// # Errors
///
/// Returns [`RagError::EmptyIndex`], [`RagError::EmbeddingFailure`], or
/// [`RagError::GenerationFailure`] as the corresponding step fails.
pub async fn answer(
    index: &VectorIndex,
    question: &str,
    k: usize,
    max_context_length: usize,
    provider: &dyn EmbeddingProvider,
    generator: &dyn GenerationClient,
) -> Result<String> {
    let results = Retriever::new(provider, index).retrieve(question, k).await?;
    let context = ContextAssembler::new(max_context_length).assemble(&results);
    let prompt = PromptBuilder::default().build(&context, question);
    generate(generator, &prompt).await
}

async fn generate(generator: &dyn GenerationClient, prompt: &str) -> Result<String> {
    let name = generator.name();
    generator.generate(prompt).await.map_err(|e| {
        error!(generator = name, error = %e, "generation failed");
        e.into_generation_failure(name)
    })
}

/// The RAG pipeline orchestrator.
///
/// Coordinates document ingestion (chunk → embed → index) and question
/// answering (embed → search → assemble → prompt → generate). Construct one
/// via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    generation_client: Arc<dyn GenerationClient>,
    chunker: Arc<dyn Chunker>,
    prompt_builder: PromptBuilder,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the generation client.
    pub fn generation_client(&self) -> &Arc<dyn GenerationClient> {
        &self.generation_client
    }

    /// Ingest a document: chunk → embed → index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingFailure`] if embedding fails. No partial
    /// index is returned.
    pub async fn ingest(&self, document: &Document) -> Result<VectorIndex> {
        let chunks = self.chunker.chunk(&document.text);
        let chunk_count = chunks.len();

        let index = VectorIndex::build(
            chunks,
            self.embedding_provider.as_ref(),
            self.config.similarity_metric,
            self.config.batching(),
        )
        .await
        .inspect_err(|e| {
            error!(document.id = %document.id, error = %e, "ingestion failed");
        })?;

        info!(
            document.id = %document.id,
            chunk_count,
            dimensions = index.dimensions(),
            metric = %index.metric(),
            "ingested document"
        );
        Ok(index)
    }

    /// Retrieve the configured `top_k` results for `question`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyIndex`] or [`RagError::EmbeddingFailure`].
    pub async fn query(&self, index: &VectorIndex, question: &str) -> Result<Vec<RetrievalResult>> {
        let results = Retriever::new(self.embedding_provider.as_ref(), index)
            .retrieve(question, self.config.top_k)
            .await?;
        info!(result_count = results.len(), "query completed");
        Ok(results)
    }

    /// Answer `question` from `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyIndex`], [`RagError::EmbeddingFailure`], or
    /// [`RagError::GenerationFailure`].
    pub async fn answer(&self, index: &VectorIndex, question: &str) -> Result<String> {
        Ok(self.answer_with_sources(index, question).await?.text)
    }

    /// Answer `question` from `index`, returning the retrieved passages as well.
    ///
    /// # Errors
    ///
    /// Same as [`answer`](Self::answer).
    pub async fn answer_with_sources(&self, index: &VectorIndex, question: &str) -> Result<Answer> {
        let results = self.query(index, question).await?;
        let context = ContextAssembler::new(self.config.max_context_length).assemble(&results);
        let prompt = self.prompt_builder.build(&context, question);

        let text = generate(self.generation_client.as_ref(), &prompt).await?;
        info!(
            context_chunks = context.chunk_ids.len(),
            context_len = context.char_len(),
            answer_len = text.len(),
            "answered question"
        );
        Ok(Answer { text, sources: results })
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// The embedding provider and generation client are required. Without an
/// explicit config the defaults are used; without an explicit chunker a
/// [`RecursiveChunker`] is built from the config's chunk size and overlap.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(RagConfig::builder().chunk_size(500).chunk_overlap(50).build()?)
///     .embedding_provider(Arc::new(embedder))
///     .generation_client(Arc::new(llm))
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generation_client: Option<Arc<dyn GenerationClient>>,
    chunker: Option<Arc<dyn Chunker>>,
    prompt_builder: Option<PromptBuilder>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generation client.
    pub fn generation_client(mut self, client: Arc<dyn GenerationClient>) -> Self {
        self.generation_client = Some(client);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Override the prompt template.
    pub fn prompt_builder(mut self, prompt_builder: PromptBuilder) -> Self {
        self.prompt_builder = Some(prompt_builder);
        self
    }

    /// Build the [`RagPipeline`], validating the config and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if a required field is
    /// missing or the config is invalid.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedding_provider = self.embedding_provider.ok_or_else(|| {
            RagError::InvalidConfiguration("embedding_provider is required".to_string())
        })?;
        let generation_client = self.generation_client.ok_or_else(|| {
            RagError::InvalidConfiguration("generation_client is required".to_string())
        })?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)?),
        };

        Ok(RagPipeline {
            config,
            embedding_provider,
            generation_client,
            chunker,
            prompt_builder: self.prompt_builder.unwrap_or_default(),
        })
    }
}
