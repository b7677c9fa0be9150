//! # docqa-rag
//!
//! Retrieval-augmented question answering over a single document.
//!
//! ## Overview
//!
//! The crate covers the retrieval core of a RAG system. Raw extracted text is
//! split into overlapping chunks, every chunk is embedded by an
//! [`EmbeddingProvider`], and the vectors go into a [`VectorIndex`]. At query
//! time the question is embedded, the top-k chunks are retrieved, assembled
//! into a bounded [`Context`], rendered into a prompt, and answered by a
//! [`GenerationClient`].
//!
//! - [`Chunker`] - [`RecursiveChunker`] (natural boundaries) and [`FixedSizeChunker`]
//! - [`VectorIndex`] - exact top-k search by cosine or negative Euclidean distance
//! - [`Retriever`] - embeds the question and searches the index
//! - [`ContextAssembler`] - ranked chunks into a budgeted context
//! - [`PromptBuilder`] - instruction, context, and question in one prompt
//! - [`RagPipeline`] / [`Session`] - ingestion and question answering end to end
//!
//! Document extraction and the interactive shell live outside this crate.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{Document, RagConfig, RagPipeline, Session};
//! use docqa_rag::ollama::{OllamaEmbeddingProvider, OllamaGenerationClient};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::from_env()?)
//!     .embedding_provider(Arc::new(OllamaEmbeddingProvider::new()))
//!     .generation_client(Arc::new(OllamaGenerationClient::new()))
//!     .build()?;
//!
//! let session = Session::open(Arc::new(pipeline), &Document::new("report", text)).await?;
//! let answer = session.ask("What does the report conclude?").await?;
//! ```
//!
//! ## Features
//!
//! | Feature | Backends |
//! |---------|----------|
//! | `ollama` | [`ollama::OllamaEmbeddingProvider`], [`ollama::OllamaGenerationClient`] |
//! | `gemini` | [`gemini::GeminiEmbeddingProvider`], [`gemini::GeminiGenerationClient`] |
//! | `openai` | [`openai::OpenAIEmbeddingProvider`], [`openai::OpenAIGenerationClient`] |

pub mod chunking;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod session;

#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker, chunk};
pub use config::{RagConfig, RagConfigBuilder};
pub use context::{Context, ContextAssembler, assemble};
pub use document::{Answer, Chunk, Document, RetrievalResult};
pub use embedding::{EmbeddingBatching, EmbeddingProvider};
pub use error::{RagError, Result};
pub use generation::GenerationClient;
pub use index::{SimilarityMetric, VectorIndex};
pub use pipeline::{RagPipeline, RagPipelineBuilder, answer, ingest};
pub use prompt::PromptBuilder;
pub use retriever::Retriever;
pub use session::Session;
