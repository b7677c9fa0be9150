//! A question-answering session over one ingested document.

use std::sync::Arc;

use tracing::info;

use crate::document::{Answer, Document};
use crate::error::Result;
use crate::index::VectorIndex;
use crate::pipeline::RagPipeline;

/// Owns the index of one document together with the pipeline that built it.
///
/// The index is built once in [`Session::open`] and only read afterwards, so
/// a session can serve questions from several tasks at once.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{Document, Session};
///
/// let session = Session::open(Arc::new(pipeline), &Document::new("paper", text)).await?;
/// let answer = session.ask("Who are the authors?").await?;
/// ```
pub struct Session {
    pipeline: Arc<RagPipeline>,
    document_id: String,
    index: VectorIndex,
}

impl Session {
    /// Ingest `document` and open a session over it.
    ///
    /// # Errors
    ///
    /// Propagates ingestion errors from [`RagPipeline::ingest`].
    pub async fn open(pipeline: Arc<RagPipeline>, document: &Document) -> Result<Self> {
        let index = pipeline.ingest(document).await?;
        info!(document.id = %document.id, chunk_count = index.len(), "session opened");
        Ok(Self { pipeline, document_id: document.id.clone(), index })
    }

    /// Open a session over an index that was already built.
    pub fn with_index(
        pipeline: Arc<RagPipeline>,
        document_id: impl Into<String>,
        index: VectorIndex,
    ) -> Self {
        Self { pipeline, document_id: document_id.into(), index }
    }

    /// Identifier of the document this session answers questions about.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// The document's index.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Answer one question.
    ///
    /// # Errors
    ///
    /// See [`RagPipeline::answer`].
    pub async fn ask(&self, question: &str) -> Result<String> {
        self.pipeline.answer(&self.index, question).await
    }

    /// Answer one question, returning the retrieved passages as well.
    ///
    /// # Errors
    ///
    /// See [`RagPipeline::answer_with_sources`].
    pub async fn ask_with_sources(&self, question: &str) -> Result<Answer> {
        self.pipeline.answer_with_sources(&self.index, question).await
    }
}
