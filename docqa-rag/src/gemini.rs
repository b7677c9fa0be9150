//! Gemini embedding provider and generation client over the Generative Language REST API.
//!
//! This module is only available when the `gemini` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::GenerationClient;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";

/// Default embedding dimensions for `gemini-embedding-001`.
const DEFAULT_DIMENSIONS: usize = 3072;

/// Default generation model.
const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash";

const PROVIDER: &str = "Gemini";

fn api_key_from_env() -> Result<String> {
    std::env::var("GEMINI_API_KEY")
        .or_else(|_| std::env::var("GOOGLE_API_KEY"))
        .map_err(|_| {
            RagError::InvalidConfiguration(
                "GEMINI_API_KEY or GOOGLE_API_KEY environment variable not set".into(),
            )
        })
}

fn check_api_key(api_key: &str) -> Result<()> {
    if api_key.is_empty() {
        return Err(RagError::InvalidConfiguration("Gemini API key must not be empty".into()));
    }
    Ok(())
}

/// Task hint sent with embedding requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// The text is a passage to be retrieved.
    RetrievalDocument,
    /// The text is a search query.
    RetrievalQuery,
    /// The text is compared for semantic similarity.
    SemanticSimilarity,
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: TaskType,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn candidate_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() { None } else { Some(text) }
}

/// An [`EmbeddingProvider`] backed by the Gemini `batchEmbedContents` API.
///
/// # Configuration
///
/// - `task_type` – defaults to [`TaskType::RetrievalDocument`]. Override with
///   [`GeminiEmbeddingProvider::with_task_type`]. Batches are sent with this
///   task type; [`embed`](EmbeddingProvider::embed) sends
///   [`TaskType::RetrievalQuery`] instead when it is `RetrievalDocument`.
/// - `output_dimensionality` – optional truncation of the output vector.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::gemini::GeminiEmbeddingProvider;
///
/// let provider = GeminiEmbeddingProvider::new("your-api-key")?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    task_type: TaskType,
    output_dimensionality: Option<usize>,
    dimensions: usize,
}

impl GeminiEmbeddingProvider {
    /// Create a new provider using the given API key and `gemini-embedding-001`.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        check_api_key(&api_key)?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_EMBEDDING_MODEL.into(),
            task_type: TaskType::RetrievalDocument,
            output_dimensionality: None,
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Create a new provider from `GEMINI_API_KEY` (or `GOOGLE_API_KEY`).
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env()?)
    }

    /// Set the embedding model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the task type used for embedding requests.
    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    /// Set the output dimensionality (truncates the embedding vector).
    pub fn with_output_dimensionality(mut self, dims: usize) -> Self {
        self.output_dimensionality = Some(dims);
        self.dimensions = dims;
        self
    }

    /// Task type for single-text embeddings, which the retriever uses for questions.
    ///
    /// Passages indexed as [`TaskType::RetrievalDocument`] are queried as
    /// [`TaskType::RetrievalQuery`]; other task types apply to both sides.
    fn query_task_type(&self) -> TaskType {
        match self.task_type {
            TaskType::RetrievalDocument => TaskType::RetrievalQuery,
            other => other,
        }
    }

    async fn request_embeddings(
        &self,
        texts: &[&str],
        task_type: TaskType,
    ) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.model,
            ?task_type,
            "embedding batch"
        );

        let model = format!("models/{}", self.model);
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|&text| EmbedContentRequest {
                    model: model.clone(),
                    content: Content { parts: [Part { text }] },
                    task_type,
                    output_dimensionality: self.output_dimensionality,
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!("{GEMINI_BASE_URL}/{model}:batchEmbedContents"))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "batch embedding request failed");
                RagError::embedding(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::embedding(PROVIDER, format!("API returned {status}: {detail}")));
        }

        let parsed: BatchEmbedResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::embedding(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        self.request_embeddings(&[text], self.query_task_type())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding(PROVIDER, "API returned no embeddings"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.request_embeddings(texts, self.task_type).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A [`GenerationClient`] backed by the Gemini `generateContent` API.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::gemini::GeminiGenerationClient;
///
/// let llm = GeminiGenerationClient::from_env()?.with_model("gemini-2.5-pro");
/// let answer = llm.generate(&prompt).await?;
/// ```
pub struct GeminiGenerationClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiGenerationClient {
    /// Create a new client using the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        check_api_key(&api_key)?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_GENERATION_MODEL.into(),
        })
    }

    /// Create a new client from `GEMINI_API_KEY` (or `GOOGLE_API_KEY`).
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env()?)
    }

    /// Set the generation model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl GenerationClient for GeminiGenerationClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "generating");

        let request =
            GenerateContentRequest { contents: [Content { parts: [Part { text: prompt }] }] };

        let response = self
            .client
            .post(format!("{GEMINI_BASE_URL}/models/{}:generateContent", self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "generation request failed");
                RagError::generation(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::generation(PROVIDER, format!("API returned {status}: {detail}")));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::generation(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        candidate_text(parsed)
            .ok_or_else(|| RagError::generation(PROVIDER, "response contained no text candidates"))
    }
}
