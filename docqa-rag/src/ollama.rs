//! Ollama embedding provider and generation client for locally served models.
//!
//! This module is only available when the `ollama` feature is enabled.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::GenerationClient;

/// The default Ollama server address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// The default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// The dimensionality of `nomic-embed-text`.
const DEFAULT_DIMENSIONS: usize = 768;

/// The default generation model.
const DEFAULT_GENERATION_MODEL: &str = "gemma3:4b";

const PROVIDER: &str = "Ollama";

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

async fn post<T: DeserializeOwned + Send>(
    client: &reqwest::Client,
    url: String,
    body: &(impl Serialize + Sync),
) -> std::result::Result<T, String> {
    let response = client.post(&url).json(body).send().await.map_err(|e| {
        error!(provider = PROVIDER, %url, error = %e, "request failed");
        format!("request to {url} failed: {e}")
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
        error!(provider = PROVIDER, %status, "API error");
        return Err(format!("API returned {status}: {detail}"));
    }

    response.json().await.map_err(|e| {
        error!(provider = PROVIDER, error = %e, "failed to parse response");
        format!("failed to parse response: {e}")
    })
}

/// Output size of well-known Ollama embedding models, ignoring the tag.
fn known_dimensions(model: &str) -> Option<usize> {
    let name = model.split_once(':').map_or(model, |(name, _)| name);
    match name {
        "nomic-embed-text" => Some(768),
        "mxbai-embed-large" | "snowflake-arctic-embed" | "bge-m3" => Some(1024),
        "all-minilm" => Some(384),
        _ => None,
    }
}

/// An [`EmbeddingProvider`] backed by Ollama's `/api/embed` endpoint.
///
/// Defaults to `nomic-embed-text` (768 dimensions) on `http://localhost:11434`.
/// When switching models, set the matching dimensionality with
/// [`with_dimensions`](Self::with_dimensions).
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::ollama::OllamaEmbeddingProvider;
///
/// let provider = OllamaEmbeddingProvider::new();
/// let vectors = provider.embed_batch(&["first", "second"]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl Default for OllamaEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaEmbeddingProvider {
    /// Create a provider for the default model on the default server.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    /// Set the server address.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the embedding model.
    ///
    /// For the models in the Ollama library with a known output size
    /// (`nomic-embed-text`, `mxbai-embed-large`, `all-minilm`,
    /// `snowflake-arctic-embed`, `bge-m3`) the dimensionality is updated to
    /// match. Any other model keeps the current dimensionality; set it with
    /// [`with_dimensions`](Self::with_dimensions) after this call, otherwise
    /// ingestion fails with [`RagError::EmbeddingFailure`] on the first
    /// vector of a different length.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        if let Some(dimensions) = known_dimensions(&self.model) {
            self.dimensions = dimensions;
        }
        self
    }

    /// Set the dimensionality the model produces.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding(PROVIDER, "API returned no embeddings"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let request = EmbedRequest { model: &self.model, input: texts };
        let response: EmbedResponse =
            post(&self.client, format!("{}/api/embed", self.base_url), &request)
                .await
                .map_err(|message| RagError::embedding(PROVIDER, message))?;

        Ok(response.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A [`GenerationClient`] backed by Ollama's `/api/generate` endpoint.
///
/// Requests are made with `stream: false`, so the whole answer arrives in one
/// response.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::ollama::OllamaGenerationClient;
///
/// let llm = OllamaGenerationClient::new().with_model("llama3.2");
/// let answer = llm.generate(&prompt).await?;
/// ```
#[derive(Debug, Clone)]
pub struct OllamaGenerationClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl Default for OllamaGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaGenerationClient {
    /// Create a client for `gemma3:4b` on the default server.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_GENERATION_MODEL.into(),
        }
    }

    /// Set the server address.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the generation model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl GenerationClient for OllamaGenerationClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "generating");

        let request = GenerateRequest { model: &self.model, prompt, stream: false };
        let response: GenerateResponse =
            post(&self.client, format!("{}/api/generate", self.base_url), &request)
                .await
                .map_err(|message| RagError::generation(PROVIDER, message))?;

        Ok(response.response)
    }
}
