//! Generation client trait for turning a prompt into answer text.

use async_trait::async_trait;

use crate::error::Result;

/// A language model that answers a fully assembled prompt.
///
/// The prompt already carries the instruction, the retrieved context, and the
/// question (see [`PromptBuilder`](crate::PromptBuilder)). Failures should be
/// reported as [`RagError::GenerationFailure`](crate::RagError::GenerationFailure).
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::GenerationClient;
///
/// let llm = MyModel::new();
/// let answer = llm.generate("Question: what is the cat doing?").await?;
/// ```
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Short backend name used in logs and error messages.
    fn name(&self) -> &str {
        "generator"
    }

    /// Generate a completion for the prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
