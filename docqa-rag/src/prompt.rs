//! Prompt template combining the retrieved context with the question.

use crate::context::Context;

/// The instruction line used by [`PromptBuilder::default`].
pub const DEFAULT_INSTRUCTION: &str = "Answer the following question using the provided context.";

/// Renders the text handed to the [`GenerationClient`](crate::GenerationClient).
///
/// The layout is:
///
/// ```text
/// <instruction>
///
/// Context:
/// <context>
///
/// Question: <question>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilder {
    instruction: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self { instruction: DEFAULT_INSTRUCTION.to_string() }
    }
}

impl PromptBuilder {
    /// Create a builder with the default instruction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the instruction line.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Render the prompt for `question` over `context`.
    pub fn build(&self, context: &Context, question: &str) -> String {
        format!(
            "{}\n\nContext:\n{}\n\nQuestion: {}\n",
            self.instruction,
            context.as_str(),
            question.trim()
        )
    }
}
