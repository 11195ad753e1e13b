//! Prompt templates for the map and reduce steps.
//!
//! Each template carries a single named placeholder that gets replaced with
//! the step's content: the chunk text for the map step, the joined chunk
//! summaries for the reduce step.

/// Default template for the per-chunk ("map") step.
pub const DEFAULT_CHUNK_TEMPLATE: &str = "Provide a concise and comprehensive summary of the \
following text, capturing the main ideas and key points:\n\n{content}";

/// Default template for the final ("reduce") step.
pub const DEFAULT_FINAL_TEMPLATE: &str = "Based on the following chunk summaries:
- {summaries}
######
Create a final, cohesive summary that:
1. Captures the most essential information
2. Maintains the core narrative
3. Removes redundant information

Provide the summary as plain text string.
Do not add any additional information or other fields.";

/// A prompt template with one named placeholder.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    placeholder: String,
}

impl PromptTemplate {
    /// Create a template. `placeholder` is the bare name, without braces.
    pub fn new(text: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            placeholder: placeholder.into(),
        }
    }

    /// The default map-step template (`{content}` placeholder).
    pub fn default_chunk() -> Self {
        Self::new(DEFAULT_CHUNK_TEMPLATE, "content")
    }

    /// The default reduce-step template (`{summaries}` placeholder).
    pub fn default_final() -> Self {
        Self::new(DEFAULT_FINAL_TEMPLATE, "summaries")
    }

    /// Substitute the placeholder and trim surrounding whitespace.
    pub fn render(&self, value: &str) -> String {
        self.text
            .replace(&format!("{{{}}}", self.placeholder), value)
            .trim()
            .to_string()
    }
}
