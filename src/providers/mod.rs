//! Provider capabilities for embedding and text generation.
//!
//! The core never talks to a model runtime directly. It goes through two
//! narrow traits: [`EmbeddingProvider`] maps batches of strings to fixed-width
//! vectors, [`GenerationProvider`] maps a prompt to generated text. One real
//! backend ships for each (`fastembed` and the Gemini HTTP API), and any
//! retry/backoff policy wraps a provider from the outside via [`Retrying`].

pub mod embedding;
pub mod generation;
pub mod retry;

pub use embedding::{EmbeddingProvider, FastEmbedProvider};
pub use generation::{GeminiProvider, GenerationProvider, strip_code_fence};
pub use retry::{RetryPolicy, Retrying};

// Re-export the backend's model enum so callers can pick one without
// depending on fastembed directly.
pub use fastembed::EmbeddingModel;

use thiserror::Error;

/// Error type for external provider operations.
///
/// The core propagates these to the caller of whatever operation triggered
/// the provider call; it never retries internally.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to initialize backend: {0}")]
    BackendInit(String),

    #[error("Embedding request failed: {0}")]
    Embedding(String),

    #[error("Generation request failed: {0}")]
    Generation(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Missing API key: set `generation.api_key` or the {0} environment variable")]
    MissingApiKey(&'static str),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

// Providers are commonly shared: the application keeps a handle for its own
// calls while the index or summarizer borrows the same backend. Blanket
// impls let references and smart pointers stand in for the provider itself.

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for &P {
    fn encode(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        (**self).encode(texts)
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for std::sync::Arc<P> {
    fn encode(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        (**self).encode(texts)
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn encode(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        (**self).encode(texts)
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

impl<P: GenerationProvider + ?Sized> GenerationProvider for &P {
    fn generate(&self, prompt: &str) -> ProviderResult<String> {
        (**self).generate(prompt)
    }
}

impl<P: GenerationProvider + ?Sized> GenerationProvider for std::sync::Arc<P> {
    fn generate(&self, prompt: &str) -> ProviderResult<String> {
        (**self).generate(prompt)
    }
}

impl<P: GenerationProvider + ?Sized> GenerationProvider for Box<P> {
    fn generate(&self, prompt: &str) -> ProviderResult<String> {
        (**self).generate(prompt)
    }
}
