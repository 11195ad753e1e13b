//! Embedding provider capability and the fastembed backend.

use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{ProviderError, ProviderResult};
use crate::config::Settings;

/// Maps batches of strings to fixed-width float vectors.
///
/// Implementations must return one vector per input text, in input order,
/// and be deterministic for a fixed model configuration. The vector width
/// is fixed per model; the index validates it on every insertion.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, preserving order.
    fn encode(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>>;

    /// Stable identity of the underlying model, recorded in snapshots.
    fn model_id(&self) -> &str;
}

/// Embedding backend over a local fastembed model.
///
/// The model is loaded once and kept behind a `Mutex` for interior
/// mutability, so a shared `FastEmbedProvider` can serve `&self` callers.
pub struct FastEmbedProvider {
    /// The embedding model (wrapped in Mutex for interior mutability)
    model: Mutex<TextEmbedding>,

    /// Model dimensions, probed at initialization
    dimension: usize,

    /// Model name for snapshot metadata
    model_id: String,
}

impl FastEmbedProvider {
    /// Create a provider with the default model (AllMiniLML6V2).
    pub fn new() -> ProviderResult<Self> {
        Self::with_options(EmbeddingModel::AllMiniLML6V2, None, false)
    }

    /// Create a provider from settings (model name, cache dir, progress).
    pub fn from_settings(settings: &Settings) -> ProviderResult<Self> {
        let model = parse_model_name(&settings.embedding.model)?;
        Self::with_options(
            model,
            Some(settings.model_cache_dir()),
            settings.embedding.show_download_progress,
        )
    }

    /// Create a provider with a specific model and cache directory.
    pub fn with_options(
        model: EmbeddingModel,
        cache_dir: Option<PathBuf>,
        show_download_progress: bool,
    ) -> ProviderResult<Self> {
        let model_id = format!("{model:?}");
        tracing::info!(target: "embedding", "Initializing embedding model: {model_id}");

        let mut options = InitOptions::new(model).with_show_download_progress(show_download_progress);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let mut text_model =
            TextEmbedding::try_new(options).map_err(|e| ProviderError::BackendInit(e.to_string()))?;

        // Probe dimensions with a test embedding
        let probe = text_model
            .embed(vec!["test"], None)
            .map_err(|e| ProviderError::Embedding(e.to_string()))?;
        let dimension = probe
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?
            .len();

        tracing::info!(target: "embedding", "Embedding model ready: {dimension} dimensions");

        Ok(Self {
            model: Mutex::new(text_model),
            dimension,
            model_id,
        })
    }

    /// Width of the vectors this provider produces.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn encode(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let embeddings = self
            .model
            .lock()
            .map_err(|_| ProviderError::Embedding("embedding model lock poisoned".to_string()))?
            .embed(refs, None)
            .map_err(|e| ProviderError::Embedding(e.to_string()))?;

        if embeddings.len() != texts.len() {
            return Err(ProviderError::MalformedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Resolve a configured model name to a fastembed model.
fn parse_model_name(name: &str) -> ProviderResult<EmbeddingModel> {
    match name {
        "AllMiniLML6V2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML6V2Q" => Ok(EmbeddingModel::AllMiniLML6V2Q),
        "AllMiniLML12V2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "BGESmallENV15" => Ok(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" => Ok(EmbeddingModel::BGEBaseENV15),
        "BGELargeENV15" => Ok(EmbeddingModel::BGELargeENV15),
        "NomicEmbedTextV15" => Ok(EmbeddingModel::NomicEmbedTextV15),
        other => Err(ProviderError::BackendInit(format!(
            "unknown embedding model: {other}"
        ))),
    }
}
