//! Hierarchical map-reduce summarization.
//!
//! A [`HierarchicalSummarizer`] is scoped to one input text and one
//! configuration: the chunk list is computed once at construction, each
//! chunk is summarized with one sequential generation call ("map"), and
//! the collected chunk summaries are synthesized with one final call
//! ("reduce"). Chunk summaries are memoized, so invoking
//! [`HierarchicalSummarizer::summarize`] again re-runs only the reduce.

pub mod chunker;
pub mod prompt;

pub use chunker::{Chunk, ChunkerConfig, chunk_text};
pub use prompt::{DEFAULT_CHUNK_TEMPLATE, DEFAULT_FINAL_TEMPLATE, PromptTemplate};

use std::time::Duration;

use thiserror::Error;

use crate::providers::{GenerationProvider, ProviderError};

/// Separator used to join chunk summaries for the reduce prompt.
const SUMMARY_SEPARATOR: &str = "\n- ";

/// Error type for summarization.
#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No chunk summaries to reduce: every map call failed or the input was empty")]
    NoChunkSummaries,

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Configuration for a summarizer instance.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Window parameters for chunking.
    pub chunking: ChunkerConfig,

    /// Delay between consecutive per-chunk generation calls, respecting the
    /// provider's throughput limits.
    pub chunk_delay: Duration,

    /// Template for the per-chunk step (`{content}` placeholder).
    pub chunk_template: PromptTemplate,

    /// Template for the final step (`{summaries}` placeholder).
    pub final_template: PromptTemplate,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkerConfig::default(),
            chunk_delay: Duration::from_secs(2),
            chunk_template: PromptTemplate::default_chunk(),
            final_template: PromptTemplate::default_final(),
        }
    }
}

impl SummarizerConfig {
    /// Build from loaded settings, keeping the default templates.
    pub fn from_settings(settings: &crate::config::SummarizeConfig) -> Self {
        Self {
            chunking: ChunkerConfig::new(settings.window_size, settings.overlap_size),
            chunk_delay: Duration::from_secs(settings.chunk_delay_secs),
            ..Self::default()
        }
    }
}

/// Two-level map-reduce summarizer over a generation provider.
pub struct HierarchicalSummarizer<G: GenerationProvider> {
    provider: G,
    config: SummarizerConfig,
    chunks: Vec<Chunk>,
    chunk_summaries: Vec<String>,
    /// Set after the first full map pass. Memoization keys off this flag,
    /// not off the summary list being non-empty: a pass where every chunk
    /// failed must still not be repeated.
    mapped: bool,
}

impl<G: GenerationProvider> HierarchicalSummarizer<G> {
    /// Create a summarizer for one input text.
    ///
    /// The chunk list is computed here, once. Fails with
    /// [`SummarizeError::InvalidConfig`] if the window parameters are
    /// invalid.
    pub fn new(
        provider: G,
        text: &str,
        config: SummarizerConfig,
    ) -> Result<Self, SummarizeError> {
        config
            .chunking
            .validate()
            .map_err(SummarizeError::InvalidConfig)?;

        let chunks = chunk_text(text, &config.chunking);
        tracing::debug!(
            target: "summarize",
            "prepared {} chunks (window {}, overlap {})",
            chunks.len(),
            config.chunking.window_size,
            config.chunking.overlap_size
        );

        Ok(Self {
            provider,
            config,
            chunks,
            chunk_summaries: Vec::new(),
            mapped: false,
        })
    }

    /// Create a summarizer from an ordered sequence of lines, joined with
    /// newlines into a single character stream before chunking.
    pub fn from_lines(
        provider: G,
        lines: &[String],
        config: SummarizerConfig,
    ) -> Result<Self, SummarizeError> {
        Self::new(provider, &lines.join("\n"), config)
    }

    /// Number of chunks the input was cut into.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// The memoized per-chunk summaries (empty until the first map pass).
    pub fn chunk_summaries(&self) -> &[String] {
        &self.chunk_summaries
    }

    /// Produce the final summary.
    ///
    /// The first invocation runs the map pass (one sequential generation
    /// call per chunk, with the configured inter-call delay; failed or
    /// empty chunks are logged and skipped) followed by the reduce call.
    /// Subsequent invocations reuse the memoized chunk summaries and only
    /// re-run the reduce. Reducing zero chunk summaries is a typed
    /// failure, never a silent empty summary.
    pub fn summarize(&mut self) -> Result<String, SummarizeError> {
        if !self.mapped {
            self.run_map();
        }

        if self.chunk_summaries.is_empty() {
            return Err(SummarizeError::NoChunkSummaries);
        }

        let combined = self.chunk_summaries.join(SUMMARY_SEPARATOR);
        let prompt = self.config.final_template.render(&combined);

        tracing::info!(target: "summarize", "generating final summary");
        let summary = self.provider.generate(&prompt)?;
        Ok(summary)
    }

    /// Map pass: one generation call per chunk, strictly sequential.
    ///
    /// A chunk whose call fails or comes back empty contributes nothing and
    /// is not retried; one bad chunk must not abort a long-document
    /// summary. This is the single documented place a provider error is
    /// swallowed.
    fn run_map(&mut self) {
        let total = self.chunks.len();
        for (i, chunk) in self.chunks.iter().enumerate() {
            tracing::info!(target: "summarize", "summarizing chunk {} of {total}", i + 1);

            let prompt = self.config.chunk_template.render(&chunk.content);
            match self.provider.generate(&prompt) {
                Ok(summary) if !summary.trim().is_empty() => {
                    self.chunk_summaries.push(summary);
                }
                Ok(_) => {
                    tracing::warn!(
                        target: "summarize",
                        "chunk {} of {total} produced no text, skipping",
                        i + 1
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        target: "summarize",
                        "chunk {} of {total} failed, skipping: {e}",
                        i + 1
                    );
                }
            }

            if i + 1 < total && !self.config.chunk_delay.is_zero() {
                std::thread::sleep(self.config.chunk_delay);
            }
        }

        self.mapped = true;
    }
}
