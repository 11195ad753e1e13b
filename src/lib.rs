//! Text knowledge index and hierarchical summarizer.
//!
//! The crate has two halves that share a pair of narrow provider traits:
//!
//! - [`KnowledgeIndex`] stores texts with their L2-normalized embeddings and
//!   answers exhaustive top-k similarity queries under Euclidean and
//!   inner-product metrics, with whole-snapshot persistence.
//! - [`HierarchicalSummarizer`] reduces an arbitrarily long text to one
//!   summary via character-window chunking, a sequential per-chunk "map"
//!   pass, and a single "reduce" pass over the collected chunk summaries.
//!
//! Embedding and generation backends are injected through
//! [`EmbeddingProvider`] and [`GenerationProvider`], so the core never
//! depends on a specific model runtime.

pub mod config;
pub mod index;
pub mod logging;
pub mod providers;
pub mod summarize;

pub use config::Settings;
pub use index::{IndexCache, IndexError, KnowledgeIndex, SearchMetric, Snapshot, SnapshotError};
pub use providers::{
    EmbeddingProvider, FastEmbedProvider, GeminiProvider, GenerationProvider, ProviderError,
    RetryPolicy, Retrying,
};
pub use summarize::{
    ChunkerConfig, HierarchicalSummarizer, PromptTemplate, SummarizeError, SummarizerConfig,
};
