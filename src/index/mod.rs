//! Knowledge index: texts, normalized embeddings, dual-metric search.
//!
//! A [`KnowledgeIndex`] owns an ordered text store and two structurally
//! independent flat distance structures (Euclidean and inner product) built
//! over the same L2-normalized vectors. It grows only via [`KnowledgeIndex::add`],
//! answers top-k queries via [`KnowledgeIndex::search`], and persists as a
//! whole-state snapshot.

pub mod cache;
pub mod flat;
pub mod snapshot;

pub use cache::IndexCache;
pub use flat::{FlatIndex, Metric, normalize};
pub use snapshot::{SNAPSHOT_VERSION, Snapshot, SnapshotError};

use std::path::Path;

use parking_lot::RwLock;
use thiserror::Error;

use crate::providers::{EmbeddingProvider, ProviderError};

/// Error type for index operations.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

pub type IndexResult<T> = Result<T, IndexError>;

/// Metric selector for [`KnowledgeIndex::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMetric {
    /// Euclidean distance, closest first.
    L2,
    /// Inner product, highest first.
    Ip,
    /// The l2 ranked list immediately followed by the ip ranked list.
    /// Duplicates across the two sublists are expected and kept; this is a
    /// pass-through, not a merged top-k.
    Both,
}

/// Populated state: established dimension, both distance structures, and
/// the text store. Their row counts are equal at all times.
#[derive(Debug)]
struct IndexState {
    dimension: usize,
    l2: FlatIndex,
    ip: FlatIndex,
    texts: Vec<String>,
}

impl IndexState {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            l2: FlatIndex::new(Metric::L2, dimension),
            ip: FlatIndex::new(Metric::Ip, dimension),
            texts: Vec::new(),
        }
    }
}

/// Growable, persistable, searchable collection of (text, normalized
/// embedding) pairs.
///
/// `search` takes a read lock and is safe for concurrent readers; `add`,
/// `export`, and `import` take the write lock, quiescing readers, so the
/// three constituent structures can never desynchronize.
#[derive(Debug)]
pub struct KnowledgeIndex<E: EmbeddingProvider> {
    provider: E,
    state: RwLock<Option<IndexState>>,
}

impl<E: EmbeddingProvider> KnowledgeIndex<E> {
    /// Create an empty index. The vector width is fixed by the first `add`.
    pub fn new(provider: E) -> Self {
        Self {
            provider,
            state: RwLock::new(None),
        }
    }

    /// Number of stored texts.
    pub fn len(&self) -> usize {
        self.state.read().as_ref().map_or(0, |s| s.texts.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Established vector width, if any text has been added.
    pub fn dimension(&self) -> Option<usize> {
        self.state.read().as_ref().map(|s| s.dimension)
    }

    /// Identity of the embedding model backing this index.
    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    /// Embed, normalize, and append a batch of texts.
    ///
    /// The append is atomic across both distance structures and the text
    /// store: embeddings are computed and validated against the established
    /// dimension before any state is touched, so a provider failure or a
    /// [`IndexError::DimensionMismatch`] leaves the index unchanged. An
    /// empty batch is a no-op.
    pub fn add(&self, texts: &[String]) -> IndexResult<()> {
        if texts.is_empty() {
            return Ok(());
        }

        let mut vectors = self.provider.encode(texts)?;
        if vectors.len() != texts.len() {
            return Err(IndexError::Provider(ProviderError::MalformedResponse(
                format!("expected {} embeddings, got {}", texts.len(), vectors.len()),
            )));
        }
        for vector in &mut vectors {
            normalize(vector);
        }

        let mut state = self.state.write();
        let expected = match state.as_ref() {
            Some(s) => s.dimension,
            None => vectors[0].len(),
        };
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(IndexError::DimensionMismatch {
                expected,
                got: bad.len(),
            });
        }

        let state = state.get_or_insert_with(|| IndexState::new(expected));
        state.l2.add_rows(&vectors);
        state.ip.add_rows(&vectors);
        state.texts.extend(texts.iter().cloned());

        debug_assert_eq!(state.texts.len(), state.l2.rows());
        debug_assert_eq!(state.texts.len(), state.ip.rows());

        tracing::debug!(
            target: "index",
            "added {} texts ({} total, dim {})",
            vectors.len(),
            state.texts.len(),
            state.dimension
        );

        Ok(())
    }

    /// Top-k similarity search.
    ///
    /// The query is embedded and normalized exactly like stored texts, so
    /// inner product approximates cosine similarity and Euclidean distance
    /// stays a monotonic function of it. Returns at most `k` texts (`2k`
    /// for [`SearchMetric::Both`]); an empty index yields an empty vec.
    pub fn search(&self, query: &str, k: usize, metric: SearchMetric) -> IndexResult<Vec<String>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_batch = [query.to_string()];
        let mut query_vector = self
            .provider
            .encode(&query_batch)?
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;
        normalize(&mut query_vector);

        let state = self.state.read();
        let Some(state) = state.as_ref() else {
            return Ok(Vec::new());
        };
        if query_vector.len() != state.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: state.dimension,
                got: query_vector.len(),
            });
        }

        let mut results = Vec::new();
        if matches!(metric, SearchMetric::L2 | SearchMetric::Both) {
            for (row, _) in state.l2.search(&query_vector, k) {
                results.push(state.texts[row].clone());
            }
        }
        if matches!(metric, SearchMetric::Ip | SearchMetric::Both) {
            for (row, _) in state.ip.search(&query_vector, k) {
                results.push(state.texts[row].clone());
            }
        }

        Ok(results)
    }

    /// Write the complete index state to a snapshot file.
    ///
    /// Always a whole-state rewrite; there is no incremental log.
    pub fn export(&self, path: &Path) -> IndexResult<()> {
        let state = self.state.write(); // quiesce readers during snapshot I/O
        let snapshot = match state.as_ref() {
            Some(s) => Snapshot {
                version: SNAPSHOT_VERSION,
                model_id: self.provider.model_id().to_string(),
                dimension: s.dimension,
                texts: s.texts.clone(),
                vectors: (0..s.l2.rows()).map(|row| s.l2.row(row).to_vec()).collect(),
            },
            None => Snapshot {
                version: SNAPSHOT_VERSION,
                model_id: self.provider.model_id().to_string(),
                dimension: 0,
                texts: Vec::new(),
                vectors: Vec::new(),
            },
        };
        snapshot.write(path)?;

        tracing::info!(
            target: "index",
            "exported {} texts to {}",
            snapshot.texts.len(),
            path.display()
        );
        Ok(())
    }

    /// Rebuild an index from a snapshot file.
    ///
    /// Both distance structures are reconstructed from the stored normalized
    /// vectors; the result answers every subsequent `search` identically to
    /// the exported index. The provider must match the snapshot's model
    /// identity, otherwise queries would land in the wrong embedding space.
    pub fn import(path: &Path, provider: E) -> IndexResult<Self> {
        let snapshot = Snapshot::read(path)?;
        if snapshot.model_id != provider.model_id() {
            return Err(IndexError::Snapshot(SnapshotError::ModelMismatch {
                snapshot: snapshot.model_id,
                provider: provider.model_id().to_string(),
            }));
        }

        let state = if snapshot.texts.is_empty() {
            None
        } else {
            let mut state = IndexState::new(snapshot.dimension);
            state.l2.add_rows(&snapshot.vectors);
            state.ip.add_rows(&snapshot.vectors);
            state.texts = snapshot.texts;
            Some(state)
        };

        tracing::info!(
            target: "index",
            "imported {} texts from {}",
            state.as_ref().map_or(0, |s| s.texts.len()),
            path.display()
        );

        Ok(Self {
            provider,
            state: RwLock::new(state),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderResult;

    /// Deterministic embedding provider for tests: each text maps to a
    /// fixed 4-wide vector derived from its bytes, so distinct texts get
    /// distinct directions and identical texts collide exactly.
    struct HashEmbedder;

    impl EmbeddingProvider for HashEmbedder {
        fn encode(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| embed_one(t)).collect())
        }

        fn model_id(&self) -> &str {
            "hash-embedder-v1"
        }
    }

    fn embed_one(text: &str) -> Vec<f32> {
        let mut v = [0.0f32; 4];
        for (i, b) in text.bytes().enumerate() {
            v[i % 4] += f32::from(b) * ((i / 4 + 1) as f32);
        }
        v.to_vec()
    }

    /// Provider whose vector width changes after the first batch.
    struct ShiftingDimEmbedder;

    impl EmbeddingProvider for ShiftingDimEmbedder {
        fn encode(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| if t.starts_with('!') { vec![1.0; 3] } else { vec![1.0; 4] })
                .collect())
        }

        fn model_id(&self) -> &str {
            "shifting"
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_self_similarity() {
        let index = KnowledgeIndex::new(HashEmbedder);
        index
            .add(&strings(&["alpha text", "beta text", "gamma text"]))
            .unwrap();

        let results = index.search("alpha text", 1, SearchMetric::L2).unwrap();
        assert_eq!(results, vec!["alpha text".to_string()]);
    }

    #[test]
    fn test_empty_add_is_noop() {
        let index = KnowledgeIndex::new(HashEmbedder);
        index.add(&[]).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.dimension(), None);
    }

    #[test]
    fn test_empty_index_search_returns_empty() {
        let index = KnowledgeIndex::new(HashEmbedder);
        let results = index.search("anything", 5, SearchMetric::Both).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_k_larger_than_corpus() {
        let index = KnowledgeIndex::new(HashEmbedder);
        index.add(&strings(&["one", "two", "three"])).unwrap();

        let results = index.search("one", 100, SearchMetric::Ip).unwrap();
        assert_eq!(results.len(), 3);
        let unique: std::collections::HashSet<_> = results.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_both_concatenates_sublists() {
        let index = KnowledgeIndex::new(HashEmbedder);
        index.add(&strings(&["one", "two", "three"])).unwrap();

        let results = index.search("one", 2, SearchMetric::Both).unwrap();
        // l2 top-2 followed by ip top-2, duplicates kept
        assert_eq!(results.len(), 4);
        assert_eq!(results[0], results[2]);
    }

    #[test]
    fn test_metric_consistency() {
        let index = KnowledgeIndex::new(HashEmbedder);
        index
            .add(&strings(&["apple pie", "banana bread", "carrot cake", "dates"]))
            .unwrap();

        let l2 = index.search("apple tart", 4, SearchMetric::L2).unwrap();
        let ip = index.search("apple tart", 4, SearchMetric::Ip).unwrap();
        assert_eq!(l2, ip);
    }

    #[test]
    fn test_dimension_mismatch_leaves_index_unchanged() {
        let index = KnowledgeIndex::new(ShiftingDimEmbedder);
        index.add(&strings(&["first"])).unwrap();
        assert_eq!(index.dimension(), Some(4));

        let err = index.add(&strings(&["!second", "third"])).unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch { expected: 4, got: 3 }
        ));
        // No partial commit
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_mixed_width_batch_rejected_atomically() {
        let index = KnowledgeIndex::new(ShiftingDimEmbedder);
        let err = index.add(&strings(&["ok", "!bad"])).unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
        assert!(index.is_empty());
    }
}
