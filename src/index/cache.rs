//! Explicit snapshot cache keyed by path.
//!
//! Replaces the process-wide loaded-index singleton of earlier designs with
//! a lifetime-scoped cache the calling application owns. Each snapshot path
//! is imported at most once; repeat loads return the shared handle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{IndexResult, KnowledgeIndex};
use crate::providers::{EmbeddingProvider, ProviderError};

/// Cache of imported knowledge indexes, keyed by snapshot path.
pub struct IndexCache<E: EmbeddingProvider> {
    entries: Mutex<HashMap<PathBuf, Arc<KnowledgeIndex<E>>>>,
}

impl<E: EmbeddingProvider> IndexCache<E> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get the index for a snapshot path, importing it on first use.
    ///
    /// `make_provider` is only invoked on a cache miss, since each imported
    /// index owns its provider.
    pub fn load(
        &self,
        path: &Path,
        make_provider: impl FnOnce() -> Result<E, ProviderError>,
    ) -> IndexResult<Arc<KnowledgeIndex<E>>> {
        if let Some(index) = self.entries.lock().get(path) {
            tracing::debug!(target: "index", "cache hit for {}", path.display());
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(KnowledgeIndex::import(path, make_provider()?)?);
        self.entries
            .lock()
            .insert(path.to_path_buf(), Arc::clone(&index));
        Ok(index)
    }

    /// Drop the cached entry for a path, e.g. after re-exporting it.
    pub fn invalidate(&self, path: &Path) {
        self.entries.lock().remove(path);
    }

    /// Drop all cached entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached indexes.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<E: EmbeddingProvider> Default for IndexCache<E> {
    fn default() -> Self {
        Self::new()
    }
}
