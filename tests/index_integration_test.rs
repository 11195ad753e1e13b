//! Knowledge index integration tests.
//!
//! Exercises the public API end to end with a deterministic embedding
//! provider: build, dual-metric search, snapshot round-trip, and the
//! path-keyed cache. No network and no model downloads.

use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;

use textkdb::providers::ProviderResult;
use textkdb::{EmbeddingProvider, IndexCache, IndexError, KnowledgeIndex, SearchMetric, SnapshotError};

/// Deterministic bag-of-letters embedder: 26 dimensions, one per letter.
/// Texts sharing letters land close together; the vector is fully
/// determined by the text, so re-embedding a query is reproducible.
#[derive(Debug)]
struct LetterEmbedder {
    calls: AtomicUsize,
}

impl LetterEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl EmbeddingProvider for LetterEmbedder {
    fn encode(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; 26];
                for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
                    v[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
                }
                v
            })
            .collect())
    }

    fn model_id(&self) -> &str {
        "letter-embedder-v1"
    }
}

fn corpus() -> Vec<String> {
    [
        "the quick brown fox",
        "a lazy dog sleeps",
        "quick foxes jump high",
        "zebras graze at dawn",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[test]
fn test_self_similarity_top_hit() {
    let index = KnowledgeIndex::new(LetterEmbedder::new());
    index.add(&corpus()).unwrap();

    for text in corpus() {
        let results = index.search(&text, 1, SearchMetric::L2).unwrap();
        assert_eq!(results, vec![text]);
    }
}

#[test]
fn test_both_metric_is_concatenation() {
    let index = KnowledgeIndex::new(LetterEmbedder::new());
    index.add(&corpus()).unwrap();

    let l2 = index.search("quick fox", 2, SearchMetric::L2).unwrap();
    let ip = index.search("quick fox", 2, SearchMetric::Ip).unwrap();
    let both = index.search("quick fox", 2, SearchMetric::Both).unwrap();

    assert_eq!(both.len(), 4);
    assert_eq!(&both[..2], l2.as_slice());
    assert_eq!(&both[2..], ip.as_slice());
}

#[test]
fn test_l2_and_ip_rankings_agree() {
    let index = KnowledgeIndex::new(LetterEmbedder::new());
    index.add(&corpus()).unwrap();

    let l2 = index.search("fox jumping quickly", 4, SearchMetric::L2).unwrap();
    let ip = index.search("fox jumping quickly", 4, SearchMetric::Ip).unwrap();
    assert_eq!(l2, ip);
}

#[test]
fn test_incremental_adds_preserve_order_identity() {
    let index = KnowledgeIndex::new(LetterEmbedder::new());
    index.add(&corpus()[..2].to_vec()).unwrap();
    index.add(&corpus()[2..].to_vec()).unwrap();

    assert_eq!(index.len(), 4);
    let results = index.search("zebras graze at dawn", 1, SearchMetric::Ip).unwrap();
    assert_eq!(results, vec!["zebras graze at dawn".to_string()]);
}

#[test]
fn test_snapshot_roundtrip_identical_results() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kdb.json");

    let index = KnowledgeIndex::new(LetterEmbedder::new());
    index.add(&corpus()).unwrap();
    index.export(&path).unwrap();

    let imported = KnowledgeIndex::import(&path, LetterEmbedder::new()).unwrap();
    assert_eq!(imported.len(), index.len());
    assert_eq!(imported.dimension(), index.dimension());

    for query in ["quick fox", "sleepy dog", "zebra", ""] {
        for metric in [SearchMetric::L2, SearchMetric::Ip, SearchMetric::Both] {
            for k in [1, 3, 100] {
                assert_eq!(
                    index.search(query, k, metric).unwrap(),
                    imported.search(query, k, metric).unwrap(),
                    "mismatch for query={query:?} k={k} metric={metric:?}"
                );
            }
        }
    }
}

#[test]
fn test_empty_index_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");

    let index = KnowledgeIndex::new(LetterEmbedder::new());
    index.export(&path).unwrap();

    let imported = KnowledgeIndex::import(&path, LetterEmbedder::new()).unwrap();
    assert!(imported.is_empty());
    assert!(imported.search("anything", 5, SearchMetric::Both).unwrap().is_empty());
}

#[test]
fn test_reexport_rewrites_full_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kdb.json");

    let index = KnowledgeIndex::new(LetterEmbedder::new());
    index.add(&corpus()[..2].to_vec()).unwrap();
    index.export(&path).unwrap();

    index.add(&corpus()[2..].to_vec()).unwrap();
    index.export(&path).unwrap();

    let imported = KnowledgeIndex::import(&path, LetterEmbedder::new()).unwrap();
    assert_eq!(imported.len(), 4);
}

#[test]
fn test_import_rejects_model_mismatch() {
    #[derive(Debug)]
    struct OtherModel;
    impl EmbeddingProvider for OtherModel {
        fn encode(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0; 26]).collect())
        }
        fn model_id(&self) -> &str {
            "other-model"
        }
    }

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kdb.json");

    let index = KnowledgeIndex::new(LetterEmbedder::new());
    index.add(&corpus()).unwrap();
    index.export(&path).unwrap();

    let err = KnowledgeIndex::import(&path, OtherModel).unwrap_err();
    assert!(matches!(
        err,
        IndexError::Snapshot(SnapshotError::ModelMismatch { .. })
    ));
}

#[test]
fn test_import_rejects_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("corrupt.json");
    std::fs::write(&path, "not json at all").unwrap();

    let err = KnowledgeIndex::import(&path, LetterEmbedder::new()).unwrap_err();
    assert!(matches!(err, IndexError::Snapshot(SnapshotError::Json(_))));
}

#[test]
fn test_cache_imports_once_per_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kdb.json");

    let index = KnowledgeIndex::new(LetterEmbedder::new());
    index.add(&corpus()).unwrap();
    index.export(&path).unwrap();

    let cache: IndexCache<LetterEmbedder> = IndexCache::new();
    let first = cache.load(&path, || Ok(LetterEmbedder::new())).unwrap();
    let second = cache.load(&path, || panic!("provider rebuilt on cache hit")).unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    cache.invalidate(&path);
    assert!(cache.is_empty());
}

#[test]
fn test_concurrent_readers() {
    use std::sync::Arc;

    let index = Arc::new(KnowledgeIndex::new(LetterEmbedder::new()));
    index.add(&corpus()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let results = index.search("quick fox", 2, SearchMetric::Both).unwrap();
                    assert_eq!(results.len(), 4);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
