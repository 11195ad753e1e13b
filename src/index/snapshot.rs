//! Versioned snapshot schema for index persistence.
//!
//! A snapshot is explicit data, not a serialized object graph: the model
//! identity, the ordered text store, and the ordered normalized vectors.
//! Both distance structures are rebuilt from the vectors on import, so the
//! storage format stays decoupled from the in-memory representation.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Error type for snapshot I/O and validation.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),

    #[error("Snapshot was built with model '{snapshot}' but provider is '{provider}'")]
    ModelMismatch { snapshot: String, provider: String },
}

/// Complete durable state of a knowledge index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version for forward-compatibility checks.
    pub version: u32,

    /// Identity of the embedding model the vectors came from.
    pub model_id: String,

    /// Vector width. Zero for an empty index.
    pub dimension: usize,

    /// Ordered text store; position is identity.
    pub texts: Vec<String>,

    /// Ordered L2-normalized vectors, one per text.
    pub vectors: Vec<Vec<f32>>,
}

impl Snapshot {
    /// Write the full snapshot to a file. Always a whole-state rewrite.
    pub fn write(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Read and validate a snapshot from a file.
    pub fn read(path: &Path) -> Result<Self, SnapshotError> {
        let file = File::open(path)?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Structural validation: version, parallel-array lengths, row widths.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }

        if self.texts.len() != self.vectors.len() {
            return Err(SnapshotError::Corrupt(format!(
                "{} texts but {} vectors",
                self.texts.len(),
                self.vectors.len()
            )));
        }

        if let Some(row) = self
            .vectors
            .iter()
            .position(|v| v.len() != self.dimension)
        {
            return Err(SnapshotError::Corrupt(format!(
                "vector {row} has width {} (expected {})",
                self.vectors[row].len(),
                self.dimension
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            model_id: "AllMiniLML6V2".to_string(),
            dimension: 2,
            texts: vec!["a".to_string(), "b".to_string()],
            vectors: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        }
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");

        let snapshot = sample();
        snapshot.write(&path).unwrap();

        let loaded = Snapshot::read(&path).unwrap();
        assert_eq!(loaded.texts, snapshot.texts);
        assert_eq!(loaded.vectors, snapshot.vectors);
        assert_eq!(loaded.model_id, snapshot.model_id);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut snapshot = sample();
        snapshot.version = 99;
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_rejects_length_disagreement() {
        let mut snapshot = sample();
        snapshot.vectors.pop();
        assert!(matches!(snapshot.validate(), Err(SnapshotError::Corrupt(_))));
    }

    #[test]
    fn test_rejects_bad_row_width() {
        let mut snapshot = sample();
        snapshot.vectors[1] = vec![0.0; 3];
        assert!(matches!(snapshot.validate(), Err(SnapshotError::Corrupt(_))));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "{\"version\": 1, \"model").unwrap();
        assert!(matches!(Snapshot::read(&path), Err(SnapshotError::Json(_))));
    }
}
