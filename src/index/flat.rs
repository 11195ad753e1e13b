//! Exhaustive flat distance structures.
//!
//! A [`FlatIndex`] is a growable row-major matrix of fixed-width vectors
//! with brute-force top-k search under one metric. Two of them, built over
//! the same normalized vectors, back the knowledge index: Euclidean
//! distance and inner product are both monotonic proxies for cosine
//! similarity once every side is L2-normalized.

/// Distance metric for a flat structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Squared Euclidean distance, smaller is closer.
    L2,
    /// Inner product, larger is closer.
    Ip,
}

/// Exhaustive nearest-neighbor structure over row-major f32 storage.
///
/// Append-only: rows are never deleted or mutated. The dimension is fixed
/// at construction and every appended row must match it.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    metric: Metric,
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty structure for vectors of the given width.
    pub fn new(metric: Metric, dimension: usize) -> Self {
        Self {
            metric,
            dimension,
            data: Vec::new(),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored rows.
    pub fn rows(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    /// Append rows. Callers must have validated the width of every vector;
    /// this is enforced with a debug assertion only, so the owning index can
    /// keep its three-part append atomic.
    pub fn add_rows(&mut self, vectors: &[Vec<f32>]) {
        for vector in vectors {
            debug_assert_eq!(vector.len(), self.dimension);
            self.data.extend_from_slice(vector);
        }
    }

    /// Borrow a stored row.
    pub fn row(&self, index: usize) -> &[f32] {
        let start = index * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// Exhaustive top-k search.
    ///
    /// Returns `(row, score)` pairs: ascending distance for [`Metric::L2`],
    /// descending inner product for [`Metric::Ip`]. At most `min(k, rows)`
    /// results; an empty structure yields an empty vec.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        debug_assert_eq!(query.len(), self.dimension);

        let mut scored: Vec<(usize, f32)> = (0..self.rows())
            .map(|row| (row, self.score(query, row)))
            .collect();

        match self.metric {
            Metric::L2 => {
                scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            }
            Metric::Ip => {
                scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
            }
        }

        scored.truncate(k);
        scored
    }

    fn score(&self, query: &[f32], row: usize) -> f32 {
        let stored = self.row(row);
        match self.metric {
            Metric::L2 => query
                .iter()
                .zip(stored)
                .map(|(q, s)| {
                    let d = q - s;
                    d * d
                })
                .sum(),
            Metric::Ip => query.iter().zip(stored).map(|(q, s)| q * s).sum(),
        }
    }
}

/// L2-normalize a vector in place. Zero vectors are left unchanged,
/// matching faiss `normalize_L2`.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}
