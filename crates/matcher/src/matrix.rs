use crate::error::MatchError;

/// Dense row-major n×m similarity matrix. Higher = more similar.
///
/// Immutable once built. Non-finite inputs are replaced with the sentinel so
/// the solver only ever sees finite costs.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
    failed_cells: usize,
}

impl SimilarityMatrix {
    /// Build from row vectors. Every row must have `cols` entries.
    pub fn from_rows(rows: Vec<Vec<f64>>, cols: usize, sentinel: f64) -> Result<Self, MatchError> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(MatchError::Scorer(format!(
                    "row {i} has {} scores, expected {cols}",
                    row.len()
                )));
            }
            data.extend(row);
        }
        Ok(Self::from_vec(n, cols, data, sentinel))
    }

    pub(crate) fn from_vec(rows: usize, cols: usize, mut data: Vec<f64>, sentinel: f64) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        let mut replaced = 0;
        for v in data.iter_mut() {
            if !v.is_finite() {
                *v = sentinel;
                replaced += 1;
            }
        }
        Self { rows, cols, data, failed_cells: replaced }
    }

    /// Count cells that already hold the sentinel because their scoring failed.
    pub(crate) fn with_failed_cells(mut self, failed: usize) -> Self {
        self.failed_cells += failed;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn failed_cells(&self) -> usize {
        self.failed_cells
    }
}

/// Produces a score for every (left, right) text pair.
pub trait SimilarityScorer {
    fn name(&self) -> &str;

    fn score_matrix(&self, left: &[String], right: &[String]) -> Result<SimilarityMatrix, MatchError>;
}

// ---------------------------------------------------------------------------
// Vector helpers
// ---------------------------------------------------------------------------

/// Cosine similarity of two dense vectors. Zero vectors score 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}
