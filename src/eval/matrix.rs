//! Dense row-major matrix for score and relevance inputs.

use crate::error::{MetricsError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::path::Path;

/// `[queries × items]` matrix of f64 values, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Build from a flat row-major buffer. `data.len()` must equal `rows * cols`.
    /// A matrix with rows needs at least one item column; `0 x 0` is the empty
    /// query set.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if cols == 0 && rows > 0 {
            return Err(MetricsError::InvalidInput(
                "matrix must have at least one item column".to_string(),
            ));
        }
        let len = rows.checked_mul(cols).ok_or_else(|| {
            MetricsError::InvalidInput(format!("{}x{} matrix is too large", rows, cols))
        })?;
        if data.len() != len {
            return Err(MetricsError::InvalidInput(format!(
                "buffer of {} values does not fit a {}x{} matrix",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from nested rows; all rows must have the same non-zero length.
    /// An empty row list gives a `0 x 0` matrix.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(MetricsError::InvalidInput(format!(
                    "row {} has {} items, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend(row);
        }
        Self::new(n_rows, cols, data)
    }

    /// Load a matrix stored as a JSON list of rows.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// (queries, items)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Panics if `i >= self.rows()`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // cols is only 0 for the empty 0 x 0 matrix, whose data is empty
        self.data.chunks_exact(self.cols.max(1))
    }

    /// Returns `DimensionMismatch` unless `other` has the same shape as `self`.
    pub fn ensure_same_shape(&self, other: &Matrix) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(MetricsError::DimensionMismatch {
                expected: self.shape(),
                actual: other.shape(),
            });
        }
        Ok(())
    }

    /// Copy of `self` with every cell where `seen > 0` set to `-inf`, so items a
    /// user has already interacted with never enter the top-k.
    pub fn mask_seen(&self, seen: &Matrix) -> Result<Matrix> {
        self.ensure_same_shape(seen)?;
        let data = self
            .data
            .iter()
            .zip(&seen.data)
            .map(|(&score, &s)| if s > 0.0 { f64::NEG_INFINITY } else { score })
            .collect();
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }
}

/// Indices of the `k` highest values in `row`, best first.
///
/// The sort is stable, so equal scores keep their original index order. NaN
/// sorts after every number. `k` larger than the row is truncated.
pub fn top_k_indices(row: &[f64], k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..row.len()).collect();
    idx.sort_by(|&a, &b| descending(row[a], row[b]));
    idx.truncate(k);
    idx
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

impl Serialize for Matrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_rows().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Matrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let rows = Vec::<Vec<f64>>::deserialize(deserializer)?;
        Matrix::from_rows(rows).map_err(serde::de::Error::custom)
    }
}
