//! Compressed sparse column (CSC) matrix storage.
//!
//! # Layout
//!
//! A matrix is three parallel arrays plus its shape: `col_ptr` (length
//! `ncols + 1`) brackets each column's slice of `row_idx` and `values`, and
//! within every column the row indices are strictly increasing. `values` is
//! optional: a `None` marks a pattern-only matrix whose entries all carry an
//! implicit unit value, which is what symbolic analysis works on.
//!
//! Construction validates the full invariant up front. Everything downstream
//! (elimination trees, reachability, the factorization kernels) indexes these
//! arrays directly and relies on construction having done that check.

use std::ops::Range;

use crate::error::SparseError;
use crate::scalar::Scalar;

/// Sparse matrix in compressed sparse column form.
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix<T: Scalar> {
    /// Number of rows.
    pub nrows: usize,
    /// Number of columns.
    pub ncols: usize,
    /// Column pointers, length `ncols + 1`, non-decreasing, starting at 0.
    pub col_ptr: Vec<usize>,
    /// Row index of each stored entry, strictly increasing within a column.
    pub row_idx: Vec<usize>,
    /// Entry values aligned with `row_idx`, or `None` for a pattern-only
    /// matrix.
    pub values: Option<Vec<T>>,
}

impl<T: Scalar> CscMatrix<T> {
    /// Builds a matrix from raw CSC arrays, validating the structural
    /// invariant.
    pub fn from_parts(
        nrows: usize,
        ncols: usize,
        col_ptr: Vec<usize>,
        row_idx: Vec<usize>,
        values: Option<Vec<T>>,
    ) -> Result<Self, SparseError> {
        if col_ptr.len() != ncols + 1 {
            return Err(SparseError::InvalidMatrix {
                reason: format!(
                    "column pointer array has length {}, expected ncols + 1 = {}",
                    col_ptr.len(),
                    ncols + 1
                ),
            });
        }
        if col_ptr[0] != 0 {
            return Err(SparseError::InvalidMatrix {
                reason: "column pointers must start at 0".to_string(),
            });
        }
        for j in 0..ncols {
            if col_ptr[j] > col_ptr[j + 1] {
                return Err(SparseError::InvalidMatrix {
                    reason: format!("column pointers decrease at column {}", j),
                });
            }
        }
        if col_ptr[ncols] != row_idx.len() {
            return Err(SparseError::InvalidMatrix {
                reason: format!(
                    "last column pointer is {} but {} entries are stored",
                    col_ptr[ncols],
                    row_idx.len()
                ),
            });
        }
        for j in 0..ncols {
            for p in col_ptr[j]..col_ptr[j + 1] {
                let i = row_idx[p];
                if i >= nrows {
                    return Err(SparseError::InvalidMatrix {
                        reason: format!(
                            "row index {} out of range for {} rows (column {})",
                            i, nrows, j
                        ),
                    });
                }
                if p > col_ptr[j] && row_idx[p - 1] >= i {
                    return Err(SparseError::InvalidMatrix {
                        reason: format!(
                            "row indices must be strictly increasing within column {}",
                            j
                        ),
                    });
                }
            }
        }
        if let Some(v) = &values {
            if v.len() != row_idx.len() {
                return Err(SparseError::DimensionMismatch {
                    expected: row_idx.len(),
                    found: v.len(),
                });
            }
        }
        Ok(CscMatrix {
            nrows,
            ncols,
            col_ptr,
            row_idx,
            values,
        })
    }

    /// Assembles a matrix from coordinate triplets. Entries may arrive in any
    /// order; duplicates at the same position are summed.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        rows: &[usize],
        cols: &[usize],
        vals: &[T],
    ) -> Result<Self, SparseError> {
        if rows.len() != cols.len() {
            return Err(SparseError::DimensionMismatch {
                expected: rows.len(),
                found: cols.len(),
            });
        }
        if vals.len() != rows.len() {
            return Err(SparseError::DimensionMismatch {
                expected: rows.len(),
                found: vals.len(),
            });
        }
        let mut buckets: Vec<Vec<(usize, T)>> = vec![Vec::new(); ncols];
        for k in 0..rows.len() {
            let (i, j) = (rows[k], cols[k]);
            if i >= nrows {
                return Err(SparseError::InvalidMatrix {
                    reason: format!("row index {} out of range for {} rows", i, nrows),
                });
            }
            if j >= ncols {
                return Err(SparseError::InvalidMatrix {
                    reason: format!("column index {} out of range for {} columns", j, ncols),
                });
            }
            buckets[j].push((i, vals[k]));
        }
        let mut col_ptr = Vec::with_capacity(ncols + 1);
        let mut row_idx = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len());
        col_ptr.push(0);
        for bucket in buckets.iter_mut() {
            bucket.sort_unstable_by_key(|&(i, _)| i);
            let col_start = row_idx.len();
            for &(i, v) in bucket.iter() {
                if row_idx.len() > col_start && row_idx[row_idx.len() - 1] == i {
                    let last = values.len() - 1;
                    values[last] += v;
                } else {
                    row_idx.push(i);
                    values.push(v);
                }
            }
            col_ptr.push(row_idx.len());
        }
        Ok(CscMatrix {
            nrows,
            ncols,
            col_ptr,
            row_idx,
            values: Some(values),
        })
    }

    /// Assembles a pattern-only matrix from coordinate pairs; duplicate
    /// positions collapse to a single entry.
    pub fn pattern_from_triplets(
        nrows: usize,
        ncols: usize,
        rows: &[usize],
        cols: &[usize],
    ) -> Result<Self, SparseError> {
        let ones = vec![T::one(); rows.len()];
        let m = Self::from_triplets(nrows, ncols, rows, cols, &ones)?;
        Ok(m.pattern())
    }

    /// Converts a dense row-major matrix, dropping exact zeros.
    pub fn from_dense(rows: &[Vec<T>]) -> Result<Self, SparseError> {
        let nrows = rows.len();
        let ncols = rows.first().map(Vec::len).unwrap_or(0);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != ncols {
                return Err(SparseError::InvalidMatrix {
                    reason: format!(
                        "dense row {} has length {}, expected {}",
                        i,
                        row.len(),
                        ncols
                    ),
                });
            }
        }
        let mut col_ptr = Vec::with_capacity(ncols + 1);
        let mut row_idx = Vec::new();
        let mut values = Vec::new();
        col_ptr.push(0);
        for j in 0..ncols {
            for (i, row) in rows.iter().enumerate() {
                let v = row[j];
                if !v.is_zero() {
                    row_idx.push(i);
                    values.push(v);
                }
            }
            col_ptr.push(row_idx.len());
        }
        Ok(CscMatrix {
            nrows,
            ncols,
            col_ptr,
            row_idx,
            values: Some(values),
        })
    }

    /// Expands to a dense row-major matrix. Pattern-only entries expand to
    /// their implicit unit value.
    pub fn to_dense(&self) -> Vec<Vec<T>> {
        let mut out = vec![vec![T::zero(); self.ncols]; self.nrows];
        for j in 0..self.ncols {
            for p in self.col_range(j) {
                let i = self.row_idx[p];
                out[i][j] = match &self.values {
                    Some(vals) => vals[p],
                    None => T::one(),
                };
            }
        }
        out
    }

    /// Returns the same sparsity structure with the values dropped.
    pub fn pattern(&self) -> Self {
        CscMatrix {
            nrows: self.nrows,
            ncols: self.ncols,
            col_ptr: self.col_ptr.clone(),
            row_idx: self.row_idx.clone(),
            values: None,
        }
    }

    /// Transpose by counting sort; output columns come out sorted.
    pub fn transpose(&self) -> Self {
        let nnz = self.nnz();
        let mut tp = vec![0usize; self.nrows + 1];
        for &i in &self.row_idx {
            tp[i + 1] += 1;
        }
        for i in 0..self.nrows {
            tp[i + 1] += tp[i];
        }
        let mut next = tp[..self.nrows].to_vec();
        let mut ti = vec![0usize; nnz];
        let mut tv = self.values.as_ref().map(|_| vec![T::zero(); nnz]);
        for j in 0..self.ncols {
            for p in self.col_range(j) {
                let i = self.row_idx[p];
                let q = next[i];
                next[i] += 1;
                ti[q] = j;
                if let (Some(tv), Some(vals)) = (tv.as_mut(), self.values.as_ref()) {
                    tv[q] = vals[p];
                }
            }
        }
        CscMatrix {
            nrows: self.ncols,
            ncols: self.nrows,
            col_ptr: tp,
            row_idx: ti,
            values: tv,
        }
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.row_idx.len()
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// True when the matrix carries no numeric values.
    #[inline]
    pub fn is_pattern(&self) -> bool {
        self.values.is_none()
    }

    /// Index range of column `j` into `row_idx` / `values`.
    ///
    /// Panics if `j >= ncols`.
    #[inline]
    pub fn col_range(&self, j: usize) -> Range<usize> {
        self.col_ptr[j]..self.col_ptr[j + 1]
    }

    /// Numeric values, or [`SparseError::PatternOnly`] for a pattern matrix.
    pub(crate) fn require_values(&self) -> Result<&[T], SparseError> {
        match &self.values {
            Some(v) => Ok(v.as_slice()),
            None => Err(SparseError::PatternOnly),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_triplets_sorts_and_sums_duplicates() {
        // [ 1  .  4 ]
        // [ 5  2  . ]
        // [ .  .  3 ]   with A(1,0) split across two triplets
        let rows = [2, 0, 1, 1, 0, 1];
        let cols = [2, 0, 1, 0, 2, 0];
        let vals = [3.0, 1.0, 2.0, 4.0, 4.0, 1.0];
        let a = CscMatrix::from_triplets(3, 3, &rows, &cols, &vals).unwrap();
        assert_eq!(a.col_ptr, vec![0, 2, 3, 5]);
        assert_eq!(a.row_idx, vec![0, 1, 1, 0, 2]);
        assert_eq!(a.values, Some(vec![1.0, 5.0, 2.0, 4.0, 3.0]));
    }

    #[test]
    fn test_from_triplets_rejects_out_of_range() {
        let err = CscMatrix::from_triplets(2, 2, &[2], &[0], &[1.0]).unwrap_err();
        assert!(matches!(err, SparseError::InvalidMatrix { .. }));
        let err = CscMatrix::from_triplets(2, 2, &[0], &[5], &[1.0]).unwrap_err();
        assert!(matches!(err, SparseError::InvalidMatrix { .. }));
    }

    #[test]
    fn test_from_triplets_rejects_length_mismatch() {
        let err = CscMatrix::from_triplets(2, 2, &[0, 1], &[0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, SparseError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_from_parts_validates_structure() {
        // wrong pointer length
        let err = CscMatrix::<f64>::from_parts(2, 2, vec![0, 1], vec![0], None).unwrap_err();
        assert!(matches!(err, SparseError::InvalidMatrix { .. }));
        // decreasing pointers
        let err =
            CscMatrix::<f64>::from_parts(2, 2, vec![0, 2, 1], vec![0, 1], None).unwrap_err();
        assert!(matches!(err, SparseError::InvalidMatrix { .. }));
        // unsorted rows within a column
        let err =
            CscMatrix::<f64>::from_parts(2, 2, vec![0, 2, 2], vec![1, 0], None).unwrap_err();
        assert!(matches!(err, SparseError::InvalidMatrix { .. }));
        // duplicate row in a column
        let err =
            CscMatrix::<f64>::from_parts(2, 2, vec![0, 2, 2], vec![0, 0], None).unwrap_err();
        assert!(matches!(err, SparseError::InvalidMatrix { .. }));
        // value array out of step with the pattern
        let err = CscMatrix::from_parts(2, 2, vec![0, 1, 2], vec![0, 1], Some(vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, SparseError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_dense_round_trip() {
        let dense = vec![
            vec![1.0, 0.0, 2.0],
            vec![0.0, 0.0, 0.0],
            vec![3.0, 4.0, 0.0],
        ];
        let a = CscMatrix::from_dense(&dense).unwrap();
        assert_eq!(a.nnz(), 4);
        assert_eq!(a.to_dense(), dense);
    }

    #[test]
    fn test_from_dense_rejects_ragged_input() {
        let dense = vec![vec![1.0, 2.0], vec![3.0]];
        let err = CscMatrix::from_dense(&dense).unwrap_err();
        assert!(matches!(err, SparseError::InvalidMatrix { .. }));
    }

    #[test]
    fn test_pattern_expands_to_unit_values() {
        let a = CscMatrix::<f64>::pattern_from_triplets(2, 2, &[0, 1, 0], &[0, 1, 0]).unwrap();
        assert!(a.is_pattern());
        assert_eq!(a.nnz(), 2, "duplicate position must collapse");
        assert_eq!(a.to_dense(), vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_transpose_is_involutive() {
        let dense = vec![
            vec![1.0, 0.0, 2.0, 0.0],
            vec![0.0, 3.0, 0.0, 4.0],
            vec![5.0, 0.0, 6.0, 0.0],
        ];
        let a = CscMatrix::from_dense(&dense).unwrap();
        let at = a.transpose();
        assert_eq!(at.nrows, 4);
        assert_eq!(at.ncols, 3);
        assert_eq!(at.to_dense()[2][0], 2.0);
        assert_eq!(at.transpose(), a);
    }

    #[test]
    fn test_transpose_keeps_pattern_only() {
        let a = CscMatrix::<f64>::pattern_from_triplets(3, 2, &[0, 2, 1], &[0, 0, 1]).unwrap();
        let at = a.transpose();
        assert!(at.is_pattern());
        assert_eq!(at.col_ptr, vec![0, 1, 2, 3]);
        assert_eq!(at.row_idx, vec![0, 1, 0]);
    }

    #[test]
    fn test_empty_matrix() {
        let a = CscMatrix::<f64>::from_parts(0, 0, vec![0], vec![], None).unwrap();
        assert_eq!(a.nnz(), 0);
        assert!(a.is_square());
        assert!(a.to_dense().is_empty());
    }

    #[test]
    fn test_require_values() {
        let a = CscMatrix::from_triplets(1, 1, &[0], &[0], &[2.0]).unwrap();
        assert_eq!(a.require_values().unwrap(), &[2.0]);
        assert_eq!(a.pattern().require_values().unwrap_err(), SparseError::PatternOnly);
    }
}
