//! Sparse up-looking Cholesky factorization.
//!
//! # Overview
//!
//! Given the upper triangle of a Hermitian positive definite matrix and a
//! [`SymbolicCholesky`] analysis of its pattern, [`factorize`] computes the
//! lower factor `L` with `L * L^H = P * A * P^T`, one row of `L` per step.
//! For each column `k` the nonzero pattern of row `k` is an elimination tree
//! reach, and the numeric values fall out of a sparse triangular solve
//! against the already finished columns. Columns of `L` are emitted with the
//! diagonal entry first and rows ascending, and the column pointers are the
//! exact counts from the symbolic phase, so no reallocation ever happens.
//!
//! Indefiniteness is not an error in the usual sense: the input may simply
//! turn out not to be positive definite, and callers routinely probe for
//! that. [`factorize`] therefore returns a [`CholeskyOutcome`], reserving
//! `Err` for malformed inputs.
//!
//! One analysis can be reused across any number of numeric factorizations
//! sharing a pattern; each call allocates only its own factor and a few
//! dense work arrays.

use crate::csc::CscMatrix;
use crate::error::SparseError;
use crate::permute;
use crate::reach;
use crate::scalar::Scalar;
use crate::solve;
use crate::symbolic::SymbolicCholesky;

/// Result of a numeric Cholesky factorization attempt.
#[derive(Debug, Clone)]
pub enum CholeskyOutcome<T: Scalar> {
    /// The matrix was positive definite; the factor is complete.
    Factored(CholeskyFactor<T>),
    /// A non-positive pivot appeared at the given column of the permuted
    /// matrix; the factorization stopped there.
    NotPositiveDefinite { column: usize },
}

impl<T: Scalar> CholeskyOutcome<T> {
    pub fn is_positive_definite(&self) -> bool {
        matches!(self, CholeskyOutcome::Factored(_))
    }

    /// Unwraps the factor, or `None` if the matrix was indefinite.
    pub fn into_factor(self) -> Option<CholeskyFactor<T>> {
        match self {
            CholeskyOutcome::Factored(f) => Some(f),
            CholeskyOutcome::NotPositiveDefinite { .. } => None,
        }
    }
}

/// Lower Cholesky factor together with the permutation it was computed
/// under: `L * L^H = P * A * P^T`.
#[derive(Debug, Clone)]
pub struct CholeskyFactor<T: Scalar> {
    /// Lower triangular factor; each column stores its diagonal entry first.
    pub l: CscMatrix<T>,
    /// Fill-reducing permutation in `perm[old] = new` convention, `None` for
    /// the natural order.
    pub perm: Option<Vec<usize>>,
}

impl<T: Scalar> CholeskyFactor<T> {
    /// Solves `A * x = b` using the factor: permute, forward substitution
    /// with `L`, backward substitution with `L^H`, permute back.
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>, SparseError> {
        let n = self.l.ncols;
        if b.len() != n {
            return Err(SparseError::DimensionMismatch {
                expected: n,
                found: b.len(),
            });
        }
        let y = match &self.perm {
            Some(p) => {
                permute::validate(p, n)?;
                let mut y = vec![T::zero(); n];
                for (old, &new) in p.iter().enumerate() {
                    y[new] = b[old];
                }
                y
            }
            None => b.to_vec(),
        };
        let mut x = solve::lsolve(&self.l, &y)?;

        // backward pass against the adjoint factor: columns of L read as
        // rows of L^H, so the factor is traversed in place
        let vals = self.l.require_values()?;
        for j in (0..n).rev() {
            let start = self.l.col_ptr[j];
            let end = self.l.col_ptr[j + 1];
            if start == end || self.l.row_idx[start] != j {
                return Err(SparseError::Singular { column: j });
            }
            let mut sum = x[j];
            for p in (start + 1)..end {
                sum -= vals[p].conj() * x[self.l.row_idx[p]];
            }
            let diag = vals[start].conj();
            if diag.is_zero() {
                return Err(SparseError::Singular { column: j });
            }
            x[j] = sum / diag;
        }

        match &self.perm {
            Some(p) => {
                let mut out = vec![T::zero(); n];
                for (old, &new) in p.iter().enumerate() {
                    out[old] = x[new];
                }
                Ok(out)
            }
            None => Ok(x),
        }
    }
}

/// Numeric factorization of the upper triangle of `a` under a previously
/// computed symbolic analysis.
///
/// Only entries of `a` on or above the diagonal are read; a fully stored
/// Hermitian matrix is accepted. The analysis must describe the same
/// pattern; the exact column counts are trusted when the factor is filled.
pub fn factorize<T: Scalar>(
    a: &CscMatrix<T>,
    sym: &SymbolicCholesky,
) -> Result<CholeskyOutcome<T>, SparseError> {
    if !a.is_square() {
        return Err(SparseError::NotSquare {
            rows: a.nrows,
            cols: a.ncols,
        });
    }
    if a.ncols != sym.n {
        return Err(SparseError::DimensionMismatch {
            expected: sym.n,
            found: a.ncols,
        });
    }
    a.require_values()?;
    let n = sym.n;

    // relabel to the analysis order; the natural order borrows the input
    let c_store;
    let c = match &sym.perm {
        Some(p) => {
            c_store = permute::symmetric_permute(a, p)?;
            &c_store
        }
        None => a,
    };
    let cvals = c.require_values()?;

    let lnz = sym.lnz();
    let mut l_rows = vec![0usize; lnz];
    let mut l_vals = vec![T::zero(); lnz];
    // write cursor per column; starts at the column base, ends exactly at
    // the next column's base
    let mut cursor: Vec<usize> = sym.l_col_ptr[..n].to_vec();

    let mut x = vec![T::zero(); n];
    let mut visited = vec![0usize; n];
    let mut pattern = vec![0usize; n];

    for k in 0..n {
        // pattern of row k of L, descendants before ancestors
        let top = reach::ereach(c, k, &sym.parent, &mut visited, &mut pattern);

        // scatter the upper column k of C into the dense accumulator
        x[k] = T::zero();
        for p in c.col_range(k) {
            let i = c.row_idx[p];
            if i <= k {
                x[i] = cvals[p];
            }
        }
        let mut d = x[k];
        x[k] = T::zero();

        // triangular solve across the pattern: finish L[k][i], push its
        // update into the remaining accumulator entries, append to column i
        for p in top..n {
            let i = pattern[p];
            let lki = x[i] / l_vals[sym.l_col_ptr[i]];
            x[i] = T::zero();
            for q in (sym.l_col_ptr[i] + 1)..cursor[i] {
                x[l_rows[q]] -= l_vals[q] * lki;
            }
            d = d - lki * lki.conj();
            let q = cursor[i];
            cursor[i] += 1;
            l_rows[q] = k;
            l_vals[q] = lki.conj();
        }

        // the pivot d = A[k][k] - sum |L[k][i]|^2 must be real and positive
        if d.re() <= 0.0 || d.im() != 0.0 {
            return Ok(CholeskyOutcome::NotPositiveDefinite { column: k });
        }
        let q = cursor[k];
        cursor[k] += 1;
        l_rows[q] = k;
        l_vals[q] = T::from_re(d.re()).sqrt();
    }

    let l = CscMatrix {
        nrows: n,
        ncols: n,
        col_ptr: sym.l_col_ptr.clone(),
        row_idx: l_rows,
        values: Some(l_vals),
    };
    Ok(CholeskyOutcome::Factored(CholeskyFactor {
        l,
        perm: sym.perm.clone(),
    }))
}
