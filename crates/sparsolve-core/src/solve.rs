//! Triangular substitution and the one-call linear solver.
//!
//! [`lsolve`] and [`usolve`] are ordinary forward and backward column
//! substitutions. They read only the relevant triangle of their input, so a
//! factor stored inside a larger matrix, or a full matrix whose other
//! triangle is garbage, solves correctly. Components of the right-hand side
//! that are already zero skip their column entirely; consequently a zero
//! pivot only raises [`SparseError::Singular`] when the substitution
//! actually needs it.
//!
//! [`lsolve_all`] and [`usolve_all`] enumerate *every* solution of a
//! singular triangular system instead of failing. Each zero pivot met with a
//! zero residual is a free variable: the current solution set keeps a branch
//! with that component at zero and adds one branch with it set to one, so
//! each degree of freedom contributes exactly one extra generator. A zero
//! pivot against a nonzero residual discards that candidate; if every
//! candidate dies the system is inconsistent and the result is empty.
//!
//! [`lusolve`] wires ordering, LU factorization, and the two substitutions
//! into the usual one-shot `A * x = b` entry point.

use crate::csc::CscMatrix;
use crate::error::SparseError;
use crate::lu;
use crate::ordering::OrderMode;
use crate::scalar::Scalar;

fn check_system<T: Scalar>(m: &CscMatrix<T>, b_len: usize) -> Result<(), SparseError> {
    if !m.is_square() {
        return Err(SparseError::NotSquare {
            rows: m.nrows,
            cols: m.ncols,
        });
    }
    if b_len != m.nrows {
        return Err(SparseError::DimensionMismatch {
            expected: m.nrows,
            found: b_len,
        });
    }
    Ok(())
}

/// Locates the diagonal entry of lower-triangular column `j` and the range
/// of entries strictly below it; entries above the diagonal are skipped.
fn split_lower_column<T: Scalar>(
    l: &CscMatrix<T>,
    vals: &[T],
    j: usize,
) -> (Option<T>, std::ops::Range<usize>) {
    let (s, e) = (l.col_ptr[j], l.col_ptr[j + 1]);
    let mut p = s;
    while p < e && l.row_idx[p] < j {
        p += 1;
    }
    if p < e && l.row_idx[p] == j {
        (Some(vals[p]), (p + 1)..e)
    } else {
        (None, p..e)
    }
}

/// Locates the diagonal entry of upper-triangular column `j` and the range
/// of entries strictly above it; entries below the diagonal are skipped.
fn split_upper_column<T: Scalar>(
    u: &CscMatrix<T>,
    vals: &[T],
    j: usize,
) -> (Option<T>, std::ops::Range<usize>) {
    let (s, e) = (u.col_ptr[j], u.col_ptr[j + 1]);
    let mut p = e;
    while p > s && u.row_idx[p - 1] > j {
        p -= 1;
    }
    if p > s && u.row_idx[p - 1] == j {
        (Some(vals[p - 1]), s..(p - 1))
    } else {
        (None, s..p)
    }
}

/// Forward substitution `L * x = b` for a lower triangular matrix.
pub fn lsolve<T: Scalar>(l: &CscMatrix<T>, b: &[T]) -> Result<Vec<T>, SparseError> {
    check_system(l, b.len())?;
    let vals = l.require_values()?;
    let mut x = b.to_vec();
    for j in 0..l.ncols {
        if x[j].is_zero() {
            continue;
        }
        let (diag, below) = split_lower_column(l, vals, j);
        let d = match diag {
            Some(d) if !d.is_zero() => d,
            _ => return Err(SparseError::Singular { column: j }),
        };
        let xj = x[j] / d;
        x[j] = xj;
        for q in below {
            x[l.row_idx[q]] -= vals[q] * xj;
        }
    }
    Ok(x)
}

/// Backward substitution `U * x = b` for an upper triangular matrix.
pub fn usolve<T: Scalar>(u: &CscMatrix<T>, b: &[T]) -> Result<Vec<T>, SparseError> {
    check_system(u, b.len())?;
    let vals = u.require_values()?;
    let mut x = b.to_vec();
    for j in (0..u.ncols).rev() {
        if x[j].is_zero() {
            continue;
        }
        let (diag, above) = split_upper_column(u, vals, j);
        let d = match diag {
            Some(d) if !d.is_zero() => d,
            _ => return Err(SparseError::Singular { column: j }),
        };
        let xj = x[j] / d;
        x[j] = xj;
        for q in above {
            x[u.row_idx[q]] -= vals[q] * xj;
        }
    }
    Ok(x)
}

/// All solutions of `L * x = b`, including the singular cases.
///
/// The result is a set of solution vectors: empty when the system is
/// inconsistent, one vector when the solution is unique, and one additional
/// generator per free variable otherwise.
pub fn lsolve_all<T: Scalar>(l: &CscMatrix<T>, b: &[T]) -> Result<Vec<Vec<T>>, SparseError> {
    check_system(l, b.len())?;
    let vals = l.require_values()?;
    let mut sols: Vec<Vec<T>> = vec![b.to_vec()];
    for j in 0..l.ncols {
        let (diag, below) = split_lower_column(l, vals, j);
        let pivot = diag.unwrap_or_else(T::zero);
        if !pivot.is_zero() {
            for sol in sols.iter_mut() {
                if sol[j].is_zero() {
                    continue;
                }
                let xj = sol[j] / pivot;
                sol[j] = xj;
                for q in below.clone() {
                    sol[l.row_idx[q]] -= vals[q] * xj;
                }
            }
        } else {
            // zero pivot: every candidate with a nonzero residual here is
            // inconsistent; the first consistent one spawns the branch that
            // sets this free variable to one
            let limit = sols.len();
            let mut scanned = 0;
            let mut idx = 0;
            let mut forked = false;
            while scanned < limit {
                if sols[idx][j].is_zero() {
                    if !forked {
                        forked = true;
                        let mut alt = sols[idx].clone();
                        alt[j] = T::one();
                        for q in below.clone() {
                            alt[l.row_idx[q]] -= vals[q];
                        }
                        sols.push(alt);
                    }
                    idx += 1;
                } else {
                    sols.remove(idx);
                }
                scanned += 1;
            }
            if sols.is_empty() {
                return Ok(vec![]);
            }
        }
    }
    Ok(sols)
}

/// All solutions of `U * x = b`; the mirror of [`lsolve_all`].
pub fn usolve_all<T: Scalar>(u: &CscMatrix<T>, b: &[T]) -> Result<Vec<Vec<T>>, SparseError> {
    check_system(u, b.len())?;
    let vals = u.require_values()?;
    let mut sols: Vec<Vec<T>> = vec![b.to_vec()];
    for j in (0..u.ncols).rev() {
        let (diag, above) = split_upper_column(u, vals, j);
        let pivot = diag.unwrap_or_else(T::zero);
        if !pivot.is_zero() {
            for sol in sols.iter_mut() {
                if sol[j].is_zero() {
                    continue;
                }
                let xj = sol[j] / pivot;
                sol[j] = xj;
                for q in above.clone() {
                    sol[u.row_idx[q]] -= vals[q] * xj;
                }
            }
        } else {
            let limit = sols.len();
            let mut scanned = 0;
            let mut idx = 0;
            let mut forked = false;
            while scanned < limit {
                if sols[idx][j].is_zero() {
                    if !forked {
                        forked = true;
                        let mut alt = sols[idx].clone();
                        alt[j] = T::one();
                        for q in above.clone() {
                            alt[u.row_idx[q]] -= vals[q];
                        }
                        sols.push(alt);
                    }
                    idx += 1;
                } else {
                    sols.remove(idx);
                }
                scanned += 1;
            }
            if sols.is_empty() {
                return Ok(vec![]);
            }
        }
    }
    Ok(sols)
}

/// Solves `A * x = b` by LU factorization with the given column ordering
/// and pivot threshold.
pub fn lusolve<T: Scalar>(
    a: &CscMatrix<T>,
    b: &[T],
    mode: OrderMode,
    pivot_tol: f64,
) -> Result<Vec<T>, SparseError> {
    check_system(a, b.len())?;
    let f = lu::factorize(a, mode, pivot_tol)?;
    f.solve(b)
}
