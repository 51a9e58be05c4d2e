//! Permutation vectors and permuted matrix extraction.
//!
//! A permutation is a `Vec<usize>` in destination convention: `perm[old]`
//! is the new position of row or column `old`. The inverse mapping
//! (`iperm[new] = old`) is what column-by-column extraction loops want, so
//! [`invert`] is used heavily inside the factorizations.
//!
//! [`symmetric_permute`] computes the upper triangle of `P * A * P^T` from
//! the upper triangle of `A`, conjugating entries that land in the lower
//! half, so a Hermitian matrix stays Hermitian under relabeling.

use crate::csc::CscMatrix;
use crate::error::SparseError;
use crate::scalar::Scalar;

/// Checks that `perm` is a bijection on `0..n`.
pub fn validate(perm: &[usize], n: usize) -> Result<(), SparseError> {
    if perm.len() != n {
        return Err(SparseError::InvalidPermutation {
            reason: format!("length {} does not match dimension {}", perm.len(), n),
        });
    }
    let mut seen = vec![false; n];
    for (old, &new) in perm.iter().enumerate() {
        if new >= n {
            return Err(SparseError::InvalidPermutation {
                reason: format!(
                    "entry {} at position {} is out of range for size {}",
                    new, old, n
                ),
            });
        }
        if seen[new] {
            return Err(SparseError::InvalidPermutation {
                reason: format!("destination {} appears more than once", new),
            });
        }
        seen[new] = true;
    }
    Ok(())
}

/// Inverts `perm[old] = new` into `iperm[new] = old`, validating first.
pub fn invert(perm: &[usize]) -> Result<Vec<usize>, SparseError> {
    validate(perm, perm.len())?;
    let mut iperm = vec![0usize; perm.len()];
    for (old, &new) in perm.iter().enumerate() {
        iperm[new] = old;
    }
    Ok(iperm)
}

/// Applies a row and/or column permutation, producing `B` with
/// `B[row_perm[i]][col_perm[j]] = A[i][j]`. Either permutation may be `None`
/// for the identity. Columns of the result are re-sorted.
pub fn apply<T: Scalar>(
    a: &CscMatrix<T>,
    row_perm: Option<&[usize]>,
    col_perm: Option<&[usize]>,
) -> Result<CscMatrix<T>, SparseError> {
    if let Some(rp) = row_perm {
        validate(rp, a.nrows)?;
    }
    // iperm of the column permutation tells each output column its source
    let col_source = match col_perm {
        Some(cp) => {
            validate(cp, a.ncols)?;
            let mut src = vec![0usize; a.ncols];
            for (old, &new) in cp.iter().enumerate() {
                src[new] = old;
            }
            Some(src)
        }
        None => None,
    };
    let mut col_ptr = Vec::with_capacity(a.ncols + 1);
    col_ptr.push(0);
    let mut row_idx = Vec::with_capacity(a.nnz());
    let mut values = a.values.as_ref().map(|_| Vec::with_capacity(a.nnz()));
    let mut buf: Vec<(usize, usize)> = Vec::new();
    for j in 0..a.ncols {
        let src = match &col_source {
            Some(s) => s[j],
            None => j,
        };
        buf.clear();
        for p in a.col_range(src) {
            let i = a.row_idx[p];
            let ni = match row_perm {
                Some(rp) => rp[i],
                None => i,
            };
            buf.push((ni, p));
        }
        buf.sort_unstable_by_key(|&(ni, _)| ni);
        for &(ni, p) in &buf {
            row_idx.push(ni);
            if let (Some(out), Some(av)) = (values.as_mut(), a.values.as_ref()) {
                out.push(av[p]);
            }
        }
        col_ptr.push(row_idx.len());
    }
    Ok(CscMatrix {
        nrows: a.nrows,
        ncols: a.ncols,
        col_ptr,
        row_idx,
        values,
    })
}

/// Symmetric relabeling `P * A * P^T` for a matrix stored by its upper
/// triangle. Only entries with `row <= col` are read; entries whose image
/// falls below the diagonal are mirrored back up and conjugated.
pub fn symmetric_permute<T: Scalar>(
    a: &CscMatrix<T>,
    perm: &[usize],
) -> Result<CscMatrix<T>, SparseError> {
    if !a.is_square() {
        return Err(SparseError::NotSquare {
            rows: a.nrows,
            cols: a.ncols,
        });
    }
    let n = a.ncols;
    validate(perm, n)?;

    // Pass 1: count entries landing in each destination column.
    let mut count = vec![0usize; n];
    for j in 0..n {
        let pj = perm[j];
        for p in a.col_range(j) {
            let i = a.row_idx[p];
            if i > j {
                continue;
            }
            let pi = perm[i];
            count[pi.max(pj)] += 1;
        }
    }
    let mut col_ptr = vec![0usize; n + 1];
    for j in 0..n {
        col_ptr[j + 1] = col_ptr[j] + count[j];
    }
    let nnz = col_ptr[n];

    // Pass 2: place entries, mirroring swapped coordinates into the upper
    // triangle.
    let mut next = col_ptr[..n].to_vec();
    let mut row_idx = vec![0usize; nnz];
    let mut values = a.values.as_ref().map(|_| vec![T::zero(); nnz]);
    for j in 0..n {
        let pj = perm[j];
        for p in a.col_range(j) {
            let i = a.row_idx[p];
            if i > j {
                continue;
            }
            let pi = perm[i];
            let (row, col) = if pi <= pj { (pi, pj) } else { (pj, pi) };
            let q = next[col];
            next[col] += 1;
            row_idx[q] = row;
            if let (Some(out), Some(av)) = (values.as_mut(), a.values.as_ref()) {
                out[q] = if pi <= pj { av[p] } else { av[p].conj() };
            }
        }
    }

    // Pass 3: restore sorted order within each destination column.
    for c in 0..n {
        let (s, e) = (col_ptr[c], col_ptr[c + 1]);
        if e - s < 2 {
            continue;
        }
        match values.as_mut() {
            Some(vs) => {
                let mut pairs: Vec<(usize, T)> =
                    (s..e).map(|q| (row_idx[q], vs[q])).collect();
                pairs.sort_unstable_by_key(|&(r, _)| r);
                for (k, (r, v)) in pairs.into_iter().enumerate() {
                    row_idx[s + k] = r;
                    vs[s + k] = v;
                }
            }
            None => row_idx[s..e].sort_unstable(),
        }
    }

    Ok(CscMatrix {
        nrows: n,
        ncols: n,
        col_ptr,
        row_idx,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_validate_rejects_bad_vectors() {
        assert!(validate(&[0, 1, 2], 3).is_ok());
        assert!(validate(&[0, 1], 3).is_err());
        assert!(validate(&[0, 3, 1], 3).is_err());
        assert!(validate(&[0, 1, 1], 3).is_err());
    }

    #[test]
    fn test_invert() {
        let iperm = invert(&[2, 0, 1]).unwrap();
        assert_eq!(iperm, vec![1, 2, 0]);
        assert!(invert(&[0, 0]).is_err());
    }

    #[test]
    fn test_apply_moves_entries_to_new_coordinates() {
        let a = CscMatrix::from_dense(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let b = apply(&a, Some(&[1, 0]), Some(&[1, 0])).unwrap();
        assert_eq!(b.to_dense(), vec![vec![4.0, 3.0], vec![2.0, 1.0]]);
    }

    #[test]
    fn test_apply_then_inverse_restores() {
        let a = CscMatrix::from_dense(&[
            vec![1.0, 0.0, 2.0],
            vec![0.0, 3.0, 0.0],
            vec![4.0, 0.0, 5.0],
        ])
        .unwrap();
        let p = [2, 0, 1];
        let q = [1, 2, 0];
        let b = apply(&a, Some(&p), Some(&q)).unwrap();
        let ip = invert(&p).unwrap();
        let iq = invert(&q).unwrap();
        let back = apply(&b, Some(&ip), Some(&iq)).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn test_apply_row_only() {
        let a = CscMatrix::from_dense(&[vec![1.0, 2.0], vec![0.0, 3.0]]).unwrap();
        let b = apply(&a, Some(&[1, 0]), None).unwrap();
        assert_eq!(b.to_dense(), vec![vec![0.0, 3.0], vec![1.0, 2.0]]);
    }

    #[test]
    fn test_symmetric_permute_swaps_upper_triangle() {
        // upper triangle of [[1, 2], [2, 3]]
        let a = CscMatrix::from_triplets(2, 2, &[0, 0, 1], &[0, 1, 1], &[1.0, 2.0, 3.0])
            .unwrap();
        let c = symmetric_permute(&a, &[1, 0]).unwrap();
        assert_eq!(c.to_dense(), vec![vec![3.0, 2.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_symmetric_permute_conjugates_mirrored_entries() {
        // Hermitian [[1, 2+i], [2-i, 3]] stored by its upper triangle
        let vals = [
            Complex64::new(1.0, 0.0),
            Complex64::new(2.0, 1.0),
            Complex64::new(3.0, 0.0),
        ];
        let a = CscMatrix::from_triplets(2, 2, &[0, 0, 1], &[0, 1, 1], &vals).unwrap();
        let c = symmetric_permute(&a, &[1, 0]).unwrap();
        let d = c.to_dense();
        // the off-diagonal entry now describes A[1][0] of the relabeled
        // matrix, i.e. the conjugate of the original upper entry
        assert_eq!(d[0][1], Complex64::new(2.0, -1.0));
        assert_eq!(d[0][0], Complex64::new(3.0, 0.0));
        assert_eq!(d[1][1], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_symmetric_permute_ignores_lower_entries() {
        let a = CscMatrix::from_dense(&[vec![2.0, 1.0], vec![1.0, 3.0]]).unwrap();
        let c = symmetric_permute(&a, &[0, 1]).unwrap();
        assert_eq!(c.to_dense(), vec![vec![2.0, 1.0], vec![0.0, 3.0]]);
    }

    #[test]
    fn test_symmetric_permute_requires_square() {
        let a = CscMatrix::from_dense(&[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]).unwrap();
        let err = symmetric_permute(&a, &[0, 1]).unwrap_err();
        assert!(matches!(err, SparseError::NotSquare { .. }));
    }
}
