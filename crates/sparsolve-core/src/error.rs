//! Error types shared by all factorization and solve routines.
//!
//! Every fallible entry point in this crate returns [`SparseError`]. Input
//! validation happens eagerly at the public API boundary so the inner kernels
//! can index without bounds anxiety; a `SparseError` therefore always refers
//! to the caller's arguments, never to internal state.

use std::fmt;

/// Error type for sparse matrix construction, analysis, and solves.
#[derive(Debug, Clone, PartialEq)]
pub enum SparseError {
    /// A vector or matrix dimension does not match its counterpart.
    DimensionMismatch { expected: usize, found: usize },
    /// A square matrix was required but a rectangular one was supplied.
    NotSquare { rows: usize, cols: usize },
    /// The compressed-column structure is malformed (bad pointers, unsorted
    /// or out-of-range row indices, duplicate entries).
    InvalidMatrix { reason: String },
    /// A permutation vector is not a bijection on `0..n`.
    InvalidPermutation { reason: String },
    /// A scalar argument is outside its documented range.
    InvalidArgument { reason: String },
    /// A numeric operation was requested on a pattern-only matrix.
    PatternOnly,
    /// Factorization or substitution hit a zero pivot at the given column.
    Singular { column: usize },
}

impl SparseError {
    /// True for the singular-matrix case, which callers often want to treat
    /// as data-dependent rather than as a usage bug.
    pub fn is_singular(&self) -> bool {
        matches!(self, SparseError::Singular { .. })
    }
}

impl fmt::Display for SparseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SparseError::DimensionMismatch { expected, found } => {
                write!(f, "Dimension mismatch: expected {}, found {}", expected, found)
            }
            SparseError::NotSquare { rows, cols } => {
                write!(f, "Square matrix expected, found {} x {}", rows, cols)
            }
            SparseError::InvalidMatrix { reason } => {
                write!(f, "Invalid matrix: {}", reason)
            }
            SparseError::InvalidPermutation { reason } => {
                write!(f, "Invalid permutation: {}", reason)
            }
            SparseError::InvalidArgument { reason } => {
                write!(f, "Invalid argument: {}", reason)
            }
            SparseError::PatternOnly => {
                write!(f, "Matrix is pattern-only and carries no numeric values")
            }
            SparseError::Singular { column } => {
                write!(
                    f,
                    "Linear system cannot be solved since matrix is singular (zero pivot at column {})",
                    column
                )
            }
        }
    }
}

impl std::error::Error for SparseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singular_message_names_the_column() {
        let err = SparseError::Singular { column: 3 };
        let msg = err.to_string();
        assert!(
            msg.contains("matrix is singular"),
            "unexpected message: {}",
            msg
        );
        assert!(msg.contains('3'), "column missing from message: {}", msg);
    }

    #[test]
    fn test_is_singular_discriminates() {
        assert!(SparseError::Singular { column: 0 }.is_singular());
        assert!(!SparseError::PatternOnly.is_singular());
        assert!(!SparseError::NotSquare { rows: 2, cols: 3 }.is_singular());
    }

    #[test]
    fn test_display_covers_structural_variants() {
        let err = SparseError::DimensionMismatch {
            expected: 4,
            found: 5,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 4, found 5");

        let err = SparseError::NotSquare { rows: 2, cols: 3 };
        assert_eq!(err.to_string(), "Square matrix expected, found 2 x 3");

        let err = SparseError::InvalidMatrix {
            reason: "column pointers must be non-decreasing".to_string(),
        };
        assert!(err.to_string().starts_with("Invalid matrix:"));
    }
}
