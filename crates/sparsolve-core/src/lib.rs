//! Sparse direct factorization over compressed sparse column matrices.
//!
//! # Overview
//!
//! The crate is organised around one storage type, [`CscMatrix`], and two
//! direct factorizations on top of it:
//!
//! - [`cholesky`] factors a Hermitian positive definite matrix given in its
//!   upper triangle as `L * L^H`, after a separate symbolic analysis
//!   ([`symbolic`]) that predicts the exact nonzero structure of `L` from
//!   the elimination tree.
//! - [`lu`] factors a general square matrix as `L * U` with threshold
//!   partial pivoting, discovering the structure of each column on the fly.
//!
//! Both accept a fill-reducing ordering from [`ordering`], and both reduce a
//! right-hand side through the triangular substitutions in [`solve`]. The
//! substitutions also come in enumerating variants that return every
//! solution of a singular triangular system rather than failing at the first
//! zero pivot.
//!
//! Matrices are generic over [`Scalar`], implemented for `f64` and
//! [`num_complex::Complex64`]; real inputs pay nothing for the complex
//! support.
//!
//! # Example
//!
//! ```
//! use sparsolve_core::{CscMatrix, OrderMode, lusolve};
//!
//! let a = CscMatrix::from_dense(&[
//!     vec![4.0, 1.0, 0.0],
//!     vec![1.0, 4.0, 1.0],
//!     vec![0.0, 1.0, 4.0],
//! ])
//! .unwrap();
//! let b = [6.0, 13.0, 18.0];
//! let x = lusolve(&a, &b, OrderMode::MinDegreeSum, 0.001).unwrap();
//! for (xi, want) in x.iter().zip([1.0, 2.0, 4.0]) {
//!     assert!((xi - want).abs() < 1e-10);
//! }
//! ```
//!
//! # References
//!
//! - Timothy A. Davis, "Direct Methods for Sparse Linear Systems", SIAM,
//!   2006.
//! - John R. Gilbert and Tim Peierls, "Sparse partial pivoting in time
//!   proportional to arithmetic operations", SIAM J. Sci. Statist. Comput.,
//!   1988.

pub mod cholesky;
pub mod csc;
pub mod error;
pub mod lu;
pub mod ordering;
pub mod permute;
mod reach;
pub mod scalar;
pub mod solve;
pub mod symbolic;

pub use cholesky::{CholeskyFactor, CholeskyOutcome};
pub use csc::CscMatrix;
pub use error::SparseError;
pub use lu::LuFactor;
pub use ordering::OrderMode;
pub use scalar::Scalar;
pub use solve::lusolve;
pub use symbolic::SymbolicCholesky;
