//! Scalar abstraction over the real and complex number types the
//! factorizations operate on.
//!
//! All numeric kernels in this crate are generic over [`Scalar`], which is
//! implemented for `f64` and [`Complex64`]. The trait adds the handful of
//! operations sparse triangular factorization actually needs on top of the
//! arithmetic operators: conjugation, principal square root, and a real
//! modulus for pivot comparisons. For `f64` the conjugate is the identity and
//! the modulus is the absolute value, so real and complex code paths share a
//! single implementation.

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_complex::Complex64;
use num_traits::{One, Zero};

/// Field element the sparse kernels compute with.
///
/// Implementors must form a field under the operator supertraits; `Zero` and
/// `One` supply the additive and multiplicative identities used when
/// scattering columns and storing unit diagonals.
pub trait Scalar:
    Copy
    + fmt::Debug
    + fmt::Display
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + Zero
    + One
    + Send
    + Sync
    + 'static
{
    /// Embed a real number into the scalar type.
    fn from_re(re: f64) -> Self;

    /// Real part.
    fn re(self) -> f64;

    /// Imaginary part (zero for real scalars).
    fn im(self) -> f64;

    /// Complex conjugate (identity for real scalars).
    fn conj(self) -> Self;

    /// Principal square root.
    fn sqrt(self) -> Self;

    /// Magnitude used for pivot selection: `|x|` for reals, the complex
    /// modulus otherwise.
    fn modulus(self) -> f64;
}

impl Scalar for f64 {
    #[inline]
    fn from_re(re: f64) -> Self {
        re
    }

    #[inline]
    fn re(self) -> f64 {
        self
    }

    #[inline]
    fn im(self) -> f64 {
        0.0
    }

    #[inline]
    fn conj(self) -> Self {
        self
    }

    #[inline]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    #[inline]
    fn modulus(self) -> f64 {
        f64::abs(self)
    }
}

impl Scalar for Complex64 {
    #[inline]
    fn from_re(re: f64) -> Self {
        Complex64::new(re, 0.0)
    }

    #[inline]
    fn re(self) -> f64 {
        self.re
    }

    #[inline]
    fn im(self) -> f64 {
        self.im
    }

    #[inline]
    fn conj(self) -> Self {
        Complex64::conj(&self)
    }

    #[inline]
    fn sqrt(self) -> Self {
        Complex64::sqrt(self)
    }

    #[inline]
    fn modulus(self) -> f64 {
        Complex64::norm(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_scalar_ops() {
        let x: f64 = -3.0;
        assert_eq!(x.conj(), -3.0);
        assert_eq!(x.modulus(), 3.0);
        assert_eq!(x.re(), -3.0);
        assert_eq!(x.im(), 0.0);
        assert_eq!(f64::from_re(2.5), 2.5);
        assert_eq!(4.0f64.sqrt(), 2.0);
    }

    #[test]
    fn test_complex_scalar_ops() {
        let z = Complex64::new(3.0, -4.0);
        assert_eq!(z.conj(), Complex64::new(3.0, 4.0));
        assert!((z.modulus() - 5.0).abs() < 1e-15);
        assert_eq!(z.re(), 3.0);
        assert_eq!(z.im(), -4.0);
        assert_eq!(Complex64::from_re(2.0), Complex64::new(2.0, 0.0));
    }

    #[test]
    fn test_conjugate_product_is_real() {
        // z * conj(z) must come out with an exactly zero imaginary part;
        // the positive-definiteness test in the Cholesky kernel relies on it.
        let z = Complex64::new(1.5, -2.25);
        let p = z * Scalar::conj(z);
        assert_eq!(p.im, 0.0);
        assert!((p.re - (1.5 * 1.5 + 2.25 * 2.25)).abs() < 1e-15);
    }

    #[test]
    fn test_complex_sqrt_principal_branch() {
        let z = Complex64::new(-1.0, 0.0);
        let r = Scalar::sqrt(z);
        assert!((r.re - 0.0).abs() < 1e-15);
        assert!((r.im - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_identities() {
        assert_eq!(<f64 as Zero>::zero(), 0.0);
        assert_eq!(<Complex64 as One>::one(), Complex64::new(1.0, 0.0));
    }
}
