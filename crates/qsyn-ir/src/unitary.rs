//! 2x2 unitary matrices.
//!
//! Single-qubit blocks are handled in this fixed-size form throughout the
//! compiler: they are multiplied, merged and finally converted to native
//! gates without touching the dynamic [`Matrix`] type.

use num_complex::Complex64;
use std::f64::consts::PI;

use crate::matrix::Matrix;

/// Tolerance for floating point comparisons.
const EPSILON: f64 = 1e-10;

/// A 2x2 unitary matrix in row-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unitary2x2 {
    /// The matrix elements in row-major order: [[a, b], [c, d]].
    pub data: [Complex64; 4],
}

impl Unitary2x2 {
    /// Create a new 2x2 unitary matrix.
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { data: [a, b, c, d] }
    }

    /// Create the identity matrix.
    pub fn identity() -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0))
    }

    /// Diagonal matrix `diag(a, d)`.
    pub fn diagonal(a: Complex64, d: Complex64) -> Self {
        let zero = Complex64::new(0.0, 0.0);
        Self::new(a, zero, zero, d)
    }

    /// Create a Hadamard matrix.
    pub fn h() -> Self {
        let s = Complex64::new(1.0 / 2.0_f64.sqrt(), 0.0);
        Self::new(s, s, s, -s)
    }

    /// Create a Pauli-X matrix.
    pub fn x() -> Self {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        Self::new(zero, one, one, zero)
    }

    /// Create a Pauli-Y matrix.
    pub fn y() -> Self {
        let zero = Complex64::new(0.0, 0.0);
        Self::new(zero, Complex64::new(0.0, -1.0), Complex64::new(0.0, 1.0), zero)
    }

    /// Create a Pauli-Z matrix.
    pub fn z() -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::new(-1.0, 0.0))
    }

    /// Create an S gate (sqrt(Z)).
    pub fn s() -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::new(0.0, 1.0))
    }

    /// Create an S-dagger gate.
    pub fn sdg() -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::new(0.0, -1.0))
    }

    /// Create an RX rotation matrix, `exp(-iθX/2)`.
    pub fn rx(theta: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            Complex64::new(0.0, -s),
            Complex64::new(0.0, -s),
            Complex64::new(c, 0.0),
        )
    }

    /// Create an RY rotation matrix, `exp(-iθY/2)`.
    pub fn ry(theta: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            Complex64::new(-s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(c, 0.0),
        )
    }

    /// Create an RZ rotation matrix, `exp(-iθZ/2)`.
    pub fn rz(theta: f64) -> Self {
        Self::diagonal(
            Complex64::from_polar(1.0, -theta / 2.0),
            Complex64::from_polar(1.0, theta / 2.0),
        )
    }

    /// `Z^t = diag(1, e^{iπt})`.
    pub fn z_pow(t: f64) -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::from_polar(1.0, PI * t))
    }

    /// `X^t = e^{iπt/2} RX(πt)`.
    pub fn x_pow(t: f64) -> Self {
        Self::rx(PI * t).scale(Complex64::from_polar(1.0, PI * t / 2.0))
    }

    /// Multiply this matrix by another: self * other.
    #[allow(clippy::many_single_char_names)]
    pub fn mul(&self, other: &Self) -> Self {
        let [a, b, c, d] = self.data;
        let [e, f, g, h] = other.data;
        Self::new(a * e + b * g, a * f + b * h, c * e + d * g, c * f + d * h)
    }

    /// Multiply every entry by a scalar.
    pub fn scale(&self, factor: Complex64) -> Self {
        let [a, b, c, d] = self.data;
        Self::new(a * factor, b * factor, c * factor, d * factor)
    }

    /// Get the conjugate transpose (dagger).
    pub fn dagger(&self) -> Self {
        Self::new(
            self.data[0].conj(),
            self.data[2].conj(),
            self.data[1].conj(),
            self.data[3].conj(),
        )
    }

    /// Determinant.
    pub fn det(&self) -> Complex64 {
        self.data[0] * self.data[3] - self.data[1] * self.data[2]
    }

    /// Check if this is approximately identity (up to global phase).
    pub fn is_identity(&self) -> bool {
        self.is_identity_within(EPSILON)
    }

    /// Identity check with an explicit tolerance.
    pub fn is_identity_within(&self, tol: f64) -> bool {
        let [a, b, c, d] = self.data;
        b.norm() <= tol && c.norm() <= tol && (a - d).norm() <= tol
    }

    /// Decompose into `RZ(alpha) * RY(beta) * RZ(gamma) * e^{i global_phase}`.
    ///
    /// Returns `(alpha, beta, gamma, global_phase)` with `beta` in `[0, π]`.
    /// `beta` is taken from `atan2` of the column magnitudes, which stays
    /// accurate near 0 and π where `acos` loses half the digits.
    pub fn zyz_decomposition(&self) -> (f64, f64, f64, f64) {
        let [a, b, c, d] = self.data;

        let det = a * d - b * c;
        let global_phase = det.arg() / 2.0;

        // Remove global phase to get SU(2) matrix
        let phase_factor = Complex64::from_polar(1.0, -global_phase);
        let a = a * phase_factor;
        let c = c * phase_factor;

        // U = [[cos(b/2)*e^(-i(a+g)/2), -sin(b/2)*e^(-i(a-g)/2)],
        //      [sin(b/2)*e^(i(a-g)/2),   cos(b/2)*e^(i(a+g)/2)]]
        let beta = 2.0 * c.norm().atan2(a.norm());

        if c.norm() < EPSILON {
            // Pure Z rotation, fold everything into alpha.
            return (-2.0 * a.arg(), 0.0, 0.0, global_phase);
        }
        if a.norm() < EPSILON {
            return (2.0 * c.arg(), PI, 0.0, global_phase);
        }

        let alpha_plus_gamma = -2.0 * a.arg();
        let alpha_minus_gamma = 2.0 * c.arg();

        let alpha = f64::midpoint(alpha_plus_gamma, alpha_minus_gamma);
        let gamma = (alpha_plus_gamma - alpha_minus_gamma) / 2.0;

        (alpha, beta, gamma, global_phase)
    }

    /// Normalize angles to [-pi, pi].
    pub fn normalize_angle(angle: f64) -> f64 {
        if angle.is_nan() || angle.is_infinite() {
            return 0.0;
        }
        let mut a = angle.rem_euclid(2.0 * PI);
        if a > PI {
            a -= 2.0 * PI;
        }
        a
    }

    /// Read the 2x2 block of `m` whose top-left corner is `(row, col)`.
    pub fn from_block(m: &Matrix, row: usize, col: usize) -> Self {
        Self::new(
            m[(row, col)],
            m[(row, col + 1)],
            m[(row + 1, col)],
            m[(row + 1, col + 1)],
        )
    }

    /// Convert to a dynamic matrix.
    pub fn to_matrix(&self) -> Matrix {
        Matrix::from_row_slice(2, 2, &self.data)
    }

    /// Kronecker product `self ⊗ other` (self on the first qubit).
    pub fn kron(&self, other: &Self) -> Matrix {
        Matrix::from_fn(4, 4, |i, j| {
            self.data[(i >> 1) * 2 + (j >> 1)] * other.data[(i & 1) * 2 + (j & 1)]
        })
    }
}

impl Default for Unitary2x2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Unitary2x2 {
    type Output = Self;

    #[allow(clippy::needless_pass_by_value)]
    fn mul(self, rhs: Self) -> Self::Output {
        Unitary2x2::mul(&self, &rhs)
    }
}
