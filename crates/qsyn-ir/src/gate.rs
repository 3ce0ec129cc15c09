//! Native gate definitions.
//!
//! The device executes one parametrized single-qubit family and a small set
//! of fixed two-qubit primitives. Exponents follow the usual convention where
//! `G^1` is the named gate and `G^t` the matching fractional power.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::matrix::Matrix;
use crate::unitary::Unitary2x2;

/// Tolerance used when comparing exponents against the native set.
const EXPONENT_EPSILON: f64 = 1e-9;

/// Phased XZ gate: `Z^z · Z^a · X^x · Z^-a` (rightmost applied first).
///
/// Every single-qubit unitary is one of these up to global phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhasedXZ {
    /// Exponent of the X rotation.
    pub x_exponent: f64,
    /// Exponent of the trailing Z rotation.
    pub z_exponent: f64,
    /// Axis phase exponent `a`.
    pub axis_phase_exponent: f64,
}

impl PhasedXZ {
    /// Create a phased XZ gate.
    pub fn new(x_exponent: f64, z_exponent: f64, axis_phase_exponent: f64) -> Self {
        Self {
            x_exponent,
            z_exponent,
            axis_phase_exponent,
        }
    }

    /// The unitary matrix of this gate.
    pub fn matrix(&self) -> Unitary2x2 {
        let a = self.axis_phase_exponent;
        Unitary2x2::z_pow(self.z_exponent)
            * Unitary2x2::z_pow(a)
            * Unitary2x2::x_pow(self.x_exponent)
            * Unitary2x2::z_pow(-a)
    }

    /// Whether the gate is the identity up to global phase.
    pub fn is_identity(&self, tol: f64) -> bool {
        near_even(self.x_exponent, tol) && near_even(self.z_exponent, tol)
    }

    /// Whether all three parameters are finite.
    pub fn is_finite(&self) -> bool {
        self.x_exponent.is_finite()
            && self.z_exponent.is_finite()
            && self.axis_phase_exponent.is_finite()
    }
}

/// Whether `t` is within `tol` of an even integer.
fn near_even(t: f64, tol: f64) -> bool {
    let r = t.rem_euclid(2.0);
    r <= tol || 2.0 - r <= tol
}

impl fmt::Display for PhasedXZ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PhXZ(a={:.6},x={:.6},z={:.6})",
            self.axis_phase_exponent, self.x_exponent, self.z_exponent
        )
    }
}

/// Two-qubit native primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwoQubitPrimitive {
    /// Controlled phase, `CZ^t = diag(1, 1, 1, e^{iπt})`.
    Cz,
    /// Excitation exchange, `ISWAP^t`; `t = ±0.5` is the square root of iSWAP.
    #[serde(rename = "iswap")]
    ISwap,
}

impl TwoQubitPrimitive {
    /// Get the primitive name.
    pub fn name(&self) -> &'static str {
        match self {
            TwoQubitPrimitive::Cz => "cz",
            TwoQubitPrimitive::ISwap => "iswap",
        }
    }

    /// The 4x4 unitary of `self^exponent`.
    pub fn matrix(&self, exponent: f64) -> Matrix {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        match self {
            TwoQubitPrimitive::Cz => {
                let mut m = Matrix::identity(4, 4);
                m[(3, 3)] = Complex64::from_polar(1.0, PI * exponent);
                m
            }
            TwoQubitPrimitive::ISwap => {
                let c = Complex64::new((PI * exponent / 2.0).cos(), 0.0);
                let s = Complex64::new(0.0, (PI * exponent / 2.0).sin());
                Matrix::from_row_slice(
                    4,
                    4,
                    &[
                        one, zero, zero, zero, //
                        zero, c, s, zero, //
                        zero, s, c, zero, //
                        zero, zero, zero, one,
                    ],
                )
            }
        }
    }
}

impl fmt::Display for TwoQubitPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The set of native gates the target accepts.
///
/// The single-qubit family is always [`PhasedXZ`]; this type records which
/// two-qubit primitives are available and at which exponents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeGateSet {
    /// Allowed `(primitive, exponent)` pairs.
    two_qubit: Vec<(TwoQubitPrimitive, f64)>,
}

impl NativeGateSet {
    /// Gate set with the given two-qubit primitives.
    pub fn new(two_qubit: Vec<(TwoQubitPrimitive, f64)>) -> Self {
        Self { two_qubit }
    }

    /// Sycamore-style set: CZ and the square root of iSWAP in both directions.
    pub fn sycamore() -> Self {
        Self::new(vec![
            (TwoQubitPrimitive::Cz, 1.0),
            (TwoQubitPrimitive::ISwap, 0.5),
            (TwoQubitPrimitive::ISwap, -0.5),
        ])
    }

    /// CZ as the only entangler.
    pub fn cz_only() -> Self {
        Self::new(vec![(TwoQubitPrimitive::Cz, 1.0)])
    }

    /// The square root of iSWAP in both directions, without CZ. This is the
    /// entangler family Sycamore's √iSWAP gate set serializes, so circuits
    /// over it run on the device as emitted.
    pub fn sqrt_iswap() -> Self {
        Self::new(vec![(TwoQubitPrimitive::ISwap, 0.5), (TwoQubitPrimitive::ISwap, -0.5)])
    }

    /// Look up a gate set by name: `sycamore`, `sqrt_iswap` or `cz`.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "sycamore" => Some(Self::sycamore()),
            "sqrt_iswap" => Some(Self::sqrt_iswap()),
            "cz" | "cz_only" => Some(Self::cz_only()),
            _ => None,
        }
    }

    /// Check whether `primitive^exponent` is native.
    pub fn allows(&self, primitive: TwoQubitPrimitive, exponent: f64) -> bool {
        self.two_qubit.iter().any(|&(p, e)| {
            if p != primitive {
                return false;
            }
            match p {
                // CZ is 2-periodic in its exponent, so CZ^1 and CZ^-1 coincide.
                TwoQubitPrimitive::Cz => {
                    let d = (exponent - e).rem_euclid(2.0);
                    d.min(2.0 - d) < EXPONENT_EPSILON
                }
                TwoQubitPrimitive::ISwap => (exponent - e).abs() < EXPONENT_EPSILON,
            }
        })
    }

    /// Whether CZ is available.
    pub fn has_cz(&self) -> bool {
        self.allows(TwoQubitPrimitive::Cz, 1.0)
    }

    /// Whether the square root of iSWAP is available.
    pub fn has_sqrt_iswap(&self) -> bool {
        self.allows(TwoQubitPrimitive::ISwap, 0.5)
    }

    /// The allowed pairs.
    pub fn two_qubit(&self) -> &[(TwoQubitPrimitive, f64)] {
        &self.two_qubit
    }
}

impl Default for NativeGateSet {
    fn default() -> Self {
        Self::sycamore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phased_xz_x_gate() {
        let gate = PhasedXZ::new(1.0, 0.0, 0.0);
        let m = gate.matrix();
        assert!((m.data[1] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
        assert!(m.data[0].norm() < 1e-12);
    }

    #[test]
    fn test_phased_xz_identity() {
        assert!(PhasedXZ::new(0.0, 2.0, 0.3).is_identity(1e-9));
        assert!(PhasedXZ::new(2.0, 0.0, 0.7).is_identity(1e-9));
        assert!(!PhasedXZ::new(0.5, 0.0, 0.0).is_identity(1e-9));
        assert!(PhasedXZ::new(0.0, 0.0, 0.25).matrix().is_identity());
    }

    #[test]
    fn test_cz_matrix() {
        let cz = TwoQubitPrimitive::Cz.matrix(1.0);
        assert!((cz[(3, 3)] + Complex64::new(1.0, 0.0)).norm() < 1e-12);
        assert_eq!(cz[(2, 2)], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_sqrt_iswap_squares_to_iswap() {
        let half = TwoQubitPrimitive::ISwap.matrix(0.5);
        let full = TwoQubitPrimitive::ISwap.matrix(1.0);
        let diff = &half * &half - &full;
        assert!(diff.norm() < 1e-12);
        assert!((full[(1, 2)] - Complex64::new(0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_native_set_membership() {
        let set = NativeGateSet::sycamore();
        assert!(set.allows(TwoQubitPrimitive::Cz, 1.0));
        assert!(set.allows(TwoQubitPrimitive::Cz, -1.0));
        assert!(set.allows(TwoQubitPrimitive::ISwap, -0.5));
        assert!(!set.allows(TwoQubitPrimitive::ISwap, 1.0));
        assert!(!set.allows(TwoQubitPrimitive::Cz, 0.5));
        assert!(set.has_sqrt_iswap());
        assert!(!NativeGateSet::cz_only().has_sqrt_iswap());
    }

    #[test]
    fn test_sqrt_iswap_set_has_no_cz() {
        let set = NativeGateSet::sqrt_iswap();
        assert!(!set.has_cz());
        assert!(set.allows(TwoQubitPrimitive::ISwap, 0.5));
        assert!(set.allows(TwoQubitPrimitive::ISwap, -0.5));
        assert!(NativeGateSet::sycamore().has_cz());
    }

    #[test]
    fn test_gate_set_by_name() {
        assert_eq!(NativeGateSet::by_name("sqrt-iswap"), Some(NativeGateSet::sqrt_iswap()));
        assert_eq!(NativeGateSet::by_name("CZ"), Some(NativeGateSet::cz_only()));
        assert_eq!(NativeGateSet::by_name("Sycamore"), Some(NativeGateSet::sycamore()));
        assert!(NativeGateSet::by_name("syc").is_none());
    }
}
