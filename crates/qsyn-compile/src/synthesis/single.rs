//! Closed-form single-qubit synthesis.
//!
//! Every 2x2 unitary is one [`PhasedXZ`] gate up to global phase. Starting
//! from the Euler form `U ∝ RZ(α)·RY(β)·RZ(γ)` and `X^x ∝ RZ(-π/2)·RY(πx)·RZ(π/2)`:
//!
//! ```text
//! x = β/π,  a = 1/2 − γ/π,  z = (α + γ)/π
//! ```

use std::f64::consts::PI;

use qsyn_ir::{PhasedXZ, Unitary2x2};

/// Exponents closer than this to zero are written as exactly zero.
const SNAP: f64 = 1e-12;

/// Converts 2x2 unitaries to native single-qubit gates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleQubitSynthesizer;

impl SingleQubitSynthesizer {
    /// Native gate equal to `u` up to global phase.
    pub fn synthesize(u: &Unitary2x2) -> PhasedXZ {
        let (alpha, beta, gamma, _) = u.zyz_decomposition();
        let x = beta / PI;
        if x.abs() < SNAP {
            return PhasedXZ::new(0.0, canonical((alpha + gamma) / PI), 0.0);
        }
        PhasedXZ::new(
            snap(x),
            canonical((alpha + gamma) / PI),
            canonical(0.5 - gamma / PI),
        )
    }
}

/// Reduce an exponent of period 2 into `(-1, 1]`.
fn canonical(t: f64) -> f64 {
    let mut r = t.rem_euclid(2.0);
    if r > 1.0 {
        r -= 2.0;
    }
    snap(r)
}

fn snap(t: f64) -> f64 {
    if t.abs() < SNAP { 0.0 } else { t }
}
