//! Diagonal (phase-only) unitaries.
//!
//! Two constructions are built and the one with fewer CZ gates wins:
//!
//! - a cascade of Gray-code multiplexed RZ gates, `2^k − 2` CZ for `k`
//!   qubits in the worst case;
//! - the Walsh expansion `θ(x) = Σ_S w_S·(−1)^{S·x}`, realized term by term
//!   as `exp(i·w_S·Z_S)`. Two-qubit terms go through the KAK synthesizer,
//!   larger terms through a CZ parity ladder with `2(|S| − 1)` CZ.

use std::f64::consts::FRAC_PI_2;

use num_complex::Complex64;
use qsyn_ir::Unitary2x2;
use qsyn_ir::matrix::Matrix;
use tracing::trace;

use super::multiplex::{RotationAxis, multiplexed_rotation, walsh_hadamard};
use super::two_qubit::{TwoQubitSynthesizer, zz_cost};
use crate::config::SynthesisConfig;
use crate::error::CompileResult;
use crate::logical::{LogicalOp, two_qubit_count, unit};

/// Synthesizes diagonal unitaries given their phases.
#[derive(Debug, Clone, Copy)]
pub struct DiagonalSynthesizer {
    two_qubit: TwoQubitSynthesizer,
    tol: f64,
}

impl DiagonalSynthesizer {
    pub fn new(config: &SynthesisConfig) -> Self {
        Self {
            two_qubit: TwoQubitSynthesizer::new(config),
            tol: config.angle_tolerance,
        }
    }

    /// Circuit for `diag(e^{i·phases[x]})` on `qubits`, up to global phase.
    ///
    /// The polynomial is only built when its estimated cost beats the
    /// cascade.
    pub fn synthesize(&self, phases: &[f64], qubits: &[usize]) -> CompileResult<Vec<LogicalOp>> {
        debug_assert_eq!(phases.len(), 1 << qubits.len());
        let cascade = self.gray_cascade(phases, qubits);
        let cascade_cost = two_qubit_count(&cascade);
        let polynomial_cost = self.polynomial_cost(phases);
        trace!(
            qubits = qubits.len(),
            cascade_cost, polynomial_cost, "diagonal strategies compared"
        );
        if cascade_cost <= polynomial_cost {
            return Ok(cascade);
        }
        self.phase_polynomial(phases, qubits)
    }

    /// CZ count of [`phase_polynomial`](Self::phase_polynomial) without
    /// building it.
    pub fn polynomial_cost(&self, phases: &[f64]) -> usize {
        let mut weights = phases.to_vec();
        walsh_hadamard(&mut weights);
        let scale = 1.0 / weights.len() as f64;
        weights
            .iter()
            .enumerate()
            .skip(1)
            .map(|(subset, w)| (subset.count_ones() as usize, w * scale))
            .filter(|(_, w)| w.abs() > self.tol)
            .map(|(order, w)| match order {
                1 => 0,
                2 => zz_cost(w, self.tol),
                _ => 2 * (order - 1),
            })
            .sum()
    }

    /// Peel the last qubit off with a multiplexed RZ until one is left.
    pub fn gray_cascade(&self, phases: &[f64], qubits: &[usize]) -> Vec<LogicalOp> {
        let mut current = phases.to_vec();
        let mut ops = Vec::new();
        for j in (0..qubits.len()).rev() {
            let half = current.len() / 2;
            let angles: Vec<f64> = (0..half).map(|x| current[2 * x + 1] - current[2 * x]).collect();
            ops.extend(multiplexed_rotation(
                RotationAxis::Z,
                &qubits[..j],
                qubits[j],
                &angles,
                self.tol,
            ));
            current = (0..half)
                .map(|x| (current[2 * x] + current[2 * x + 1]) / 2.0)
                .collect();
        }
        ops
    }

    /// Walsh-term construction.
    pub fn phase_polynomial(&self, phases: &[f64], qubits: &[usize]) -> CompileResult<Vec<LogicalOp>> {
        let k = qubits.len();
        let mut weights = phases.to_vec();
        walsh_hadamard(&mut weights);
        let scale = 1.0 / weights.len() as f64;

        let mut ops = Vec::new();
        for (subset, w) in weights.iter().enumerate().skip(1) {
            let w = w * scale;
            if w.abs() <= self.tol {
                continue;
            }
            // Basis-index bit `k − 1 − j` belongs to qubits[j].
            let members: Vec<usize> = (0..k)
                .filter(|j| subset >> (k - 1 - j) & 1 == 1)
                .map(|j| qubits[j])
                .collect();
            match members.as_slice() {
                [q] => ops.push(LogicalOp::single(*q, Unitary2x2::rz(-2.0 * w))),
                // `exp(i·kπ/2·ZZ)` is `(Z⊗Z)^k` up to phase.
                [a, b] if zz_cost(w, self.tol) == 0 => {
                    if (w / FRAC_PI_2).round().rem_euclid(2.0) == 1.0 {
                        ops.push(LogicalOp::single(*a, Unitary2x2::z()));
                        ops.push(LogicalOp::single(*b, Unitary2x2::z()));
                    }
                }
                [a, b] => ops.extend(self.two_qubit.synthesize(&zz_phase(w), *a, *b)?),
                [rest @ .., target] => {
                    // CNOT ladder onto `target` written with the target in the X basis.
                    ops.push(LogicalOp::single(*target, Unitary2x2::h()));
                    ops.extend(rest.iter().map(|c| LogicalOp::cz(*c, *target)));
                    ops.push(LogicalOp::single(*target, Unitary2x2::rx(-2.0 * w)));
                    ops.extend(rest.iter().map(|c| LogicalOp::cz(*c, *target)));
                    ops.push(LogicalOp::single(*target, Unitary2x2::h()));
                }
                [] => {}
            }
        }
        Ok(ops)
    }
}

/// `exp(i·w·Z⊗Z)`.
fn zz_phase(w: f64) -> Matrix {
    let signs = [1.0, -1.0, -1.0, 1.0];
    Matrix::from_fn(4, 4, |i, j| {
        if i == j { unit(w * signs[i]) } else { Complex64::new(0.0, 0.0) }
    })
}

/// Phases of a diagonal matrix.
pub fn diagonal_phases(u: &Matrix) -> Vec<f64> {
    (0..u.nrows()).map(|i| u[(i, i)].arg()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical::compose;
    use qsyn_ir::matrix::phase_distance;
    use std::f64::consts::{FRAC_PI_4, PI};

    fn diagonal_matrix(phases: &[f64]) -> Matrix {
        let n = phases.len();
        Matrix::from_fn(n, n, |i, j| {
            if i == j { unit(phases[i]) } else { Complex64::new(0.0, 0.0) }
        })
    }

    fn synthesizer() -> DiagonalSynthesizer {
        DiagonalSynthesizer::new(&SynthesisConfig::default())
    }

    fn cz_count(ops: &[LogicalOp]) -> usize {
        ops.iter().filter(|op| matches!(op, LogicalOp::Cz { .. })).count()
    }

    #[test]
    fn test_random_phases_both_strategies() {
        let phases = [0.1, -0.7, 2.2, 1.3, -2.9, 0.4, 0.0, 1.8];
        let target = diagonal_matrix(&phases);
        let s = synthesizer();
        let cascade = s.gray_cascade(&phases, &[0, 1, 2]);
        assert_eq!(cz_count(&cascade), 6);
        assert!(phase_distance(&compose(&cascade, 3), &target) < 1e-10);
        let polynomial = s.phase_polynomial(&phases, &[0, 1, 2]).unwrap();
        assert!(phase_distance(&compose(&polynomial, 3), &target) < 1e-8);
    }

    #[test]
    fn test_ccz_uses_cascade() {
        let mut phases = [0.0; 8];
        phases[7] = PI;
        let ops = synthesizer().synthesize(&phases, &[0, 1, 2]).unwrap();
        assert_eq!(cz_count(&ops), 6);
        assert!(phase_distance(&compose(&ops, 3), &diagonal_matrix(&phases)) < 1e-8);
    }

    #[test]
    fn test_sparse_polynomial_is_cheaper() {
        // exp(i·π/4·Z0·Z1) on three qubits is a single CZ up to local phases.
        let phases: Vec<f64> = (0..8)
            .map(|x: usize| {
                let parity = ((x >> 2) ^ (x >> 1)) & 1;
                if parity == 0 { FRAC_PI_4 } else { -FRAC_PI_4 }
            })
            .collect();
        let ops = synthesizer().synthesize(&phases, &[0, 1, 2]).unwrap();
        assert_eq!(cz_count(&ops), 1);
        assert!(phase_distance(&compose(&ops, 3), &diagonal_matrix(&phases)) < 1e-8);
    }

    #[test]
    fn test_parity_ladder() {
        let phases: Vec<f64> = (0..16usize)
            .map(|x| if x.count_ones() % 2 == 0 { 0.3 } else { -0.3 })
            .collect();
        let ops = synthesizer().phase_polynomial(&phases, &[3, 1, 0, 2]).unwrap();
        assert_eq!(cz_count(&ops), 6);
        let relabeled = diagonal_matrix(&phases);
        // Parity is symmetric in the qubits, so the relabeling does not matter.
        assert!(phase_distance(&compose(&ops, 4), &relabeled) < 1e-10);
    }

    #[test]
    fn test_polynomial_cost_matches_circuit() {
        let s = synthesizer();
        let sparse: Vec<f64> = (0..8usize)
            .map(|x| if ((x >> 2) ^ x) & 1 == 0 { 0.3 } else { -0.3 })
            .collect();
        let dense = [0.1, -0.7, 2.2, 1.3, -2.9, 0.4, 0.0, 1.8];
        for phases in [sparse.as_slice(), dense.as_slice()] {
            let built = s.phase_polynomial(phases, &[0, 1, 2]).unwrap();
            assert_eq!(s.polynomial_cost(phases), two_qubit_count(&built));
        }
    }

    #[test]
    fn test_half_pi_zz_term_is_local() {
        // exp(i·π/2·Z0·Z1) = i·Z⊗Z.
        let phases: Vec<f64> = (0..4usize)
            .map(|x| if (x ^ (x >> 1)) & 1 == 0 { FRAC_PI_2 } else { -FRAC_PI_2 })
            .collect();
        let s = synthesizer();
        assert_eq!(s.polynomial_cost(&phases), 0);
        let ops = s.phase_polynomial(&phases, &[0, 1]).unwrap();
        assert_eq!(cz_count(&ops), 0);
        assert!(phase_distance(&compose(&ops, 2), &diagonal_matrix(&phases)) < 1e-10);
    }

    #[test]
    fn test_global_phase_is_free() {
        let ops = synthesizer().synthesize(&[0.8; 8], &[0, 1, 2]).unwrap();
        assert!(ops.is_empty());
    }
}
