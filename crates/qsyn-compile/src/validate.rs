//! Validation of compiled operation lists.
//!
//! A list is accepted when every operation is native and acts on coupled
//! qubits, the register stays within the qubit budget, and the realized
//! operator is within tolerance of `U ⊗ I` (identity on the ancillas).
//!
//! Up to `full_check_qubits` register qubits the realized operator is
//! built column by column. Above that, the same phase-aligned Frobenius
//! distance is estimated from seeded random sample states:
//!
//! ```text
//! d² ≈ 2^N / P · Σ_p ‖C·ψ_p − e^{iφ}·(U⊗I)·ψ_p‖²
//! ```

use num_complex::Complex64;
use qsyn_ir::matrix::{Matrix, kron_identity, phase_distance};
use qsyn_ir::{Device, GridQubit, Operation};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SynthesisConfig;
use crate::error::{CompileError, CompileResult};
use crate::simulate::Statevector;

/// How the realized operator was compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMethod {
    /// Full operator composition.
    Full,
    /// Random sample states.
    Sampled { states: usize },
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Phase-aligned Frobenius distance (estimated for sampled checks).
    pub distance: f64,
    pub method: CheckMethod,
}

/// Validates operation lists for one device and configuration.
pub struct Validator<'a> {
    device: &'a Device,
    config: &'a SynthesisConfig,
}

impl<'a> Validator<'a> {
    pub fn new(device: &'a Device, config: &'a SynthesisConfig) -> Self {
        Self { device, config }
    }

    /// Run every check; the register is `targets` followed by `ancillas`.
    pub fn validate(
        &self,
        ops: &[Operation],
        targets: &[GridQubit],
        ancillas: &[GridQubit],
        unitary: &Matrix,
    ) -> CompileResult<ValidationReport> {
        let register: Vec<GridQubit> = targets.iter().chain(ancillas).copied().collect();
        if register.len() > self.config.qubit_budget {
            return Err(CompileError::BudgetExceeded {
                required: register.len(),
                budget: self.config.qubit_budget,
            });
        }
        let index: FxHashMap<GridQubit, usize> =
            register.iter().enumerate().map(|(i, q)| (*q, i)).collect();
        if index.len() != register.len() {
            return Err(CompileError::InputShape("register repeats a qubit".into()));
        }

        self.check_structure(ops, &index)?;

        let report = if register.len() <= self.config.full_check_qubits {
            let distance = full_distance(ops, &index, unitary, ancillas.len());
            ValidationReport {
                distance,
                method: CheckMethod::Full,
            }
        } else {
            let states = self.config.sample_states.max(1);
            let distance = sampled_distance(ops, &index, unitary, targets.len(), states, self.config.sample_seed);
            ValidationReport {
                distance,
                method: CheckMethod::Sampled { states },
            }
        };

        debug!(
            distance = report.distance,
            method = ?report.method,
            register = register.len(),
            "validated circuit"
        );
        if !(report.distance <= self.config.tolerance) {
            return Err(CompileError::ToleranceExceeded {
                stage: "validation",
                distance: report.distance,
                tolerance: self.config.tolerance,
            });
        }
        Ok(report)
    }

    /// Native membership, adjacency and register checks.
    fn check_structure(&self, ops: &[Operation], index: &FxHashMap<GridQubit, usize>) -> CompileResult<()> {
        for op in ops {
            for q in op.qubits() {
                if !index.contains_key(q) {
                    return Err(CompileError::UnregisteredQubit(*q));
                }
            }
            match op {
                Operation::PhasedXz { gate, .. } => {
                    if !gate.is_finite() {
                        return Err(CompileError::NotNative(op.to_string()));
                    }
                }
                Operation::TwoQubit {
                    qubits,
                    primitive,
                    exponent,
                } => {
                    if !self.config.gate_set.allows(*primitive, *exponent) {
                        return Err(CompileError::NotNative(op.to_string()));
                    }
                    if !self.device.is_adjacent(&qubits[0], &qubits[1]) {
                        return Err(CompileError::AdjacencyViolation {
                            a: qubits[0],
                            b: qubits[1],
                        });
                    }
                }
                Operation::Bridge { .. } => return Err(CompileError::NotNative(op.to_string())),
            }
        }
        Ok(())
    }
}

fn run(ops: &[Operation], index: &FxHashMap<GridQubit, usize>, state: &mut Statevector) {
    for op in ops {
        state.apply(op, index);
    }
}

/// Exact distance from the composed operator.
fn full_distance(
    ops: &[Operation],
    index: &FxHashMap<GridQubit, usize>,
    unitary: &Matrix,
    ancillas: usize,
) -> f64 {
    let n = index.len();
    let dim = 1usize << n;
    let mut realized = Matrix::zeros(dim, dim);
    for col in 0..dim {
        let mut state = Statevector::basis(n, col);
        run(ops, index, &mut state);
        for (row, amp) in state.amplitudes().iter().enumerate() {
            realized[(row, col)] = *amp;
        }
    }
    phase_distance(&realized, &kron_identity(unitary, ancillas))
}

/// Distance estimated from random sample states.
fn sampled_distance(
    ops: &[Operation],
    index: &FxHashMap<GridQubit, usize>,
    unitary: &Matrix,
    num_targets: usize,
    states: usize,
    seed: u64,
) -> f64 {
    let n = index.len();
    let target_positions: Vec<usize> = (0..num_targets).collect();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut pairs = Vec::with_capacity(states);
    for _ in 0..states {
        let start = Statevector::random(n, &mut rng);
        let mut realized = start.clone();
        run(ops, index, &mut realized);
        let mut expected = start;
        expected.apply_matrix(&target_positions, unitary);
        pairs.push((realized, expected));
    }

    let overlap: Complex64 = pairs.iter().map(|(r, t)| t.inner(r)).sum();
    let phase = if overlap.norm() > 1e-300 {
        overlap / overlap.norm()
    } else {
        Complex64::new(1.0, 0.0)
    };
    let residual: f64 = pairs
        .iter()
        .map(|(r, t)| {
            r.amplitudes()
                .iter()
                .zip(t.amplitudes())
                .map(|(a, b)| (a - phase * b).norm_sqr())
                .sum::<f64>()
        })
        .sum();
    ((1usize << n) as f64 / states as f64 * residual).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::single::SingleQubitSynthesizer;
    use qsyn_ir::{TwoQubitPrimitive, Unitary2x2};

    fn q(c: i32) -> GridQubit {
        GridQubit::new(0, c)
    }

    fn cz_circuit() -> (Vec<Operation>, Matrix) {
        let ops = vec![Operation::cz(q(0), q(1))];
        (ops, TwoQubitPrimitive::Cz.matrix(1.0))
    }

    #[test]
    fn test_accepts_exact_circuit() {
        let device = Device::rect(1, 4);
        let config = SynthesisConfig::default();
        let (ops, u) = cz_circuit();
        let report = Validator::new(&device, &config)
            .validate(&ops, &[q(0), q(1)], &[], &u)
            .unwrap();
        assert_eq!(report.method, CheckMethod::Full);
        assert!(report.distance < 1e-12);
    }

    #[test]
    fn test_sampled_check_matches_full_check() {
        let device = Device::rect(1, 4);
        let (ops, u) = cz_circuit();
        let full = SynthesisConfig::default();
        let sampled = SynthesisConfig::default().with_full_check_qubits(0);
        let a = Validator::new(&device, &full).validate(&ops, &[q(0), q(1)], &[q(2)], &u).unwrap();
        let b = Validator::new(&device, &sampled).validate(&ops, &[q(0), q(1)], &[q(2)], &u).unwrap();
        assert!(matches!(b.method, CheckMethod::Sampled { .. }));
        assert!(a.distance < 1e-12 && b.distance < 1e-12);
    }

    #[test]
    fn test_rejects_wrong_operator() {
        let device = Device::rect(1, 4);
        let config = SynthesisConfig::default();
        let (mut ops, u) = cz_circuit();
        ops.push(Operation::phased_xz(q(0), SingleQubitSynthesizer::synthesize(&Unitary2x2::x())));
        let err = Validator::new(&device, &config)
            .validate(&ops, &[q(0), q(1)], &[], &u)
            .unwrap_err();
        assert!(matches!(err, CompileError::ToleranceExceeded { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_rejects_uncoupled_pair() {
        let device = Device::rect(1, 4);
        let config = SynthesisConfig::default();
        let ops = vec![Operation::cz(q(0), q(2))];
        let err = Validator::new(&device, &config)
            .validate(&ops, &[q(0), q(2)], &[], &TwoQubitPrimitive::Cz.matrix(1.0))
            .unwrap_err();
        assert!(matches!(err, CompileError::AdjacencyViolation { .. }));
    }

    #[test]
    fn test_rejects_bridge_and_stray_qubit() {
        let device = Device::rect(1, 4);
        let config = SynthesisConfig::default();
        let u = qsyn_ir::matrix::identity(2);
        let validator = Validator::new(&device, &config);
        let bridge = [Operation::bridge(q(0), q(1))];
        assert!(matches!(
            validator.validate(&bridge, &[q(0), q(1)], &[], &u),
            Err(CompileError::NotNative(_))
        ));
        let stray = [Operation::cz(q(1), q(2))];
        assert!(matches!(
            validator.validate(&stray, &[q(0), q(1)], &[], &u),
            Err(CompileError::UnregisteredQubit(_))
        ));
    }

    #[test]
    fn test_budget() {
        let device = Device::rect(1, 4);
        let config = SynthesisConfig::default().with_qubit_budget(2);
        let (ops, u) = cz_circuit();
        let err = Validator::new(&device, &config)
            .validate(&ops, &[q(0), q(1)], &[q(2)], &u)
            .unwrap_err();
        assert!(matches!(err, CompileError::BudgetExceeded { required: 3, budget: 2 }));
    }
}
