//! The compile pipeline and its strategy loop.
//!
//! One attempt runs decompose → route → assemble → validate for a single
//! [`Strategy`]. Attempts that fail for a retryable reason move on to the
//! next strategy; when none is left the outcome is
//! [`CompileOutcome::Unsupported`]. Input errors are returned as `Err`
//! before any attempt runs.

use qsyn_ir::matrix::{self, Matrix, permute_qubits};
use qsyn_ir::{Device, GridQubit, Operation};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::assemble::assemble;
use crate::config::{AxisPolicy, QubitOrdering, Strategy, SynthesisConfig};
use crate::decompose::{Decomposer, Decomposition};
use crate::error::{CompileError, CompileResult};
use crate::logical::pair_weights;
use crate::routing::{Router, greedy_assignment};
use crate::validate::{ValidationReport, Validator};

/// Counters describing a compiled circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisStats {
    /// Strategy that produced the result.
    pub strategy: Strategy,
    /// Strategies tried, including the successful one.
    pub attempts: usize,
    pub two_qubit_gates: usize,
    pub single_qubit_gates: usize,
    /// Decomposition tree nodes.
    pub nodes: usize,
    /// Deepest decomposition node.
    pub max_depth: usize,
    /// Exchanges inserted by routing before cancellation.
    pub relay_bridges: usize,
    pub validation: ValidationReport,
}

/// A validated native circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisResult {
    /// Operations in application order.
    pub operations: Vec<Operation>,
    /// Device qubits used besides the targets.
    pub ancillas: Vec<GridQubit>,
    pub stats: SynthesisStats,
}

impl SynthesisResult {
    /// Number of native two-qubit operations.
    pub fn two_qubit_count(&self) -> usize {
        self.stats.two_qubit_gates
    }

    /// Ordering key: fewer two-qubit gates, then fewer operations.
    fn cost(&self) -> (usize, usize) {
        (self.stats.two_qubit_gates, self.operations.len())
    }
}

/// Result of [`compile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompileOutcome {
    Compiled(SynthesisResult),
    /// No strategy produced a valid circuit.
    Unsupported { reason: String },
}

impl CompileOutcome {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, CompileOutcome::Unsupported { .. })
    }

    /// Operations and ancillas, or `None` for the sentinel.
    pub fn into_parts(self) -> Option<(Vec<Operation>, Vec<GridQubit>)> {
        match self {
            CompileOutcome::Compiled(result) => Some((result.operations, result.ancillas)),
            CompileOutcome::Unsupported { .. } => None,
        }
    }

    /// Turn the sentinel into [`CompileError::Unsupported`].
    pub fn into_result(self) -> CompileResult<SynthesisResult> {
        match self {
            CompileOutcome::Compiled(result) => Ok(result),
            CompileOutcome::Unsupported { reason } => Err(CompileError::Unsupported(reason)),
        }
    }
}

/// Compile `unitary` onto `targets`; qubit `i` of the matrix (most
/// significant first) is `targets[i]`.
pub fn compile(
    targets: &[GridQubit],
    unitary: &Matrix,
    device: &Device,
    config: &SynthesisConfig,
) -> CompileResult<CompileOutcome> {
    Synthesizer::borrowed(device, config).run(targets, unitary)
}

/// Device and configuration bundled for repeated compiles.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    device: Device,
    config: SynthesisConfig,
}

impl Synthesizer {
    pub fn new(device: Device, config: SynthesisConfig) -> Self {
        Self { device, config }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Compile one unitary.
    pub fn compile(&self, targets: &[GridQubit], unitary: &Matrix) -> CompileResult<CompileOutcome> {
        Synthesizer::borrowed(&self.device, &self.config).run(targets, unitary)
    }

    fn borrowed<'a>(device: &'a Device, config: &'a SynthesisConfig) -> Pipeline<'a> {
        Pipeline { device, config }
    }
}

struct Pipeline<'a> {
    device: &'a Device,
    config: &'a SynthesisConfig,
}

impl Pipeline<'_> {
    #[instrument(skip_all, fields(qubits = targets.len(), device = self.device.name()))]
    fn run(&self, targets: &[GridQubit], unitary: &Matrix) -> CompileResult<CompileOutcome> {
        self.check_input(targets, unitary)?;
        info!(
            "Compiling {}-qubit unitary with {} strategies",
            targets.len(),
            self.config.strategies.len()
        );

        let mut cache: FxHashMap<AxisPolicy, Decomposition> = FxHashMap::default();
        let mut best: Option<SynthesisResult> = None;
        let mut failures: Vec<String> = Vec::new();

        for (attempt, strategy) in self.config.strategies.iter().enumerate() {
            match self.attempt(*strategy, targets, unitary, &mut cache) {
                Ok(mut result) => {
                    result.stats.attempts = attempt + 1;
                    debug!(
                        %strategy,
                        two_qubit = result.stats.two_qubit_gates,
                        ops = result.operations.len(),
                        "strategy succeeded"
                    );
                    let better = best.as_ref().is_none_or(|b| result.cost() < b.cost());
                    if better {
                        best = Some(result);
                    }
                    if !self.config.keep_best {
                        break;
                    }
                }
                Err(err) if err.is_retryable() => {
                    warn!(%strategy, error = %err, "strategy failed, trying next");
                    failures.push(format!("{strategy}: {err}"));
                }
                Err(err) => return Err(err),
            }
        }

        Ok(match best {
            Some(result) => {
                info!(
                    "Compiled with {} two-qubit and {} single-qubit gates ({} ancillas)",
                    result.stats.two_qubit_gates,
                    result.stats.single_qubit_gates,
                    result.ancillas.len()
                );
                CompileOutcome::Compiled(result)
            }
            None => {
                let reason = if failures.is_empty() {
                    "no strategies configured".to_string()
                } else {
                    failures.join("; ")
                };
                warn!(%reason, "every strategy failed");
                CompileOutcome::Unsupported { reason }
            }
        })
    }

    fn check_input(&self, targets: &[GridQubit], unitary: &Matrix) -> CompileResult<()> {
        let n = matrix::num_qubits(unitary)?;
        if n != targets.len() {
            return Err(CompileError::InputShape(format!(
                "{n}-qubit matrix for {} targets",
                targets.len()
            )));
        }
        if n == 0 || n > self.config.max_targets {
            return Err(CompileError::InputShape(format!(
                "{n} targets, expected 1 to {}",
                self.config.max_targets
            )));
        }
        self.device.validate_qubits(targets)?;
        if !matrix::is_unitary(unitary, self.config.unitarity_tolerance) {
            let product = unitary.adjoint() * unitary;
            let deviation = (product - Matrix::identity(unitary.nrows(), unitary.ncols()))
                .iter()
                .map(|z| z.norm())
                .fold(0.0, f64::max);
            return Err(CompileError::NotUnitary { deviation });
        }
        Ok(())
    }

    fn decompose_cached(
        &self,
        axis: AxisPolicy,
        unitary: &Matrix,
        cache: &mut FxHashMap<AxisPolicy, Decomposition>,
    ) -> CompileResult<Decomposition> {
        if let Some(found) = cache.get(&axis) {
            return Ok(found.clone());
        }
        let decomposition = Decomposer::new(self.config, axis).decompose(unitary)?;
        cache.insert(axis, decomposition.clone());
        Ok(decomposition)
    }

    fn attempt(
        &self,
        strategy: Strategy,
        targets: &[GridQubit],
        unitary: &Matrix,
        cache: &mut FxHashMap<AxisPolicy, Decomposition>,
    ) -> CompileResult<SynthesisResult> {
        let n = targets.len();
        let identity: Vec<usize> = (0..n).collect();
        let base = self.decompose_cached(strategy.axis, unitary, cache)?;

        let (perm, decomposition) = match strategy.ordering {
            QubitOrdering::Identity => (identity, base),
            QubitOrdering::Greedy => {
                let perm = greedy_assignment(&pair_weights(&base.ops, n), targets, self.device);
                if perm == identity {
                    (perm, base)
                } else {
                    // Logical `i` runs on `targets[perm[i]]`, so it must carry
                    // qubit `perm[i]` of the requested operator.
                    let permuted = permute_qubits(unitary, &perm);
                    let decomposition = Decomposer::new(self.config, strategy.axis).decompose(&permuted)?;
                    (perm, decomposition)
                }
            }
        };

        let routed = Router::new(self.device, self.config, targets, &perm)?.route(&decomposition.ops)?;
        let operations = assemble(routed.ops, &self.config.gate_set);
        let validation = Validator::new(self.device, self.config).validate(
            &operations,
            targets,
            &routed.ancillas,
            unitary,
        )?;

        let two_qubit_gates = operations.iter().filter(|op| op.is_two_qubit()).count();
        Ok(SynthesisResult {
            stats: SynthesisStats {
                strategy,
                attempts: 0,
                two_qubit_gates,
                single_qubit_gates: operations.len() - two_qubit_gates,
                nodes: decomposition.nodes,
                max_depth: decomposition.max_depth,
                relay_bridges: routed.relay_bridges,
                validation,
            },
            operations,
            ancillas: routed.ancillas,
        })
    }
}
