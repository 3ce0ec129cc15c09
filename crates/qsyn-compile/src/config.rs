//! Compiler configuration.
//!
//! A [`SynthesisConfig`] is built once, then shared by reference with every
//! stage of a compile. It is never modified while a compile runs.
//!
//! # Example
//!
//! ```rust
//! use qsyn_compile::{AxisPolicy, QubitOrdering, Strategy, SynthesisConfig};
//!
//! let config = SynthesisConfig::default()
//!     .with_tolerance(1e-6)
//!     .with_strategies(vec![Strategy::new(QubitOrdering::Identity, AxisPolicy::LeastSignificant)]);
//!
//! assert_eq!(config.strategies.len(), 1);
//! assert_eq!(config.qubit_budget, 10);
//! ```

use qsyn_ir::NativeGateSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which qubit a cosine-sine split peels off at every decomposition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisPolicy {
    /// First qubit of the node (most significant bit).
    MostSignificant,
    /// Last qubit of the node (least significant bit).
    LeastSignificant,
}

/// How logical qubits of the decomposition are assigned to target qubits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QubitOrdering {
    /// Logical qubit `i` runs on target `i`.
    Identity,
    /// Frequently interacting logical qubits are placed on adjacent targets.
    Greedy,
}

/// One entry of the bounded retry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Strategy {
    /// Logical-to-target assignment.
    pub ordering: QubitOrdering,
    /// Split axis for generic decomposition.
    pub axis: AxisPolicy,
}

impl Strategy {
    /// Create a strategy.
    pub const fn new(ordering: QubitOrdering, axis: AxisPolicy) -> Self {
        Self { ordering, axis }
    }

    /// The strategies tried by default, in order.
    pub fn default_list() -> Vec<Strategy> {
        vec![
            Strategy::new(QubitOrdering::Identity, AxisPolicy::MostSignificant),
            Strategy::new(QubitOrdering::Greedy, AxisPolicy::MostSignificant),
            Strategy::new(QubitOrdering::Identity, AxisPolicy::LeastSignificant),
        ]
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.ordering, self.axis)
    }
}

/// Configuration shared by all compile stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Native gates of the target.
    pub gate_set: NativeGateSet,
    /// Maximum phase-aligned Frobenius distance between realized and
    /// requested operator.
    pub tolerance: f64,
    /// Entrywise tolerance of the `U†U = I` input check.
    pub unitarity_tolerance: f64,
    /// Distance allowed for a single synthesized two-qubit block.
    pub gate_tolerance: f64,
    /// Entrywise tolerance used by structure predicates.
    pub match_tolerance: f64,
    /// Interaction angles closer than this to a special value snap to it.
    pub angle_tolerance: f64,
    /// Largest number of target qubits accepted.
    pub max_targets: usize,
    /// Targets plus ancillas may not exceed this.
    pub qubit_budget: usize,
    /// Up to this many qubits the realized operator is built in full;
    /// larger circuits are checked on random sample states.
    pub full_check_qubits: usize,
    /// Number of sample states for large circuits.
    pub sample_states: usize,
    /// Seed for sample states, fixed so validation is reproducible.
    pub sample_seed: u64,
    /// Strategies tried in order.
    pub strategies: Vec<Strategy>,
    /// Run every strategy and keep the cheapest valid result instead of
    /// stopping at the first.
    pub keep_best: bool,
    /// Minimum number of relay hops an ancilla path must save over a path
    /// through already-used qubits before new ancillas are allocated.
    pub ancilla_min_saving: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            gate_set: NativeGateSet::sycamore(),
            tolerance: 1e-5,
            unitarity_tolerance: 1e-6,
            gate_tolerance: 1e-7,
            match_tolerance: 1e-9,
            angle_tolerance: 1e-9,
            max_targets: 8,
            qubit_budget: 10,
            full_check_qubits: 6,
            sample_states: 4,
            sample_seed: 0x5eed_c0de,
            strategies: Strategy::default_list(),
            keep_best: true,
            ancilla_min_saving: 1,
        }
    }
}

impl SynthesisConfig {
    /// Set the native gate set.
    #[must_use]
    pub fn with_gate_set(mut self, gate_set: NativeGateSet) -> Self {
        self.gate_set = gate_set;
        self
    }

    /// Set the validation tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the strategy list.
    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Set the qubit budget.
    #[must_use]
    pub fn with_qubit_budget(mut self, budget: usize) -> Self {
        self.qubit_budget = budget;
        self
    }

    /// Set the full-check threshold.
    #[must_use]
    pub fn with_full_check_qubits(mut self, qubits: usize) -> Self {
        self.full_check_qubits = qubits;
        self
    }

    /// Stop at the first valid strategy.
    #[must_use]
    pub fn first_valid(mut self) -> Self {
        self.keep_best = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SynthesisConfig::default();
        assert_eq!(config.qubit_budget, 10);
        assert_eq!(config.max_targets, 8);
        assert_eq!(config.strategies.len(), 3);
        assert_eq!(config.strategies[0].axis, AxisPolicy::MostSignificant);
        assert!(config.gate_set.has_sqrt_iswap());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SynthesisConfig =
            serde_json::from_str(r#"{"tolerance": 1e-4, "keep_best": false}"#).unwrap();
        assert_eq!(config.tolerance, 1e-4);
        assert!(!config.keep_best);
        assert_eq!(config.full_check_qubits, 6);
    }

    #[test]
    fn test_builder() {
        let config = SynthesisConfig::default()
            .with_qubit_budget(8)
            .with_gate_set(NativeGateSet::cz_only())
            .first_valid();
        assert_eq!(config.qubit_budget, 8);
        assert!(!config.gate_set.has_sqrt_iswap());
        assert!(!config.keep_best);
    }
}
