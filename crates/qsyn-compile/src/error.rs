//! Error types for the compilation crate.

use qsyn_ir::GridQubit;
use thiserror::Error;

/// Errors that can occur during compilation.
///
/// Only [`InputShape`](CompileError::InputShape), [`NotUnitary`](CompileError::NotUnitary)
/// and [`Ir`](CompileError::Ir) reach the caller of
/// [`compile`](crate::compile); the remaining variants are recovered by the
/// strategy loop and end up as [`CompileOutcome::Unsupported`](crate::CompileOutcome)
/// when every strategy fails.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] qsyn_ir::IrError),

    /// Matrix and qubit list do not fit together.
    #[error("Invalid input shape: {0}")]
    InputShape(String),

    /// Input matrix is not unitary within the configured tolerance.
    #[error("Input is not unitary (max deviation {deviation:.3e})")]
    NotUnitary { deviation: f64 },

    /// No strategy produced a valid circuit.
    #[error("Unsupported input: {0}")]
    Unsupported(String),

    /// A synthesized block or the whole circuit is too far from its target.
    #[error("{stage}: distance {distance:.3e} exceeds tolerance {tolerance:.3e}")]
    ToleranceExceeded {
        stage: &'static str,
        distance: f64,
        tolerance: f64,
    },

    /// A two-qubit operation would act on uncoupled qubits.
    #[error("Qubits {a} and {b} are not coupled")]
    AdjacencyViolation { a: GridQubit, b: GridQubit },

    /// Routing needs more qubits than allowed.
    #[error("Circuit requires {required} qubits but the budget is {budget}")]
    BudgetExceeded { required: usize, budget: usize },

    /// Operation outside the native gate set.
    #[error("Operation '{0}' is not native")]
    NotNative(String),

    /// An operation touches a qubit that is neither a target nor an ancilla.
    #[error("Qubit {0} is not part of the register")]
    UnregisteredQubit(GridQubit),
}

impl CompileError {
    /// Whether another strategy may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompileError::ToleranceExceeded { .. }
                | CompileError::AdjacencyViolation { .. }
                | CompileError::BudgetExceeded { .. }
                | CompileError::NotNative(_)
                | CompileError::UnregisteredQubit(_)
        )
    }
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
