//! Error types for the IR crate.

use crate::qubit::GridQubit;
use thiserror::Error;

/// Errors that can occur while building matrices, gates and devices.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Matrix is not square.
    #[error("Matrix must be square, got {rows}x{cols}")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Matrix dimension is not a power of two.
    #[error("Matrix dimension {0} is not a power of two")]
    NotPowerOfTwo(usize),

    /// Matrix dimension does not match the number of qubits it acts on.
    #[error("Matrix of dimension {got} cannot act on {qubits} qubits (expected {expected})")]
    DimensionMismatch {
        /// Number of qubits.
        qubits: usize,
        /// Expected dimension (2^qubits).
        expected: usize,
        /// Actual dimension.
        got: usize,
    },

    /// Row of a matrix literal has the wrong length.
    #[error("Row {row} has {got} entries, expected {expected}")]
    RaggedRow {
        /// Index of the offending row.
        row: usize,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Qubit is not part of the device.
    #[error("Qubit {0} is not on the device")]
    QubitNotOnDevice(GridQubit),

    /// Same qubit listed twice.
    #[error("Duplicate qubit {0}")]
    DuplicateQubit(GridQubit),

    /// Gate requires different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: usize,
        /// Actual number of qubits provided.
        got: usize,
    },

    /// Device diagram could not be parsed.
    #[error("Invalid device diagram: {0}")]
    InvalidDiagram(String),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
