//! Operations on physical qubits.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gate::{PhasedXZ, TwoQubitPrimitive};
use crate::matrix::Matrix;
use crate::qubit::GridQubit;

/// A single entry of a compiled operation list.
///
/// Lists are applied in order: the first operation acts first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// Native single-qubit gate.
    PhasedXz {
        /// Qubit acted on.
        qubit: GridQubit,
        /// Gate parameters.
        gate: PhasedXZ,
    },
    /// Native two-qubit gate.
    TwoQubit {
        /// Qubit pair acted on.
        qubits: [GridQubit; 2],
        /// Primitive applied.
        primitive: TwoQubitPrimitive,
        /// Exponent of the primitive.
        exponent: f64,
    },
    /// State exchange between two qubits, placed by routing and lowered to
    /// native primitives before a result is returned.
    Bridge {
        /// Qubit pair exchanged.
        qubits: [GridQubit; 2],
    },
}

impl Operation {
    /// Native single-qubit gate on `qubit`.
    pub fn phased_xz(qubit: GridQubit, gate: PhasedXZ) -> Self {
        Operation::PhasedXz { qubit, gate }
    }

    /// `CZ` on the pair.
    pub fn cz(a: GridQubit, b: GridQubit) -> Self {
        Operation::TwoQubit {
            qubits: [a, b],
            primitive: TwoQubitPrimitive::Cz,
            exponent: 1.0,
        }
    }

    /// Square root of iSWAP on the pair.
    pub fn sqrt_iswap(a: GridQubit, b: GridQubit) -> Self {
        Operation::TwoQubit {
            qubits: [a, b],
            primitive: TwoQubitPrimitive::ISwap,
            exponent: 0.5,
        }
    }

    /// Exchange marker between two qubits.
    pub fn bridge(a: GridQubit, b: GridQubit) -> Self {
        Operation::Bridge { qubits: [a, b] }
    }

    /// Qubits acted on, in operand order.
    pub fn qubits(&self) -> &[GridQubit] {
        match self {
            Operation::PhasedXz { qubit, .. } => std::slice::from_ref(qubit),
            Operation::TwoQubit { qubits, .. } | Operation::Bridge { qubits } => qubits,
        }
    }

    /// Whether this operation acts on two qubits.
    pub fn is_two_qubit(&self) -> bool {
        self.qubits().len() == 2
    }

    /// Short name used in logs and listings.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::PhasedXz { .. } => "phxz",
            Operation::TwoQubit { primitive, .. } => primitive.name(),
            Operation::Bridge { .. } => "bridge",
        }
    }

    /// Unitary in operand order (2x2 or 4x4).
    pub fn matrix(&self) -> Matrix {
        match self {
            Operation::PhasedXz { gate, .. } => gate.matrix().to_matrix(),
            Operation::TwoQubit {
                primitive,
                exponent,
                ..
            } => primitive.matrix(*exponent),
            Operation::Bridge { .. } => {
                let mut swap = Matrix::zeros(4, 4);
                let one = Complex64::new(1.0, 0.0);
                swap[(0, 0)] = one;
                swap[(1, 2)] = one;
                swap[(2, 1)] = one;
                swap[(3, 3)] = one;
                swap
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::PhasedXz { qubit, gate } => write!(f, "{gate} {qubit}"),
            Operation::TwoQubit {
                qubits,
                primitive,
                exponent,
            } => write!(f, "{primitive}^{exponent} {}, {}", qubits[0], qubits[1]),
            Operation::Bridge { qubits } => write!(f, "bridge {}, {}", qubits[0], qubits[1]),
        }
    }
}
