//! Operations on logical qubits.
//!
//! Synthesis works on logical qubit indices `0..n` in the qubit order of the
//! unitary being decomposed. Physical placement happens later, in routing.

use num_complex::Complex64;
use qsyn_ir::{Matrix, Unitary2x2};

/// Operation emitted by the synthesizers, on logical qubit indices.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOp {
    /// Arbitrary single-qubit unitary.
    Single { qubit: usize, matrix: Unitary2x2 },
    /// Controlled-Z, symmetric in its operands.
    Cz { a: usize, b: usize },
    /// Exchange of two qubit states.
    Swap { a: usize, b: usize },
}

impl LogicalOp {
    /// Single-qubit unitary on `qubit`.
    pub fn single(qubit: usize, matrix: Unitary2x2) -> Self {
        LogicalOp::Single { qubit, matrix }
    }

    /// CZ on a pair.
    pub fn cz(a: usize, b: usize) -> Self {
        LogicalOp::Cz { a, b }
    }

    /// Exchange on a pair.
    pub fn swap(a: usize, b: usize) -> Self {
        LogicalOp::Swap { a, b }
    }

    /// The pair for two-qubit operations.
    pub fn pair(&self) -> Option<(usize, usize)> {
        match self {
            LogicalOp::Single { .. } => None,
            LogicalOp::Cz { a, b } | LogicalOp::Swap { a, b } => Some((*a, *b)),
        }
    }

    /// Native two-qubit operations this lowers to on adjacent qubits.
    pub fn native_cost(&self) -> usize {
        match self {
            LogicalOp::Single { .. } => 0,
            LogicalOp::Cz { .. } => 1,
            LogicalOp::Swap { .. } => 3,
        }
    }
}

/// CNOT from `control` to `target` as `H·CZ·H` on the target.
pub fn cnot(control: usize, target: usize) -> [LogicalOp; 3] {
    [
        LogicalOp::single(target, Unitary2x2::h()),
        LogicalOp::cz(control, target),
        LogicalOp::single(target, Unitary2x2::h()),
    ]
}

/// Total native two-qubit cost of a list.
pub fn two_qubit_count(ops: &[LogicalOp]) -> usize {
    ops.iter().map(LogicalOp::native_cost).sum()
}

/// Symmetric `n x n` table of two-qubit interaction weights.
pub fn pair_weights(ops: &[LogicalOp], n: usize) -> Vec<Vec<usize>> {
    let mut weights = vec![vec![0; n]; n];
    for op in ops {
        if let Some((a, b)) = op.pair() {
            weights[a][b] += op.native_cost();
            weights[b][a] += op.native_cost();
        }
    }
    weights
}

/// Apply a single-qubit unitary to every column of `m`.
pub(crate) fn apply_single_to(m: &mut Matrix, n: usize, qubit: usize, u: &Unitary2x2) {
    let mask = 1 << (n - 1 - qubit);
    let [u00, u01, u10, u11] = u.data;
    for col in 0..m.ncols() {
        for i in 0..m.nrows() {
            if i & mask == 0 {
                let j = i | mask;
                let a = m[(i, col)];
                let b = m[(j, col)];
                m[(i, col)] = u00 * a + u01 * b;
                m[(j, col)] = u10 * a + u11 * b;
            }
        }
    }
}

/// Compose a logical operation list into its `2^n`-dimensional unitary.
pub fn compose(ops: &[LogicalOp], n: usize) -> Matrix {
    let dim = 1 << n;
    let mut m = Matrix::identity(dim, dim);
    for op in ops {
        match op {
            LogicalOp::Single { qubit, matrix } => apply_single_to(&mut m, n, *qubit, matrix),
            LogicalOp::Cz { a, b } => {
                let mask = (1 << (n - 1 - a)) | (1 << (n - 1 - b));
                for i in 0..dim {
                    if i & mask == mask {
                        for col in 0..dim {
                            m[(i, col)] = -m[(i, col)];
                        }
                    }
                }
            }
            LogicalOp::Swap { a, b } => {
                let (ma, mb) = (1 << (n - 1 - a), 1 << (n - 1 - b));
                for i in 0..dim {
                    if i & ma != 0 && i & mb == 0 {
                        let j = (i & !ma) | mb;
                        m.swap_rows(i, j);
                    }
                }
            }
        }
    }
    m
}

/// Unit phase helper shared by the synthesizers.
pub(crate) fn unit(phase: f64) -> Complex64 {
    Complex64::from_polar(1.0, phase)
}
