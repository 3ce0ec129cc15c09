//! Lowering of routed circuits to native operations.
//!
//! Three rewrites run in order:
//!
//! 1. Back-to-back exchanges on the same pair cancel.
//! 2. Remaining exchanges, and CZ when the gate set lacks it, are lowered
//!    to native gates.
//! 3. Runs of single-qubit gates on a qubit are multiplied together and
//!    emitted as one `PhasedXZ`; identities are dropped.

use qsyn_ir::{GridQubit, NativeGateSet, Operation, Unitary2x2};
use rustc_hash::FxHashMap;

use crate::routing::PhysicalOp;
use crate::synthesis::single::SingleQubitSynthesizer;
use crate::synthesis::two_qubit::{cz_operations, swap_operations};

/// Merged single-qubit gates within this distance of identity are dropped.
const IDENTITY_EPSILON: f64 = 1e-10;

fn same_pair(x: (GridQubit, GridQubit), y: (GridQubit, GridQubit)) -> bool {
    x == y || (x.0 == y.1 && x.1 == y.0)
}

/// Remove exchanges that immediately undo each other. Nested pairs
/// collapse in one pass.
pub fn cancel_bridges(ops: Vec<PhysicalOp>) -> Vec<PhysicalOp> {
    let mut out: Vec<PhysicalOp> = Vec::with_capacity(ops.len());
    for op in ops {
        if let PhysicalOp::Bridge { a, b } = op {
            if let Some(PhysicalOp::Bridge { a: pa, b: pb }) = out.last() {
                if same_pair((a, b), (*pa, *pb)) {
                    out.pop();
                    continue;
                }
            }
        }
        out.push(op);
    }
    out
}

#[derive(Debug, Clone)]
enum Staged {
    Single(GridQubit, Unitary2x2),
    Native(Operation),
}

/// Lower a routed circuit to native operations.
pub fn assemble(ops: Vec<PhysicalOp>, gate_set: &NativeGateSet) -> Vec<Operation> {
    let mut staged = Vec::with_capacity(ops.len());
    for op in cancel_bridges(ops) {
        match op {
            PhysicalOp::Single { qubit, matrix } => staged.push(Staged::Single(qubit, matrix)),
            PhysicalOp::Cz { a, b } => staged.extend(stage(cz_operations(a, b, gate_set))),
            PhysicalOp::Bridge { a, b } => staged.extend(stage(swap_operations(a, b, gate_set))),
        }
    }
    merge_single_qubit(staged)
}

/// Single-qubit parts of a lowering join the surrounding merge.
fn stage(ops: Vec<Operation>) -> impl Iterator<Item = Staged> {
    ops.into_iter().map(|native| match native {
        Operation::PhasedXz { qubit, gate } => Staged::Single(qubit, gate.matrix()),
        other => Staged::Native(other),
    })
}

fn merge_single_qubit(staged: Vec<Staged>) -> Vec<Operation> {
    let mut pending: FxHashMap<GridQubit, Unitary2x2> = FxHashMap::default();
    let mut out = Vec::with_capacity(staged.len());

    let flush = |qubit: GridQubit, u: Unitary2x2, out: &mut Vec<Operation>| {
        if !u.is_identity_within(IDENTITY_EPSILON) {
            let gate = SingleQubitSynthesizer::synthesize(&u);
            if !gate.is_identity(IDENTITY_EPSILON) {
                out.push(Operation::phased_xz(qubit, gate));
            }
        }
    };

    for item in staged {
        match item {
            Staged::Single(qubit, u) => {
                let acc = pending.entry(qubit).or_insert_with(Unitary2x2::identity);
                *acc = u * *acc;
            }
            Staged::Native(op) => {
                for q in op.qubits() {
                    if let Some(u) = pending.remove(q) {
                        flush(*q, u, &mut out);
                    }
                }
                out.push(op);
            }
        }
    }

    let mut rest: Vec<_> = pending.into_iter().collect();
    rest.sort_by_key(|(q, _)| *q);
    for (q, u) in rest {
        flush(q, u, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsyn_ir::TwoQubitPrimitive;

    fn q(c: i32) -> GridQubit {
        GridQubit::new(0, c)
    }

    #[test]
    fn test_nested_bridges_cancel() {
        let ops = vec![
            PhysicalOp::Bridge { a: q(0), b: q(1) },
            PhysicalOp::Bridge { a: q(1), b: q(2) },
            PhysicalOp::Bridge { a: q(2), b: q(1) },
            PhysicalOp::Bridge { a: q(0), b: q(1) },
            PhysicalOp::Cz { a: q(0), b: q(1) },
        ];
        assert_eq!(cancel_bridges(ops), vec![PhysicalOp::Cz { a: q(0), b: q(1) }]);
    }

    #[test]
    fn test_single_qubit_runs_merge() {
        let ops = vec![
            PhysicalOp::Single { qubit: q(0), matrix: Unitary2x2::h() },
            PhysicalOp::Single { qubit: q(0), matrix: Unitary2x2::s() },
            PhysicalOp::Single { qubit: q(1), matrix: Unitary2x2::x() },
            PhysicalOp::Cz { a: q(0), b: q(1) },
            PhysicalOp::Single { qubit: q(0), matrix: Unitary2x2::h() },
            PhysicalOp::Single { qubit: q(0), matrix: Unitary2x2::h() },
        ];
        let out = assemble(ops, &NativeGateSet::sycamore());
        assert_eq!(out.len(), 3);
        assert!(out[2].is_two_qubit());
        assert!(out[..2].iter().all(|op| !op.is_two_qubit()));
    }

    #[test]
    fn test_bridge_lowering() {
        let ops = vec![PhysicalOp::Bridge { a: q(0), b: q(1) }];
        let syc = assemble(ops.clone(), &NativeGateSet::sycamore());
        assert_eq!(syc.iter().filter(|op| op.is_two_qubit()).count(), 3);
        assert!(syc.iter().any(|op| matches!(
            op,
            Operation::TwoQubit { primitive: TwoQubitPrimitive::ISwap, .. }
        )));
        let cz = assemble(ops, &NativeGateSet::cz_only());
        assert_eq!(cz.iter().filter(|op| op.is_two_qubit()).count(), 3);
        assert!(cz.iter().all(|op| !matches!(op, Operation::Bridge { .. })));
    }

    #[test]
    fn test_cz_lowered_without_native_cz() {
        let ops = vec![
            PhysicalOp::Single { qubit: q(0), matrix: Unitary2x2::h() },
            PhysicalOp::Cz { a: q(0), b: q(1) },
            PhysicalOp::Bridge { a: q(1), b: q(2) },
        ];
        let gate_set = NativeGateSet::sqrt_iswap();
        let out = assemble(ops, &gate_set);
        let entanglers: Vec<_> = out.iter().filter(|op| op.is_two_qubit()).collect();
        assert_eq!(entanglers.len(), 2 + 3);
        for op in entanglers {
            let Operation::TwoQubit { primitive, exponent, .. } = op else {
                panic!("unexpected {op}");
            };
            assert!(gate_set.allows(*primitive, *exponent));
        }
    }
}
