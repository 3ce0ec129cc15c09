//! Structure recognition at decomposition nodes.
//!
//! Patterns are tried in table order; the first one that applies decides
//! how the node is split. A pattern either emits operations directly or
//! hands smaller unitaries back to the decomposer as children.

use std::f64::consts::PI;

use qsyn_ir::Unitary2x2;
use qsyn_ir::matrix::{self, Matrix, is_diagonal, is_identity_up_to_phase, permute_qubits};
use tracing::trace;

use crate::config::SynthesisConfig;
use crate::decompose::Piece;
use crate::error::CompileResult;
use crate::logical::{LogicalOp, two_qubit_count};
use crate::synthesis::diagonal::{DiagonalSynthesizer, diagonal_phases};
use crate::synthesis::linear::{affine_form, monomial, toffoli_network};
use crate::synthesis::multiplex::{RotationAxis, demultiplex, multiplexed_rotation};

/// State shared by pattern handlers during one decomposition.
pub struct MatchContext<'a> {
    config: &'a SynthesisConfig,
    diagonal: DiagonalSynthesizer,
}

impl<'a> MatchContext<'a> {
    pub fn new(config: &'a SynthesisConfig) -> Self {
        Self {
            config,
            diagonal: DiagonalSynthesizer::new(config),
        }
    }

    fn tol(&self) -> f64 {
        self.config.match_tolerance
    }
}

/// Handler signature: `Ok(None)` when the pattern does not apply.
pub type PatternFn = fn(&MatchContext<'_>, &Matrix, &[usize]) -> CompileResult<Option<Vec<Piece>>>;

/// One entry of the pattern table.
#[derive(Clone, Copy)]
pub struct Pattern {
    pub name: &'static str,
    /// Smallest node the pattern is tried on.
    pub min_qubits: usize,
    pub apply: PatternFn,
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pattern")
            .field("name", &self.name)
            .field("min_qubits", &self.min_qubits)
            .finish()
    }
}

/// The pattern table, in priority order.
pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "identity",
        min_qubits: 1,
        apply: match_identity,
    },
    Pattern {
        name: "separable",
        min_qubits: 2,
        apply: match_separable,
    },
    Pattern {
        name: "permutation",
        min_qubits: 3,
        apply: match_permutation,
    },
    Pattern {
        name: "diagonal",
        min_qubits: 3,
        apply: match_diagonal,
    },
    Pattern {
        name: "single_control",
        min_qubits: 3,
        apply: match_single_control,
    },
];

/// Try the table on a node.
pub fn match_structure(
    ctx: &MatchContext<'_>,
    u: &Matrix,
    qubits: &[usize],
) -> CompileResult<Option<(&'static str, Vec<Piece>)>> {
    for pattern in PATTERNS.iter().filter(|p| qubits.len() >= p.min_qubits) {
        if let Some(pieces) = (pattern.apply)(ctx, u, qubits)? {
            trace!(pattern = pattern.name, qubits = qubits.len(), "pattern matched");
            return Ok(Some((pattern.name, pieces)));
        }
    }
    Ok(None)
}

fn match_identity(ctx: &MatchContext<'_>, u: &Matrix, _qubits: &[usize]) -> CompileResult<Option<Vec<Piece>>> {
    Ok(is_identity_up_to_phase(u, ctx.tol()).then(Vec::new))
}

/// Split `u` as `A ⊗ B` with `A` on the first `left` qubits.
fn tensor_split(u: &Matrix, left: usize, tol: f64) -> Option<(Matrix, Matrix)> {
    let n = matrix::num_qubits(u).ok()?;
    let (da, db) = (1usize << left, 1usize << (n - left));
    let sub = |i: usize, j: usize| u.view((i * db, j * db), (db, db));

    let (bi, bj) = (0..da)
        .flat_map(|i| (0..da).map(move |j| (i, j)))
        .max_by(|x, y| sub(x.0, x.1).norm().total_cmp(&sub(y.0, y.1).norm()))?;
    let pivot = sub(bi, bj);
    let norm = pivot.norm();
    if norm <= tol {
        return None;
    }
    let b = pivot * num_complex::Complex64::new((db as f64).sqrt() / norm, 0.0);
    let bd = b.adjoint();
    let a = Matrix::from_fn(da, da, |i, j| (&bd * sub(i, j)).trace() / db as f64);

    let distance = (a.kronecker(&b) - u).norm();
    (distance <= tol * u.nrows() as f64).then_some((a, b))
}

fn match_separable(ctx: &MatchContext<'_>, u: &Matrix, qubits: &[usize]) -> CompileResult<Option<Vec<Piece>>> {
    let k = qubits.len();
    for left in 1..k {
        if let Some((a, b)) = tensor_split(u, left, ctx.tol()) {
            return Ok(Some(vec![
                Piece::child(a, qubits[..left].to_vec()),
                Piece::child(b, qubits[left..].to_vec()),
            ]));
        }
    }
    // One inner qubit against the rest.
    for j in 1..k.saturating_sub(1) {
        let order: Vec<usize> = std::iter::once(j).chain((0..k).filter(|q| *q != j)).collect();
        let permuted = permute_qubits(u, &order);
        if let Some((a, b)) = tensor_split(&permuted, 1, ctx.tol()) {
            let rest = order[1..].iter().map(|q| qubits[*q]).collect();
            return Ok(Some(vec![Piece::child(a, vec![qubits[j]]), Piece::child(b, rest)]));
        }
    }
    Ok(None)
}

/// Two-qubit cost of the generic split on `k` qubits. A permutation network
/// is only worth emitting below it.
fn generic_bound(k: usize) -> usize {
    let dim = 1usize << k;
    (9 * dim * dim / 16).saturating_sub(3 * dim / 2)
}

fn match_permutation(ctx: &MatchContext<'_>, u: &Matrix, qubits: &[usize]) -> CompileResult<Option<Vec<Piece>>> {
    let Some(mono) = monomial(u, ctx.tol()) else {
        return Ok(None);
    };
    if mono.is_diagonal() {
        return Ok(None);
    }
    let k = qubits.len();
    let network = match affine_form(&mono.image, k) {
        Some(map) => map.synthesize(qubits),
        None => {
            let Some(ops) = controlled_x_network(ctx, &mono.image, qubits, generic_bound(k))? else {
                return Ok(None);
            };
            ops
        }
    };
    let phases = ctx.diagonal.synthesize(&mono.phases, qubits)?;
    Ok(Some(vec![Piece::Ops(phases), Piece::Ops(network)]))
}

/// Non-affine permutation as multi-controlled X gates, each `H·CⁿZ·H` on
/// its target. `None` once the cost passes `budget`.
fn controlled_x_network(
    ctx: &MatchContext<'_>,
    image: &[usize],
    qubits: &[usize],
    budget: usize,
) -> CompileResult<Option<Vec<LogicalOp>>> {
    // CⁿZ templates on local wires, by wire count.
    let mut templates: Vec<Option<Vec<LogicalOp>>> = vec![None; qubits.len() + 1];
    let mut ops = Vec::new();
    let mut cost = 0;
    for gate in toffoli_network(image, qubits.len()) {
        let target = qubits[gate.target];
        let wires: Vec<usize> = (0..qubits.len())
            .filter(|j| gate.controls >> j & 1 == 1)
            .map(|j| qubits[j])
            .chain(std::iter::once(target))
            .collect();
        if wires.len() == 1 {
            ops.push(LogicalOp::single(target, Unitary2x2::x()));
            continue;
        }
        let m = wires.len();
        if templates[m].is_none() {
            let mut phases = vec![0.0; 1 << m];
            phases[(1 << m) - 1] = PI;
            let local: Vec<usize> = (0..m).collect();
            templates[m] = Some(ctx.diagonal.synthesize(&phases, &local)?);
        }
        let template = templates[m].as_deref().unwrap_or_default();
        cost += two_qubit_count(template);
        if cost > budget {
            trace!(cost, budget, "permutation network over budget");
            return Ok(None);
        }
        ops.push(LogicalOp::single(target, Unitary2x2::h()));
        ops.extend(template.iter().map(|op| relabel(op, &wires)));
        ops.push(LogicalOp::single(target, Unitary2x2::h()));
    }
    Ok(Some(ops))
}

fn relabel(op: &LogicalOp, wires: &[usize]) -> LogicalOp {
    match *op {
        LogicalOp::Single { qubit, matrix } => LogicalOp::single(wires[qubit], matrix),
        LogicalOp::Cz { a, b } => LogicalOp::cz(wires[a], wires[b]),
        LogicalOp::Swap { a, b } => LogicalOp::swap(wires[a], wires[b]),
    }
}

fn match_diagonal(ctx: &MatchContext<'_>, u: &Matrix, qubits: &[usize]) -> CompileResult<Option<Vec<Piece>>> {
    if !is_diagonal(u, ctx.tol()) {
        return Ok(None);
    }
    let ops = ctx.diagonal.synthesize(&diagonal_phases(u), qubits)?;
    Ok(Some(vec![Piece::Ops(ops)]))
}

fn match_single_control(ctx: &MatchContext<'_>, u: &Matrix, qubits: &[usize]) -> CompileResult<Option<Vec<Piece>>> {
    let k = qubits.len();
    let h = u.nrows() / 2;
    for j in 0..k {
        let order: Vec<usize> = std::iter::once(j).chain((0..k).filter(|q| *q != j)).collect();
        let permuted = if j == 0 { u.clone() } else { permute_qubits(u, &order) };
        let off = permuted.view((0, h), (h, h)).norm().max(permuted.view((h, 0), (h, h)).norm());
        if off > ctx.tol() * h as f64 {
            continue;
        }
        let u0 = permuted.view((0, 0), (h, h)).into_owned();
        let u1 = permuted.view((h, h), (h, h)).into_owned();
        let demux = demultiplex(&u0, &u1, ctx.config.gate_tolerance)?;
        let rest: Vec<usize> = order[1..].iter().map(|q| qubits[*q]).collect();
        let mux = multiplexed_rotation(
            RotationAxis::Z,
            &rest,
            qubits[j],
            &demux.angles,
            ctx.config.angle_tolerance,
        );
        return Ok(Some(vec![
            Piece::child(demux.w, rest.clone()),
            Piece::Ops(mux),
            Piece::child(demux.v, rest),
        ]));
    }
    Ok(None)
}
