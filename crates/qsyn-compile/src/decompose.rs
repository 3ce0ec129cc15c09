//! Recursive decomposition of unitaries into logical operations.
//!
//! Nodes live in an arena and are expanded from an explicit work stack, so
//! recursion depth never touches the call stack. Every node first goes
//! through the [pattern table](crate::matcher); unmatched nodes with more
//! than two qubits are split by a cosine-sine decomposition on the axis
//! qubit, whose outer factors are demultiplexed:
//!
//! ```text
//! U = (I⊗V_L)(D_L⊕D_L†)(I⊗W_L) · CS · (I⊗V_R)(D_R⊕D_R†)(I⊗W_R)
//! ```
//!
//! Children always act on fewer qubits than their parent.

use qsyn_ir::Unitary2x2;
use qsyn_ir::matrix::{Matrix, permute_qubits};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::{AxisPolicy, SynthesisConfig};
use crate::error::CompileResult;
use crate::logical::LogicalOp;
use crate::matcher::{MatchContext, match_structure};
use crate::synthesis::multiplex::{RotationAxis, cosine_sine, demultiplex, multiplexed_rotation};
use crate::synthesis::two_qubit::TwoQubitSynthesizer;

/// Output of a node expansion.
#[derive(Debug, Clone)]
pub enum Piece {
    /// Finished operations.
    Ops(Vec<LogicalOp>),
    /// A smaller unitary still to be decomposed.
    Child { matrix: Matrix, qubits: Vec<usize> },
}

impl Piece {
    pub fn child(matrix: Matrix, qubits: Vec<usize>) -> Self {
        Piece::Child { matrix, qubits }
    }
}

type NodeId = usize;

#[derive(Debug)]
enum Item {
    Ops(Vec<LogicalOp>),
    Node(NodeId),
}

#[derive(Debug)]
struct Node {
    /// Taken when the node is expanded.
    matrix: Option<Matrix>,
    qubits: Vec<usize>,
    depth: usize,
    items: Vec<Item>,
}

/// Flattened result of a decomposition.
#[derive(Debug, Clone, Default)]
pub struct Decomposition {
    pub ops: Vec<LogicalOp>,
    /// Number of tree nodes expanded.
    pub nodes: usize,
    /// Deepest node, the root being depth 0.
    pub max_depth: usize,
    /// How many nodes each rule handled.
    pub rules: FxHashMap<&'static str, usize>,
}

/// Decomposes an `n`-qubit unitary on logical qubits `0..n`.
pub struct Decomposer<'a> {
    config: &'a SynthesisConfig,
    axis: AxisPolicy,
    matcher: MatchContext<'a>,
    two_qubit: TwoQubitSynthesizer,
}

impl<'a> Decomposer<'a> {
    pub fn new(config: &'a SynthesisConfig, axis: AxisPolicy) -> Self {
        Self {
            config,
            axis,
            matcher: MatchContext::new(config),
            two_qubit: TwoQubitSynthesizer::new(config),
        }
    }

    /// Decompose `u`, whose qubit `i` is logical qubit `i`.
    pub fn decompose(&self, u: &Matrix) -> CompileResult<Decomposition> {
        let n = qsyn_ir::matrix::num_qubits(u)?;
        let mut arena = vec![Node {
            matrix: Some(u.clone()),
            qubits: (0..n).collect(),
            depth: 0,
            items: Vec::new(),
        }];
        let mut rules: FxHashMap<&'static str, usize> = FxHashMap::default();
        let mut stack: Vec<NodeId> = vec![0];

        while let Some(id) = stack.pop() {
            let (matrix, qubits, depth) = {
                let node = &mut arena[id];
                let Some(matrix) = node.matrix.take() else {
                    continue;
                };
                (matrix, node.qubits.clone(), node.depth)
            };

            let (rule, pieces) = self.expand(&matrix, &qubits)?;
            *rules.entry(rule).or_default() += 1;

            let mut items = Vec::with_capacity(pieces.len());
            let mut children = Vec::new();
            for piece in pieces {
                match piece {
                    Piece::Ops(ops) => items.push(Item::Ops(ops)),
                    Piece::Child { matrix, qubits } => {
                        debug_assert!(qubits.len() < arena[id].qubits.len());
                        let child = arena.len();
                        arena.push(Node {
                            matrix: Some(matrix),
                            qubits,
                            depth: depth + 1,
                            items: Vec::new(),
                        });
                        items.push(Item::Node(child));
                        children.push(child);
                    }
                }
            }
            arena[id].items = items;
            // Leftmost child on top of the stack.
            stack.extend(children.into_iter().rev());
        }

        let max_depth = arena.iter().map(|node| node.depth).max().unwrap_or(0);
        let nodes = arena.len();
        let ops = flatten(&mut arena);
        debug!(nodes, max_depth, ops = ops.len(), "decomposition finished");
        Ok(Decomposition {
            ops,
            nodes,
            max_depth,
            rules,
        })
    }

    fn expand(&self, u: &Matrix, qubits: &[usize]) -> CompileResult<(&'static str, Vec<Piece>)> {
        if let Some(found) = match_structure(&self.matcher, u, qubits)? {
            return Ok(found);
        }
        match qubits.len() {
            1 => {
                let gate = Unitary2x2::from_block(u, 0, 0);
                Ok(("single_qubit", vec![Piece::Ops(vec![LogicalOp::single(qubits[0], gate)])]))
            }
            2 => {
                let ops = self.two_qubit.synthesize(u, qubits[0], qubits[1])?;
                Ok(("two_qubit", vec![Piece::Ops(ops)]))
            }
            _ => Ok(("cosine_sine", self.split(u, qubits)?)),
        }
    }

    /// Cosine-sine split on the axis qubit.
    fn split(&self, u: &Matrix, qubits: &[usize]) -> CompileResult<Vec<Piece>> {
        let k = qubits.len();
        let (u, qubits): (Matrix, Vec<usize>) = match self.axis {
            AxisPolicy::MostSignificant => (u.clone(), qubits.to_vec()),
            AxisPolicy::LeastSignificant => {
                let order: Vec<usize> = std::iter::once(k - 1).chain(0..k - 1).collect();
                let moved = order.iter().map(|q| qubits[*q]).collect();
                (permute_qubits(u, &order), moved)
            }
        };
        let (axis, rest) = (qubits[0], &qubits[1..]);
        let tol = self.config.gate_tolerance;
        let angle_tol = self.config.angle_tolerance;

        let csd = cosine_sine(&u, tol)?;
        let right = demultiplex(&csd.right.0, &csd.right.1, tol)?;
        let left = demultiplex(&csd.left.0, &csd.left.1, tol)?;

        Ok(vec![
            Piece::child(right.w, rest.to_vec()),
            Piece::Ops(multiplexed_rotation(RotationAxis::Z, rest, axis, &right.angles, angle_tol)),
            Piece::child(right.v, rest.to_vec()),
            Piece::Ops(multiplexed_rotation(RotationAxis::Y, rest, axis, &csd.angles, angle_tol)),
            Piece::child(left.w, rest.to_vec()),
            Piece::Ops(multiplexed_rotation(RotationAxis::Z, rest, axis, &left.angles, angle_tol)),
            Piece::child(left.v, rest.to_vec()),
        ])
    }
}

/// Emit the tree's operations in order, with an explicit stack.
fn flatten(arena: &mut [Node]) -> Vec<LogicalOp> {
    let mut ops = Vec::new();
    let mut stack: Vec<(NodeId, usize)> = vec![(0, 0)];
    while let Some((id, next)) = stack.pop() {
        if next >= arena[id].items.len() {
            continue;
        }
        stack.push((id, next + 1));
        match &mut arena[id].items[next] {
            Item::Ops(list) => ops.append(list),
            Item::Node(child) => stack.push((*child, 0)),
        }
    }
    ops
}
