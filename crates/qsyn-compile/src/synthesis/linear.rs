//! Permutation matrices as reversible circuits.
//!
//! A monomial unitary `U = P·D` maps `|x⟩ ↦ e^{iφ_x}|f(x)⟩`. When
//! `f(x) = A·x ⊕ b` for an invertible bit matrix `A`, the permutation part is
//! a reversible linear circuit: exchanges if `A` only reorders wires, a CNOT
//! network from Gauss-Jordan elimination otherwise, followed by X flips for
//! `b`. Any other `f` is written as a sequence of multi-controlled X gates
//! (see [`toffoli_network`]).

use qsyn_ir::Unitary2x2;
use qsyn_ir::matrix::Matrix;

use crate::logical::{LogicalOp, cnot};

/// `x ↦ A·x ⊕ b` on `k` bits.
///
/// `rows[i]` has bit `j` set when output bit `i` depends on input bit `j`;
/// bit `i` of a vector belongs to qubit `i` of the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffineMap {
    pub rows: Vec<usize>,
    pub shift: usize,
}

/// Basis permutation and phases of a monomial matrix.
#[derive(Debug, Clone)]
pub struct Monomial {
    /// `image[x]` is the row of the non-zero entry in column `x`.
    pub image: Vec<usize>,
    /// Phase of that entry, applied before the permutation.
    pub phases: Vec<f64>,
}

impl Monomial {
    /// Whether the permutation part is the identity.
    pub fn is_diagonal(&self) -> bool {
        self.image.iter().enumerate().all(|(x, y)| x == *y)
    }
}

/// Read `u` as a monomial matrix: every column holds a single entry of
/// modulus one, the rest below `tol`.
pub fn monomial(u: &Matrix, tol: f64) -> Option<Monomial> {
    let dim = u.nrows();
    let mut image = Vec::with_capacity(dim);
    let mut phases = Vec::with_capacity(dim);
    let mut seen = vec![false; dim];
    for col in 0..dim {
        let mut hit = None;
        for row in 0..dim {
            let z = u[(row, col)];
            if z.norm() > tol {
                if hit.is_some() || (z.norm() - 1.0).abs() > tol {
                    return None;
                }
                hit = Some((row, z.arg()));
            }
        }
        let (row, phase) = hit?;
        if std::mem::replace(&mut seen[row], true) {
            return None;
        }
        image.push(row);
        phases.push(phase);
    }
    Some(Monomial { image, phases })
}

/// Convert between a basis index (qubit 0 most significant) and the
/// qubit-indexed bit vector used by [`AffineMap`].
fn to_bits(index: usize, k: usize) -> usize {
    (0..k).filter(|j| index >> (k - 1 - j) & 1 == 1).map(|j| 1 << j).sum()
}

fn apply_rows(rows: &[usize], bits: usize) -> usize {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| (*row & bits).count_ones() % 2 == 1)
        .map(|(i, _)| 1 << i)
        .sum()
}

/// Recover `A` and `b` from a basis permutation, if it is affine.
pub fn affine_form(image: &[usize], k: usize) -> Option<AffineMap> {
    let f = |x: usize| to_bits(image[to_bits(x, k)], k);
    // `to_bits` is an involution on indices, so `f` acts on bit vectors.
    let shift = f(0);
    let columns: Vec<usize> = (0..k).map(|j| f(1 << j) ^ shift).collect();
    let rows: Vec<usize> = (0..k)
        .map(|i| {
            (0..k)
                .filter(|j| columns[*j] >> i & 1 == 1)
                .map(|j| 1 << j)
                .sum()
        })
        .collect();
    let consistent = (0..1usize << k).all(|x| apply_rows(&rows, x) ^ shift == f(x));
    consistent.then_some(AffineMap { rows, shift })
}

impl AffineMap {
    /// For a pure wire reordering, `source[i]` is the input wire that ends
    /// up on wire `i`.
    pub fn wire_permutation(&self) -> Option<Vec<usize>> {
        self.rows
            .iter()
            .map(|row| (row.count_ones() == 1).then(|| row.trailing_zeros() as usize))
            .collect()
    }

    /// Circuit realizing the map on `qubits`.
    pub fn synthesize(&self, qubits: &[usize]) -> Vec<LogicalOp> {
        let mut ops = match self.wire_permutation() {
            Some(source) => exchange_network(&source, qubits),
            None => cnot_network(&self.rows, qubits),
        };
        ops.extend(
            (0..qubits.len())
                .filter(|i| self.shift >> i & 1 == 1)
                .map(|i| LogicalOp::single(qubits[i], Unitary2x2::x())),
        );
        ops
    }
}

/// Selection-sort style exchanges, one per element out of place, which is
/// `k − cycles` in total.
fn exchange_network(source: &[usize], qubits: &[usize]) -> Vec<LogicalOp> {
    let mut wires: Vec<usize> = (0..source.len()).collect();
    let mut ops = Vec::new();
    for i in 0..source.len() {
        if wires[i] == source[i] {
            continue;
        }
        if let Some(j) = (i + 1..source.len()).find(|j| wires[*j] == source[i]) {
            wires.swap(i, j);
            ops.push(LogicalOp::swap(qubits[i], qubits[j]));
        }
    }
    ops
}

/// Reduce `rows` to the identity with row additions; the recorded
/// additions, replayed backwards, realize the map.
fn cnot_network(rows: &[usize], qubits: &[usize]) -> Vec<LogicalOp> {
    let k = rows.len();
    let mut rows = rows.to_vec();
    let mut record: Vec<(usize, usize)> = Vec::new();

    for c in 0..k {
        if rows[c] >> c & 1 == 0 {
            if let Some(r) = (c + 1..k).find(|r| rows[*r] >> c & 1 == 1) {
                rows[c] ^= rows[r];
                record.push((r, c));
            }
        }
        for r in 0..k {
            if r != c && rows[r] >> c & 1 == 1 {
                rows[r] ^= rows[c];
                record.push((c, r));
            }
        }
    }

    record
        .iter()
        .rev()
        .flat_map(|(control, target)| cnot(qubits[*control], qubits[*target]))
        .collect()
}

/// Flip bit `target` when every bit of `controls` is set.
///
/// Bits index the qubit-ordered vectors of [`AffineMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toffoli {
    pub controls: usize,
    pub target: usize,
}

impl Toffoli {
    fn apply(self, bits: usize) -> usize {
        if bits & self.controls == self.controls {
            bits ^ (1 << self.target)
        } else {
            bits
        }
    }
}

fn set_bits(mask: usize) -> impl Iterator<Item = usize> {
    (0..usize::BITS as usize).filter(move |b| mask >> b & 1 == 1)
}

/// Multi-controlled X gates realizing an arbitrary basis permutation, in
/// application order.
///
/// Inputs are fixed in increasing basis order. When input `i` is reached,
/// every smaller input already maps to itself, so its image `y` is larger
/// than `i`. Bits of `i` missing from `y` are raised under control of the
/// set bits of `y`, then bits of `y` missing from `i` are cleared under
/// control of the set bits of `i`; neither gate fires on a smaller input.
/// The gates undo `f` from the output side, so the circuit is the list
/// reversed.
pub fn toffoli_network(image: &[usize], k: usize) -> Vec<Toffoli> {
    let mut f = image.to_vec();
    let mut gates = Vec::new();
    let mut push = |gate: Toffoli, f: &mut Vec<usize>| {
        for y in f.iter_mut() {
            *y = gate.apply(*y);
        }
        gates.push(gate);
    };
    for i in 0..f.len() {
        let y = f[i];
        if y == i {
            continue;
        }
        for bit in set_bits(i & !y) {
            let controls = f[i];
            push(Toffoli { controls, target: bit }, &mut f);
        }
        for bit in set_bits(f[i] & !i) {
            push(Toffoli { controls: i, target: bit }, &mut f);
        }
        debug_assert_eq!(f[i], i);
    }
    // Basis bit `b` belongs to qubit `k - 1 - b`.
    gates
        .into_iter()
        .rev()
        .map(|g| Toffoli {
            controls: to_bits(g.controls, k),
            target: k - 1 - g.target,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical::compose;
    use num_complex::Complex64;
    use qsyn_ir::matrix::phase_distance;

    fn permutation_matrix(image: &[usize]) -> Matrix {
        let n = image.len();
        let mut m = Matrix::zeros(n, n);
        for (x, y) in image.iter().enumerate() {
            m[(*y, x)] = Complex64::new(1.0, 0.0);
        }
        m
    }

    #[test]
    fn test_monomial_detection() {
        let m = permutation_matrix(&[2, 0, 3, 1]);
        let mono = monomial(&m, 1e-9).unwrap();
        assert_eq!(mono.image, vec![2, 0, 3, 1]);
        assert!(!mono.is_diagonal());
        assert!(monomial(&Matrix::from_element(2, 2, Complex64::new(0.5, 0.5)), 1e-9).is_none());
    }

    #[test]
    fn test_toffoli_is_not_affine() {
        let mut image: Vec<usize> = (0..8).collect();
        image.swap(6, 7);
        assert!(affine_form(&image, 3).is_none());
    }

    #[test]
    fn test_cnot_chain() {
        // x1 ^= x0, then x2 ^= x1, plus a flip of qubit 2.
        let image: Vec<usize> = (0..8usize)
            .map(|x| {
                let (b0, b1, b2) = (x >> 2 & 1, x >> 1 & 1, x & 1);
                let (n1, n2) = (b1 ^ b0, b2 ^ b1 ^ b0 ^ 1);
                b0 << 2 | n1 << 1 | n2
            })
            .collect();
        let map = affine_form(&image, 3).unwrap();
        assert!(map.wire_permutation().is_none());
        let ops = map.synthesize(&[0, 1, 2]);
        assert!(phase_distance(&compose(&ops, 3), &permutation_matrix(&image)) < 1e-10);
    }

    #[test]
    fn test_wire_rotation_uses_exchanges() {
        // Cyclic shift of three wires: two exchanges.
        let image: Vec<usize> = (0..8usize)
            .map(|x| {
                let (b0, b1, b2) = (x >> 2 & 1, x >> 1 & 1, x & 1);
                b2 << 2 | b0 << 1 | b1
            })
            .collect();
        let map = affine_form(&image, 3).unwrap();
        let ops = map.synthesize(&[0, 1, 2]);
        assert_eq!(ops.iter().filter(|op| matches!(op, LogicalOp::Swap { .. })).count(), 2);
        assert!(phase_distance(&compose(&ops, 3), &permutation_matrix(&image)) < 1e-10);
    }

    /// `x ↦ x + 1 mod 2^k`.
    fn incrementer(k: usize) -> Vec<usize> {
        (0..1usize << k).map(|x| (x + 1) % (1 << k)).collect()
    }

    fn run_network(gates: &[Toffoli], k: usize) -> Vec<usize> {
        (0..1usize << k)
            .map(|x| to_bits(gates.iter().fold(to_bits(x, k), |bits, g| g.apply(bits)), k))
            .collect()
    }

    #[test]
    fn test_toffoli_network_incrementer() {
        for k in 1..=6 {
            let image = incrementer(k);
            assert!(k < 3 || affine_form(&image, k).is_none());
            let gates = toffoli_network(&image, k);
            assert_eq!(gates.len(), k);
            assert_eq!(run_network(&gates, k), image);
        }
    }

    #[test]
    fn test_toffoli_network_arbitrary_permutation() {
        let image = vec![5, 0, 7, 2, 6, 1, 4, 3];
        let gates = toffoli_network(&image, 3);
        assert_eq!(run_network(&gates, 3), image);
        assert!(gates.iter().all(|g| g.controls >> g.target & 1 == 0));
    }

    #[test]
    fn test_toffoli_network_identity_is_empty() {
        let image: Vec<usize> = (0..16).collect();
        assert!(toffoli_network(&image, 4).is_empty());
    }

    #[test]
    fn test_pivot_repair() {
        // Row 0 starts without its pivot: x0' = x1, x1' = x0 ^ x1.
        let image: Vec<usize> = (0..4usize)
            .map(|x| {
                let (b0, b1) = (x >> 1 & 1, x & 1);
                b1 << 1 | (b0 ^ b1)
            })
            .collect();
        let map = affine_form(&image, 2).unwrap();
        let ops = map.synthesize(&[0, 1]);
        assert!(phase_distance(&compose(&ops, 2), &permutation_matrix(&image)) < 1e-10);
    }
}
