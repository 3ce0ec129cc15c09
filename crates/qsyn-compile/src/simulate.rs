//! Statevector simulation of native circuits.
//!
//! Used by the validator to recompute the operator a circuit realizes. The
//! register is big-endian: qubit 0 is the most significant bit of a basis
//! index.

use num_complex::Complex64;
use qsyn_ir::matrix::Matrix;
use qsyn_ir::{GridQubit, Operation, Unitary2x2};
use rand::Rng;
use rustc_hash::FxHashMap;

/// A statevector over `num_qubits` qubits.
#[derive(Debug, Clone)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        Self::basis(num_qubits, 0)
    }

    /// Computational basis state `|index⟩`.
    pub fn basis(num_qubits: usize, index: usize) -> Self {
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        amplitudes[index] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Normalized state with Gaussian-like random amplitudes.
    pub fn random(num_qubits: usize, rng: &mut impl Rng) -> Self {
        let mut amplitudes: Vec<Complex64> = (0..1usize << num_qubits)
            .map(|_| Complex64::new(rng.r#gen::<f64>() - 0.5, rng.r#gen::<f64>() - 0.5))
            .collect();
        let norm = amplitudes.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt();
        for a in &mut amplitudes {
            *a /= norm;
        }
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    #[inline]
    fn mask(&self, qubit: usize) -> usize {
        1 << (self.num_qubits - 1 - qubit)
    }

    /// Apply a 2x2 unitary.
    pub fn apply_single(&mut self, qubit: usize, u: &Unitary2x2) {
        let mask = self.mask(qubit);
        let [u00, u01, u10, u11] = u.data;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let (a, b) = (self.amplitudes[i], self.amplitudes[j]);
                self.amplitudes[i] = u00 * a + u01 * b;
                self.amplitudes[j] = u10 * a + u11 * b;
            }
        }
    }

    /// Apply CZ.
    pub fn apply_cz(&mut self, a: usize, b: usize) {
        let mask = self.mask(a) | self.mask(b);
        for i in 0..self.amplitudes.len() {
            if i & mask == mask {
                self.amplitudes[i] = -self.amplitudes[i];
            }
        }
    }

    /// Exchange two qubits.
    pub fn apply_swap(&mut self, a: usize, b: usize) {
        let (ma, mb) = (self.mask(a), self.mask(b));
        for i in 0..self.amplitudes.len() {
            if i & ma != 0 && i & mb == 0 {
                self.amplitudes.swap(i, (i & !ma) | mb);
            }
        }
    }

    /// Apply a `2^k x 2^k` matrix to `qubits`, the first listed being the
    /// most significant.
    pub fn apply_matrix(&mut self, qubits: &[usize], m: &Matrix) {
        let k = qubits.len();
        let masks: Vec<usize> = qubits.iter().map(|q| self.mask(*q)).collect();
        let all = masks.iter().fold(0, |acc, m| acc | m);
        let offsets: Vec<usize> = (0..1usize << k)
            .map(|local| {
                (0..k)
                    .filter(|bit| local >> (k - 1 - bit) & 1 == 1)
                    .map(|bit| masks[bit])
                    .sum()
            })
            .collect();

        let mut gathered = vec![Complex64::new(0.0, 0.0); offsets.len()];
        for base in 0..self.amplitudes.len() {
            if base & all != 0 {
                continue;
            }
            for (slot, offset) in offsets.iter().enumerate() {
                gathered[slot] = self.amplitudes[base | offset];
            }
            for (row, offset) in offsets.iter().enumerate() {
                self.amplitudes[base | offset] = gathered
                    .iter()
                    .enumerate()
                    .map(|(col, a)| m[(row, col)] * a)
                    .sum();
            }
        }
    }

    /// Apply a native operation; `index` maps device qubits to register
    /// positions.
    pub fn apply(&mut self, op: &Operation, index: &FxHashMap<GridQubit, usize>) {
        let position = |q: &GridQubit| index[q];
        match op {
            Operation::PhasedXz { qubit, gate } => self.apply_single(position(qubit), &gate.matrix()),
            Operation::TwoQubit { qubits, .. } => {
                let pair = [position(&qubits[0]), position(&qubits[1])];
                self.apply_matrix(&pair, &op.matrix());
            }
            Operation::Bridge { qubits } => self.apply_swap(position(&qubits[0]), position(&qubits[1])),
        }
    }

    /// `⟨self|other⟩`.
    pub fn inner(&self, other: &Statevector) -> Complex64 {
        self.amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| a.conj() * b)
            .sum()
    }
}

/// Random unitary on `num_qubits` qubits, from the QR factorization of a
/// random complex matrix with the phases of `R`'s diagonal removed.
pub fn random_unitary(num_qubits: usize, rng: &mut impl Rng) -> Matrix {
    let dim = 1usize << num_qubits;
    let sample = Matrix::from_fn(dim, dim, |_, _| {
        let (re, im): (f64, f64) = (rng.r#gen(), rng.r#gen());
        Complex64::new(re - 0.5, im - 0.5)
    });
    let qr = sample.qr();
    let (q, r) = (qr.q(), qr.r());
    Matrix::from_fn(dim, dim, |i, j| {
        let d = r[(j, j)];
        let phase = if d.norm() > 0.0 { d / d.norm() } else { Complex64::new(1.0, 0.0) };
        q[(i, j)] * phase
    })
}
