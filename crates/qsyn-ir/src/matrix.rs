//! Dense complex matrices acting on qubit registers.
//!
//! All matrices use big-endian basis ordering: qubit 0 of the register is the
//! most significant bit of the basis index, so `kron(a, b)` places `a` on the
//! first qubit.

use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::error::{IrError, IrResult};

/// Dense complex matrix used for unitaries of any size.
pub type Matrix = DMatrix<Complex64>;

/// Number of qubits a square power-of-two matrix acts on.
pub fn num_qubits(m: &Matrix) -> IrResult<usize> {
    let (rows, cols) = m.shape();
    if rows != cols {
        return Err(IrError::NotSquare { rows, cols });
    }
    if rows == 0 || !rows.is_power_of_two() {
        return Err(IrError::NotPowerOfTwo(rows));
    }
    Ok(rows.trailing_zeros() as usize)
}

/// Build a matrix from a list of rows.
pub fn from_rows(rows: &[Vec<Complex64>]) -> IrResult<Matrix> {
    let n = rows.len();
    for (row, entries) in rows.iter().enumerate() {
        if entries.len() != n {
            return Err(IrError::RaggedRow {
                row,
                expected: n,
                got: entries.len(),
            });
        }
    }
    Ok(Matrix::from_fn(n, n, |i, j| rows[i][j]))
}

/// Identity on `num_qubits` qubits.
pub fn identity(num_qubits: usize) -> Matrix {
    Matrix::identity(1 << num_qubits, 1 << num_qubits)
}

/// Value (0 or 1) of `qubit` in basis index `index` of an `n`-qubit register.
#[inline]
pub fn qubit_bit(index: usize, qubit: usize, n: usize) -> usize {
    (index >> (n - 1 - qubit)) & 1
}

/// Check `U†U = I` entrywise within `tol`.
pub fn is_unitary(m: &Matrix, tol: f64) -> bool {
    if !m.is_square() {
        return false;
    }
    let product = m.adjoint() * m;
    product.iter().enumerate().all(|(k, z)| {
        let (i, j) = (k % m.nrows(), k / m.nrows());
        let expected = if i == j { 1.0 } else { 0.0 };
        (z - Complex64::new(expected, 0.0)).norm() <= tol
    })
}

/// Whether every off-diagonal entry is below `tol`.
pub fn is_diagonal(m: &Matrix, tol: f64) -> bool {
    let n = m.nrows();
    (0..n).all(|i| (0..n).all(|j| i == j || m[(i, j)].norm() <= tol))
}

/// Whether the matrix equals `e^{iφ} I` for some phase `φ`.
pub fn is_identity_up_to_phase(m: &Matrix, tol: f64) -> bool {
    if !is_diagonal(m, tol) {
        return false;
    }
    let reference = m[(0, 0)];
    if (reference.norm() - 1.0).abs() > tol {
        return false;
    }
    (1..m.nrows()).all(|i| (m[(i, i)] - reference).norm() <= tol)
}

/// Unit phase `e^{iφ}` minimizing `‖realized − e^{iφ} target‖_F`.
pub fn alignment_phase(realized: &Matrix, target: &Matrix) -> Complex64 {
    let overlap: Complex64 = target
        .iter()
        .zip(realized.iter())
        .map(|(t, r)| t.conj() * r)
        .sum();
    if overlap.norm() < 1e-300 {
        Complex64::new(1.0, 0.0)
    } else {
        overlap / overlap.norm()
    }
}

/// Frobenius distance after removing the best global phase.
///
/// Upper-bounds the operator-norm distance `min_φ ‖R − e^{iφ}T‖₂`.
pub fn phase_distance(realized: &Matrix, target: &Matrix) -> f64 {
    let phase = alignment_phase(realized, target);
    realized
        .iter()
        .zip(target.iter())
        .map(|(r, t)| (r - phase * t).norm_sqr())
        .sum::<f64>()
        .sqrt()
}

/// Reorder the qubits of `m`: qubit `j` of the result is qubit `order[j]`
/// of the input.
///
/// If a circuit realizes the result on a register where slot `j` holds
/// original qubit `order[j]`, it realizes `m` on the original register.
pub fn permute_qubits(m: &Matrix, order: &[usize]) -> Matrix {
    let n = order.len();
    let remap = |index: usize| -> usize {
        order
            .iter()
            .enumerate()
            .map(|(slot, &original)| qubit_bit(index, slot, n) << (n - 1 - original))
            .sum()
    };
    let lookup: Vec<usize> = (0..m.nrows()).map(remap).collect();
    Matrix::from_fn(m.nrows(), m.ncols(), |i, j| m[(lookup[i], lookup[j])])
}

/// `m ⊗ I` with identity on `extra_qubits` trailing qubits.
pub fn kron_identity(m: &Matrix, extra_qubits: usize) -> Matrix {
    if extra_qubits == 0 {
        return m.clone();
    }
    m.kronecker(&identity(extra_qubits))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn cnot() -> Matrix {
        let one = c(1.0, 0.0);
        let zero = c(0.0, 0.0);
        from_rows(&[
            vec![one, zero, zero, zero],
            vec![zero, one, zero, zero],
            vec![zero, zero, zero, one],
            vec![zero, zero, one, zero],
        ])
        .unwrap()
    }

    #[test]
    fn test_num_qubits() {
        assert_eq!(num_qubits(&identity(3)).unwrap(), 3);
        assert!(num_qubits(&Matrix::identity(3, 3)).is_err());
        assert!(num_qubits(&Matrix::zeros(2, 4)).is_err());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![c(1.0, 0.0)], vec![c(0.0, 0.0), c(1.0, 0.0)]];
        assert!(matches!(from_rows(&rows), Err(IrError::RaggedRow { row: 0, .. })));
    }

    #[test]
    fn test_identity_up_to_phase() {
        let phased = identity(2) * Complex64::from_polar(1.0, 0.7);
        assert!(is_identity_up_to_phase(&phased, 1e-12));
        assert!(!is_identity_up_to_phase(&cnot(), 1e-12));
    }

    #[test]
    fn test_phase_distance_ignores_global_phase() {
        let a = cnot();
        let b = cnot() * Complex64::from_polar(1.0, -2.1);
        assert!(phase_distance(&a, &b) < 1e-12);
        assert!(phase_distance(&a, &identity(2)) > 1.0);
    }

    #[test]
    fn test_permute_qubits_reverses_cnot() {
        // Control on qubit 1, target on qubit 0.
        let reversed = permute_qubits(&cnot(), &[1, 0]);
        assert_eq!(reversed[(1, 3)], c(1.0, 0.0));
        assert_eq!(reversed[(3, 1)], c(1.0, 0.0));
        assert_eq!(reversed[(2, 2)], c(1.0, 0.0));
        assert!(is_unitary(&reversed, 1e-12));
    }

    #[test]
    fn test_permute_qubits_matches_kron_order() {
        let a = Matrix::from_fn(2, 2, |i, j| c((i + 2 * j) as f64, 0.0));
        let b = Matrix::from_fn(2, 2, |i, j| c(0.0, (3 * i + j) as f64));
        let ab = a.kronecker(&b);
        let ba = b.kronecker(&a);
        assert_eq!(permute_qubits(&ab, &[1, 0]), ba);
    }

    #[test]
    fn test_kron_identity_dimension() {
        let m = kron_identity(&cnot(), 2);
        assert_eq!(m.nrows(), 16);
        assert!(is_unitary(&m, 1e-12));
    }
}
