//! Two-qubit synthesis via the KAK (Cartan) decomposition.
//!
//! Any 4x4 unitary factors as
//!
//! ```text
//! U = e^{iφ} (A1 ⊗ B1) · exp(i(a·XX + b·YY + c·ZZ)) · (A2 ⊗ B2)
//! ```
//!
//! The interaction coefficients `(a, b, c)` are found by diagonalizing
//! `Uᵀ U` in the magic basis, where local gates become real orthogonal
//! matrices and the interaction becomes diagonal. After reducing each
//! coefficient into `[-π/4, π/4]` the number of CZ gates follows directly:
//!
//! | coefficients | CZ count |
//! |--------------|----------|
//! | all zero | 0 |
//! | one at ±π/4, others zero | 1 |
//! | any zero | 2 |
//! | otherwise | 3 |
//!
//! Each case is emitted from a fixed template whose single-qubit layers are
//! built from the local factors.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4};

use nalgebra::Matrix4;
use num_complex::Complex64;
use qsyn_ir::matrix::phase_distance;
use qsyn_ir::{GridQubit, Matrix, NativeGateSet, Operation, Unitary2x2};
use tracing::trace;

use super::single::SingleQubitSynthesizer;
use crate::config::SynthesisConfig;
use crate::error::{CompileError, CompileResult};
use crate::logical::{LogicalOp, compose, unit};

/// Angles mixing the real and imaginary parts of `Uᵀ U` before the real
/// symmetric eigensolve. The first one whose eigenbasis diagonalizes both
/// parts wins.
const MIXING_ANGLES: [f64; 6] = [0.0, 0.613_9, 1.1, 2.3, 0.27, 1.9];

/// Largest off-diagonal entry accepted after diagonalization.
const DIAGONAL_EPSILON: f64 = 1e-9;

/// Single-qubit factors within this distance of identity are dropped.
const IDENTITY_EPSILON: f64 = 1e-12;

/// Result of the KAK decomposition, up to global phase.
#[derive(Debug, Clone, Copy)]
pub struct KakDecomposition {
    /// Local factors applied first, `(A2, B2)`.
    pub before: (Unitary2x2, Unitary2x2),
    /// Interaction coefficients `(a, b, c)`, each in `[-π/4, π/4]`.
    pub coefficients: [f64; 3],
    /// Local factors applied last, `(A1, B1)`.
    pub after: (Unitary2x2, Unitary2x2),
}

impl KakDecomposition {
    /// Number of CZ gates needed, given an angle snapping tolerance.
    pub fn entangler_count(&self, tol: f64) -> usize {
        match classify(&self.coefficients, tol) {
            Interaction::Local => 0,
            Interaction::Quarter { .. } => 1,
            Interaction::Planar { .. } => 2,
            Interaction::General => 3,
        }
    }

    /// Rebuild the 4x4 unitary (up to global phase).
    pub fn matrix(&self) -> Matrix {
        let [a, b, c] = self.coefficients;
        self.after.0.kron(&self.after.1) * interaction(a, b, c) * self.before.0.kron(&self.before.1)
    }
}

/// Shape of the canonical interaction after snapping.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Interaction {
    Local,
    /// One coefficient at `sign·π/4` in `slot`, the others zero.
    Quarter { slot: usize, sign: f64 },
    /// Coefficient `slot` is zero.
    Planar { slot: usize },
    General,
}

fn classify(coefficients: &[f64; 3], tol: f64) -> Interaction {
    let zero: Vec<bool> = coefficients.iter().map(|v| v.abs() <= tol).collect();
    let zeros = zero.iter().filter(|z| **z).count();
    if zeros == 3 {
        return Interaction::Local;
    }
    if zeros == 2 {
        if let Some(slot) = zero.iter().position(|z| !*z) {
            let v = coefficients[slot];
            if (v.abs() - FRAC_PI_4).abs() <= tol {
                return Interaction::Quarter {
                    slot,
                    sign: v.signum(),
                };
            }
        }
    }
    match zero.iter().position(|z| *z) {
        Some(slot) => Interaction::Planar { slot },
        None => Interaction::General,
    }
}

/// `(1/√2)·[[1, i, 0, 0], [0, 0, i, 1], [0, 0, i, -1], [1, -i, 0, 0]]`.
fn magic_basis() -> Matrix {
    let r = Complex64::new(FRAC_1_SQRT_2, 0.0);
    let i = Complex64::new(0.0, FRAC_1_SQRT_2);
    let o = Complex64::new(0.0, 0.0);
    Matrix::from_row_slice(
        4,
        4,
        &[
            r, i, o, o, //
            o, o, i, r, //
            o, o, i, -r, //
            r, -i, o, o,
        ],
    )
}

/// Magic-basis phases of `exp(i(a·XX + b·YY + c·ZZ))`.
fn interaction_phases(a: f64, b: f64, c: f64) -> [f64; 4] {
    [a - b + c, -a + b + c, a + b - c, -a - b - c]
}

/// `exp(i(a·XX + b·YY + c·ZZ))`.
pub fn interaction(a: f64, b: f64, c: f64) -> Matrix {
    let m = magic_basis();
    let phases = interaction_phases(a, b, c);
    let d = Matrix::from_fn(4, 4, |i, j| if i == j { unit(phases[i]) } else { Complex64::new(0.0, 0.0) });
    &m * d * m.adjoint()
}

/// Split `k ≈ A ⊗ B` into its factors.
fn factor_tensor(k: &Matrix) -> (Unitary2x2, Unitary2x2) {
    let block_norm = |bi: usize, bj: usize| -> f64 {
        (0..2)
            .flat_map(|r| (0..2).map(move |s| (r, s)))
            .map(|(r, s)| k[(2 * bi + r, 2 * bj + s)].norm_sqr())
            .sum()
    };
    let (bi, bj) = [(0, 0), (0, 1), (1, 0), (1, 1)]
        .into_iter()
        .max_by(|x, y| block_norm(x.0, x.1).total_cmp(&block_norm(y.0, y.1)))
        .unwrap_or((0, 0));

    let block = Unitary2x2::from_block(k, 2 * bi, 2 * bj);
    let b = block.scale(Complex64::new(1.0, 0.0) / block.det().sqrt());
    let bd = b.dagger();

    let mut a = [Complex64::new(0.0, 0.0); 4];
    for i in 0..2 {
        for j in 0..2 {
            let sub = Unitary2x2::from_block(k, 2 * i, 2 * j);
            let prod = bd * sub;
            a[2 * i + j] = (prod.data[0] + prod.data[3]) / 2.0;
        }
    }
    (Unitary2x2::new(a[0], a[1], a[2], a[3]), b)
}

/// Pauli correction `X^nx · Y^ny · Z^nz` for reduced coefficients.
fn pauli_correction(shifts: [i64; 3]) -> Unitary2x2 {
    let mut q = Unitary2x2::identity();
    for (shift, pauli) in shifts.iter().zip([Unitary2x2::x(), Unitary2x2::y(), Unitary2x2::z()]) {
        if shift.rem_euclid(2) == 1 {
            q = q * pauli;
        }
    }
    q
}

/// Decomposes and synthesizes 4x4 unitaries into CZ-based circuits.
#[derive(Debug, Clone, Copy)]
pub struct TwoQubitSynthesizer {
    angle_tolerance: f64,
    gate_tolerance: f64,
}

impl TwoQubitSynthesizer {
    /// Create a synthesizer with the tolerances of `config`.
    pub fn new(config: &SynthesisConfig) -> Self {
        Self {
            angle_tolerance: config.angle_tolerance,
            gate_tolerance: config.gate_tolerance,
        }
    }

    /// KAK decomposition of a 4x4 unitary.
    pub fn decompose(&self, u: &Matrix) -> CompileResult<KakDecomposition> {
        if u.shape() != (4, 4) {
            return Err(CompileError::InputShape(format!(
                "two-qubit synthesis needs a 4x4 matrix, got {}x{}",
                u.nrows(),
                u.ncols()
            )));
        }

        let det = u.determinant();
        let special = u * unit(-det.arg() / 4.0);
        let magic = magic_basis();
        let up = magic.adjoint() * &special * &magic;
        let m2 = up.transpose() * &up;

        let (p, d) = simultaneous_diagonalization(&m2).ok_or(CompileError::ToleranceExceeded {
            stage: "kak diagonalization",
            distance: f64::NAN,
            tolerance: DIAGONAL_EPSILON,
        })?;

        let mut theta = [0.0; 4];
        for (k, t) in theta.iter_mut().enumerate() {
            *t = d[(k, k)].arg() / 2.0;
        }
        theta[3] = -(theta[0] + theta[1] + theta[2]);

        let dh_inv = Matrix::from_fn(4, 4, |i, j| {
            if i == j { unit(-theta[i]) } else { Complex64::new(0.0, 0.0) }
        });
        let o1 = &up * &p * dh_inv;
        let k1 = &magic * o1 * magic.adjoint();
        let k2 = &magic * p.transpose() * magic.adjoint();

        let raw = [
            (theta[0] + theta[2]) / 2.0,
            (theta[1] + theta[2]) / 2.0,
            (theta[0] + theta[1]) / 2.0,
        ];
        let mut coefficients = [0.0; 3];
        let mut shifts = [0i64; 3];
        for i in 0..3 {
            shifts[i] = (raw[i] / FRAC_PI_2).round() as i64;
            coefficients[i] = raw[i] - shifts[i] as f64 * FRAC_PI_2;
        }

        let (a1, b1) = factor_tensor(&k1);
        let (a2, b2) = factor_tensor(&k2);
        let q = pauli_correction(shifts);
        let kak = KakDecomposition {
            before: (q * a2, q * b2),
            coefficients,
            after: (a1, b1),
        };

        let distance = phase_distance(&kak.matrix(), u);
        if distance > self.gate_tolerance {
            return Err(CompileError::ToleranceExceeded {
                stage: "kak decomposition",
                distance,
                tolerance: self.gate_tolerance,
            });
        }
        Ok(kak)
    }

    /// Synthesize `u` on logical qubits `(q0, q1)`, `q0` being the first
    /// tensor factor.
    pub fn synthesize(&self, u: &Matrix, q0: usize, q1: usize) -> CompileResult<Vec<LogicalOp>> {
        let kak = self.decompose(u)?;
        let ops = emit_template(&kak, self.angle_tolerance);

        let distance = phase_distance(&compose(&ops, 2), u);
        if distance > self.gate_tolerance {
            return Err(CompileError::ToleranceExceeded {
                stage: "two-qubit template",
                distance,
                tolerance: self.gate_tolerance,
            });
        }
        trace!(
            coefficients = ?kak.coefficients,
            cz = kak.entangler_count(self.angle_tolerance),
            "two-qubit block synthesized"
        );

        Ok(ops
            .into_iter()
            .filter(|op| !matches!(op, LogicalOp::Single { matrix, .. } if matrix.is_identity_within(IDENTITY_EPSILON)))
            .map(|op| match op {
                LogicalOp::Single { qubit, matrix } => {
                    LogicalOp::single(if qubit == 0 { q0 } else { q1 }, matrix)
                }
                LogicalOp::Cz { .. } => LogicalOp::cz(q0, q1),
                other => other,
            })
            .collect())
    }
}

/// Find a real orthogonal `P` with `Pᵀ M2 P` diagonal; returns `P` (as a
/// complex matrix with `det P = +1`) and the diagonal form.
fn simultaneous_diagonalization(m2: &Matrix) -> Option<(Matrix, Matrix)> {
    for &angle in &MIXING_ANGLES {
        let (s, c) = angle.sin_cos();
        let real = Matrix4::<f64>::from_fn(|i, j| c * m2[(i, j)].re + s * m2[(i, j)].im);
        let eigen = real.symmetric_eigen();
        let mut vectors = eigen.eigenvectors;
        if vectors.determinant() < 0.0 {
            for r in 0..4 {
                vectors[(r, 0)] = -vectors[(r, 0)];
            }
        }
        let p = Matrix::from_fn(4, 4, |i, j| Complex64::new(vectors[(i, j)], 0.0));
        let d = p.transpose() * m2 * &p;
        let off_diagonal = (0..4)
            .flat_map(|i| (0..4).map(move |j| (i, j)))
            .filter(|(i, j)| i != j)
            .map(|(i, j)| d[(i, j)].norm())
            .fold(0.0, f64::max);
        if off_diagonal <= DIAGONAL_EPSILON {
            return Some((p, d));
        }
    }
    None
}

/// Emit the minimal template on logical qubits `(0, 1)`.
fn emit_template(kak: &KakDecomposition, tol: f64) -> Vec<LogicalOp> {
    let (a2, b2) = kak.before;
    let (a1, b1) = kak.after;
    let [a, b, c] = kak.coefficients;
    let h = Unitary2x2::h();
    let single = LogicalOp::single;

    match classify(&kak.coefficients, tol) {
        Interaction::Local => vec![single(0, a1 * a2), single(1, b1 * b2)],
        Interaction::Quarter { slot, sign } => {
            // exp(i·s·π/4·PP) = (V⊗V)·e^{i·s·π/4}(S^-s ⊗ S^-s)·CZ·(V†⊗V†)
            let v = match slot {
                0 => h,
                1 => Unitary2x2::s() * h,
                _ => Unitary2x2::identity(),
            };
            let s_inv = if sign > 0.0 { Unitary2x2::sdg() } else { Unitary2x2::s() };
            vec![
                single(0, v.dagger() * a2),
                single(1, v.dagger() * b2),
                LogicalOp::cz(0, 1),
                single(0, a1 * v * s_inv),
                single(1, b1 * v * s_inv),
            ]
        }
        Interaction::Planar { slot } => {
            // exp(i(a'·XX + c'·ZZ)) = CNOT·(RX(-2a') ⊗ RZ(-2c'))·CNOT, other
            // planes are rotated onto the XZ plane by W ⊗ W.
            let (w, ap, cp) = match slot {
                1 => (Unitary2x2::identity(), a, c),
                0 => (Unitary2x2::s(), b, c),
                _ => (Unitary2x2::rx(-FRAC_PI_2), a, b),
            };
            let wd = w.dagger();
            vec![
                single(0, wd * a2),
                single(1, h * wd * b2),
                LogicalOp::cz(0, 1),
                single(0, Unitary2x2::rx(-2.0 * ap)),
                single(1, h * Unitary2x2::rz(-2.0 * cp) * h),
                LogicalOp::cz(0, 1),
                single(0, a1 * w),
                single(1, b1 * w * h),
            ]
        }
        Interaction::General => {
            // CNOT·(RX(-2a) ⊗ RZ(-2c))·CZ·(RX(2b) ⊗ I)·(S ⊗ S)·CNOT·(I ⊗ S†)
            let s = Unitary2x2::s();
            vec![
                single(0, a2),
                single(1, h * Unitary2x2::sdg() * b2),
                LogicalOp::cz(0, 1),
                single(0, Unitary2x2::rx(2.0 * b) * s),
                single(1, s * h),
                LogicalOp::cz(0, 1),
                single(0, Unitary2x2::rx(-2.0 * a)),
                single(1, h * Unitary2x2::rz(-2.0 * c)),
                LogicalOp::cz(0, 1),
                single(0, a1),
                single(1, b1 * h),
            ]
        }
    }
}

/// CZ count of `exp(iα·ZZ)`.
pub fn zz_cost(alpha: f64, tol: f64) -> usize {
    let reduced = alpha - (alpha / FRAC_PI_2).round() * FRAC_PI_2;
    if reduced.abs() <= tol {
        0
    } else if (reduced.abs() - FRAC_PI_4).abs() <= tol {
        1
    } else {
        2
    }
}

fn phxz(qubit: GridQubit, u: Unitary2x2) -> Operation {
    Operation::phased_xz(qubit, SingleQubitSynthesizer::synthesize(&u))
}

/// Native realization of CZ on a coupled pair.
///
/// Without CZ, `√iSWAP · X_b · √iSWAP · X_b = exp(iπ/4·XX)`; Hadamards on
/// both qubits turn it into `exp(iπ/4·ZZ)`, and `RZ(π/2)` on each qubit
/// completes CZ.
pub fn cz_operations(a: GridQubit, b: GridQubit, gate_set: &NativeGateSet) -> Vec<Operation> {
    if gate_set.has_cz() || !gate_set.has_sqrt_iswap() {
        return vec![Operation::cz(a, b)];
    }
    let (h, x) = (Unitary2x2::h(), Unitary2x2::x());
    let quarter = Unitary2x2::rz(FRAC_PI_2);
    vec![
        phxz(a, h),
        phxz(b, x * h),
        Operation::sqrt_iswap(a, b),
        phxz(b, x),
        Operation::sqrt_iswap(a, b),
        phxz(a, quarter * h),
        phxz(b, quarter * h),
    ]
}

/// Rotation by 2π/3 about `(1, 1, 1)`, cycling the Pauli axes.
fn axis_cycle() -> Unitary2x2 {
    let (p, m) = (Complex64::new(0.5, -0.5), Complex64::new(0.5, 0.5));
    Unitary2x2::new(p, -m, p, m)
}

/// Native realization of a state exchange between two coupled qubits.
///
/// With CZ and the square root of iSWAP, `SWAP = √iSWAP² · CZ · (S† ⊗ S†)`.
/// With only the square root of iSWAP, each application contributes
/// `π/8·(PP + QQ)` for a pair of axes, and cycling the axes between the
/// three applications covers `XX`, `YY` and `ZZ` twice each. Otherwise
/// three CZ-based CNOTs.
pub fn swap_operations(a: GridQubit, b: GridQubit, gate_set: &NativeGateSet) -> Vec<Operation> {
    if gate_set.has_sqrt_iswap() && gate_set.has_cz() {
        return vec![
            phxz(a, Unitary2x2::sdg()),
            phxz(b, Unitary2x2::sdg()),
            Operation::cz(a, b),
            Operation::sqrt_iswap(a, b),
            Operation::sqrt_iswap(a, b),
        ];
    }
    if gate_set.has_sqrt_iswap() {
        let cycle = axis_cycle();
        return (0..3)
            .flat_map(|_| [phxz(a, cycle), phxz(b, cycle), Operation::sqrt_iswap(a, b)])
            .collect();
    }
    let h = Unitary2x2::h();
    let mut ops = Vec::with_capacity(9);
    for (control, target) in [(a, b), (b, a), (a, b)] {
        ops.push(phxz(target, h));
        ops.push(Operation::cz(control, target));
        ops.push(phxz(target, h));
    }
    ops
}
