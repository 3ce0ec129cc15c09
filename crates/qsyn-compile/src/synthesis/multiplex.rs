//! Multiplexed rotations, cosine-sine split and demultiplexing.
//!
//! A multiplexed rotation applies `R(θ_x)` to a target for every basis
//! state `x` of its controls. With a Gray-code ordering it needs exactly
//! `2^m` CZ gates for `m` controls.
//!
//! Control states are indexed big-endian: `controls[0]` is the most
//! significant bit of `x`.

use num_complex::Complex64;
use qsyn_ir::Unitary2x2;
use qsyn_ir::matrix::Matrix;

use crate::error::{CompileError, CompileResult};
use crate::logical::{LogicalOp, unit};

/// Mixing angles for diagonalizing a unitary through a Hermitian
/// combination of its parts.
const HERMITIAN_ANGLES: [f64; 5] = [0.0, 0.731, 1.37, 2.11, 0.29];

/// Largest off-diagonal entry accepted after diagonalization.
const DIAGONAL_EPSILON: f64 = 1e-9;

/// Axis of a multiplexed rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAxis {
    Y,
    Z,
}

impl RotationAxis {
    fn gate(self, theta: f64) -> Unitary2x2 {
        match self {
            RotationAxis::Y => Unitary2x2::ry(theta),
            RotationAxis::Z => Unitary2x2::rz(theta),
        }
    }
}

#[inline]
pub(crate) fn gray(i: usize) -> usize {
    i ^ (i >> 1)
}

/// In-place Walsh-Hadamard transform: `w[k] = Σ_x (-1)^{|x & k|} v[x]`.
pub(crate) fn walsh_hadamard(values: &mut [f64]) {
    let n = values.len();
    let mut h = 1;
    while h < n {
        for start in (0..n).step_by(2 * h) {
            for i in start..start + h {
                let (a, b) = (values[i], values[i + h]);
                values[i] = a + b;
                values[i + h] = a - b;
            }
        }
        h *= 2;
    }
}

/// Circuit for `⊕_x R(angles[x])` on `target`, controlled by `controls`.
///
/// Rotations below `tol` are skipped. If the angles do not depend on the
/// controls at all, a single uncontrolled rotation is emitted.
pub fn multiplexed_rotation(
    axis: RotationAxis,
    controls: &[usize],
    target: usize,
    angles: &[f64],
    tol: f64,
) -> Vec<LogicalOp> {
    let m = controls.len();
    let count = 1usize << m;
    debug_assert_eq!(angles.len(), count);

    let mut walsh = angles.to_vec();
    walsh_hadamard(&mut walsh);
    let phis: Vec<f64> = (0..count).map(|i| walsh[gray(i)] / count as f64).collect();

    if phis[1..].iter().all(|phi| phi.abs() <= tol) {
        return if phis[0].abs() <= tol {
            Vec::new()
        } else {
            vec![LogicalOp::single(target, axis.gate(phis[0]))]
        };
    }

    // CZ flips the sign of RY; for RZ the target is conjugated into the X basis.
    let rotation: fn(f64) -> Unitary2x2 = match axis {
        RotationAxis::Y => Unitary2x2::ry,
        RotationAxis::Z => Unitary2x2::rx,
    };
    let wrap = axis == RotationAxis::Z;

    let mut ops = Vec::with_capacity(2 * count + 2);
    if wrap {
        ops.push(LogicalOp::single(target, Unitary2x2::h()));
    }
    for (i, phi) in phis.iter().enumerate() {
        if phi.abs() > tol {
            ops.push(LogicalOp::single(target, rotation(*phi)));
        }
        let flipped = gray(i) ^ gray((i + 1) % count);
        let bit = flipped.trailing_zeros() as usize;
        ops.push(LogicalOp::cz(controls[m - 1 - bit], target));
    }
    if wrap {
        ops.push(LogicalOp::single(target, Unitary2x2::h()));
    }
    ops
}

fn block(u: &Matrix, row: usize, col: usize, size: usize) -> Matrix {
    u.view((row, col), (size, size)).into_owned()
}

fn diagonal(values: &[Complex64]) -> Matrix {
    let n = values.len();
    Matrix::from_fn(n, n, |i, j| {
        if i == j { values[i] } else { Complex64::new(0.0, 0.0) }
    })
}

fn frobenius(a: &Matrix, b: &Matrix) -> f64 {
    (a - b).norm()
}

/// Unit-modulus phase of `z`, or 1 for (numerically) zero.
fn phase_of(z: Complex64) -> Complex64 {
    if z.norm() > 1e-300 { z / z.norm() } else { Complex64::new(1.0, 0.0) }
}

/// `U = (L0 ⊕ L1) · [[C, −S], [S, C]] · (R0 ⊕ R1)` with respect to the
/// first qubit.
#[derive(Debug, Clone)]
pub struct CosineSine {
    /// `(L0, L1)`.
    pub left: (Matrix, Matrix),
    /// Angle of the multiplexed RY for each state of the remaining qubits.
    pub angles: Vec<f64>,
    /// `(R0, R1)`.
    pub right: (Matrix, Matrix),
}

/// Cosine-sine split of `u` on its first qubit.
///
/// The result is reconstructed and compared to `u`; a block mismatch above
/// `tol` times the block dimension is reported as [`CompileError::ToleranceExceeded`].
pub fn cosine_sine(u: &Matrix, tol: f64) -> CompileResult<CosineSine> {
    let h = u.nrows() / 2;
    let (u00, u01) = (block(u, 0, 0, h), block(u, 0, h, h));
    let (u10, u11) = (block(u, h, 0, h), block(u, h, h, h));

    let svd = u00.clone().svd(true, true);
    let (Some(svd_u), Some(svd_vt)) = (svd.u, svd.v_t) else {
        return Err(CompileError::ToleranceExceeded {
            stage: "cosine-sine svd",
            distance: f64::NAN,
            tolerance: tol,
        });
    };

    // Descending cosines, so the sines ascend.
    let mut order: Vec<usize> = (0..h).collect();
    order.sort_by(|&a, &b| svd.singular_values[b].total_cmp(&svd.singular_values[a]));
    let c: Vec<f64> = order.iter().map(|&k| svd.singular_values[k].clamp(0.0, 1.0)).collect();
    let l0 = Matrix::from_fn(h, h, |i, j| svd_u[(i, order[j])]);
    let r0 = Matrix::from_fn(h, h, |i, j| svd_vt[(order[i], j)]);

    // U10·R0† = L1·S. Factor it with the largest sines first so that
    // vanishing columns only fill in the orthogonal complement.
    let x = &u10 * r0.adjoint();
    let reversed = Matrix::from_fn(h, h, |i, j| x[(i, h - 1 - j)]);
    let qr = reversed.qr();
    let (q, r) = (qr.q(), qr.r());
    // Sines are read off `R` rather than from `1 − c²`, which loses half
    // the digits when `c` is close to one.
    let s: Vec<f64> = (0..h).map(|j| r[(h - 1 - j, h - 1 - j)].norm()).collect();
    let l1 = Matrix::from_fn(h, h, |i, j| {
        let k = h - 1 - j;
        q[(i, k)] * phase_of(r[(k, k)])
    });

    let from_top = l0.adjoint() * &u01;
    let from_bottom = l1.adjoint() * &u11;
    let r1 = Matrix::from_fn(h, h, |j, col| {
        if s[j] > c[j] {
            -from_top[(j, col)] / s[j]
        } else {
            from_bottom[(j, col)] / c[j]
        }
    });

    let cs = diagonal(&c.iter().map(|v| Complex64::new(*v, 0.0)).collect::<Vec<_>>());
    let ss = diagonal(&s.iter().map(|v| Complex64::new(*v, 0.0)).collect::<Vec<_>>());
    let distance = [
        frobenius(&(&l0 * &cs * &r0), &u00),
        frobenius(&(-(&l0 * &ss * &r1)), &u01),
        frobenius(&(&l1 * &ss * &r0), &u10),
        frobenius(&(&l1 * &cs * &r1), &u11),
    ]
    .into_iter()
    .fold(0.0, f64::max);
    let limit = tol * h as f64;
    if distance > limit {
        return Err(CompileError::ToleranceExceeded {
            stage: "cosine-sine split",
            distance,
            tolerance: limit,
        });
    }

    let angles = c.iter().zip(&s).map(|(c, s)| 2.0 * s.atan2(*c)).collect();
    Ok(CosineSine {
        left: (l0, l1),
        angles,
        right: (r0, r1),
    })
}

/// `U0 ⊕ U1 = (I ⊗ V) · (D ⊕ D†) · (I ⊗ W)`, with `D ⊕ D†` a multiplexed RZ.
#[derive(Debug, Clone)]
pub struct Demultiplexed {
    /// Applied last.
    pub v: Matrix,
    /// RZ angle for each state of the remaining qubits.
    pub angles: Vec<f64>,
    /// Applied first.
    pub w: Matrix,
}

/// Split the block-diagonal `u0 ⊕ u1` into two unitaries and a
/// multiplexed RZ on the block qubit.
pub fn demultiplex(u0: &Matrix, u1: &Matrix, tol: f64) -> CompileResult<Demultiplexed> {
    let h = u0.nrows();
    let x = u0 * u1.adjoint();
    let xd = x.adjoint();

    let mut found = None;
    for &t in &HERMITIAN_ANGLES {
        let (sin, cos) = t.sin_cos();
        let hermitian = (&x + &xd) * Complex64::new(cos / 2.0, 0.0)
            + (&x - &xd) * Complex64::new(0.0, -sin / 2.0);
        let v = hermitian.symmetric_eigen().eigenvectors;
        let dx = v.adjoint() * &x * &v;
        let off_diagonal = (0..h)
            .flat_map(|i| (0..h).map(move |j| (i, j)))
            .filter(|(i, j)| i != j)
            .map(|(i, j)| dx[(i, j)].norm())
            .fold(0.0, f64::max);
        if off_diagonal <= DIAGONAL_EPSILON {
            found = Some((v, dx));
            break;
        }
    }
    let Some((v, dx)) = found else {
        return Err(CompileError::ToleranceExceeded {
            stage: "demultiplex diagonalization",
            distance: f64::NAN,
            tolerance: DIAGONAL_EPSILON,
        });
    };

    let half_phases: Vec<f64> = (0..h).map(|j| dx[(j, j)].arg() / 2.0).collect();
    let d = diagonal(&half_phases.iter().map(|p| unit(*p)).collect::<Vec<_>>());
    let w = d.adjoint() * v.adjoint() * u0;

    let distance = frobenius(&(&v * &d * &w), u0).max(frobenius(&(&v * d.adjoint() * &w), u1));
    if distance > tol {
        return Err(CompileError::ToleranceExceeded {
            stage: "demultiplex",
            distance,
            tolerance: tol,
        });
    }

    Ok(Demultiplexed {
        v,
        angles: half_phases.iter().map(|p| -2.0 * p).collect(),
        w,
    })
}
