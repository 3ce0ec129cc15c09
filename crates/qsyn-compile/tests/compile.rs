//! End-to-end compile properties on the Sycamore grid.

use num_complex::Complex64;
use qsyn_compile::{
    AxisPolicy, CompileOutcome, QubitOrdering, Statevector, Strategy, SynthesisConfig, SynthesisResult, compile,
    random_unitary,
};
use qsyn_ir::matrix::{self, Matrix, kron_identity, phase_distance, permute_qubits};
use qsyn_ir::{Device, GridQubit, NativeGateSet, Operation, Unitary2x2};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;

fn targets(n: usize) -> Vec<GridQubit> {
    GridQubit::placement(n, 3, 3)
}

fn compiled(targets: &[GridQubit], u: &Matrix) -> SynthesisResult {
    let device = Device::sycamore();
    match compile(targets, u, &device, &SynthesisConfig::default()).unwrap() {
        CompileOutcome::Compiled(result) => result,
        CompileOutcome::Unsupported { reason } => panic!("unsupported: {reason}"),
    }
}

/// Operator realized on `targets ++ ancillas`.
fn realized(result: &SynthesisResult, targets: &[GridQubit]) -> Matrix {
    let register: Vec<GridQubit> = targets.iter().chain(&result.ancillas).copied().collect();
    let index: FxHashMap<GridQubit, usize> = register.iter().enumerate().map(|(i, q)| (*q, i)).collect();
    let n = register.len();
    let dim = 1usize << n;
    let mut m = Matrix::zeros(dim, dim);
    for col in 0..dim {
        let mut state = Statevector::basis(n, col);
        for op in &result.operations {
            state.apply(op, &index);
        }
        for (row, amp) in state.amplitudes().iter().enumerate() {
            m[(row, col)] = *amp;
        }
    }
    m
}

fn assert_structurally_valid(result: &SynthesisResult, targets: &[GridQubit]) {
    let device = Device::sycamore();
    for op in &result.operations {
        assert!(!matches!(op, Operation::Bridge { .. }));
        if let [a, b] = op.qubits() {
            assert!(device.is_adjacent(a, b), "{op} acts on uncoupled qubits");
        }
    }
    assert!(targets.len() + result.ancillas.len() <= 10);
}

/// Final state for basis input `x` on the targets, ancillas in `|0⟩`.
fn run_basis(result: &SynthesisResult, targets: &[GridQubit], x: usize) -> Statevector {
    let register: Vec<GridQubit> = targets.iter().chain(&result.ancillas).copied().collect();
    let index: FxHashMap<GridQubit, usize> = register.iter().enumerate().map(|(i, q)| (*q, i)).collect();
    let mut state = Statevector::basis(register.len(), x << result.ancillas.len());
    for op in &result.operations {
        state.apply(op, &index);
    }
    state
}

/// Check `|x⟩ ↦ e^{i·phases[x]}|image[x]⟩` on a spread of basis inputs, up
/// to one global phase.
fn assert_monomial_action(result: &SynthesisResult, targets: &[GridQubit], image: &[usize], phases: &[f64]) {
    let shift = result.ancillas.len();
    let step = (image.len() / 64).max(1);
    let mut reference: Option<Complex64> = None;
    for x in (0..image.len()).step_by(step).chain(std::iter::once(image.len() - 1)) {
        let state = run_basis(result, targets, x);
        let amp = state.amplitudes()[image[x] << shift] * Complex64::from_polar(1.0, -phases[x]);
        assert!((amp.norm() - 1.0).abs() < 1e-6, "input {x} lost weight: {}", amp.norm());
        let global = *reference.get_or_insert(amp);
        assert!((amp - global).norm() < 1e-6, "input {x} has the wrong phase");
    }
}

fn two_qubit_ops(result: &SynthesisResult) -> usize {
    result.operations.iter().filter(|op| op.is_two_qubit()).count()
}

#[test]
fn identity_needs_no_gates() {
    for n in 1..=8 {
        let t = targets(n);
        let result = compiled(&t, &matrix::identity(n));
        assert!(result.operations.is_empty(), "n = {n}");
        assert!(result.ancillas.is_empty());
    }
}

#[test]
fn global_phase_is_ignored() {
    let t = targets(3);
    let u = matrix::identity(3) * Complex64::from_polar(1.0, 1.1);
    assert!(compiled(&t, &u).operations.is_empty());
}

#[test]
fn cnot_on_adjacent_targets_is_one_entangler() {
    let t = targets(2);
    let one = Complex64::new(1.0, 0.0);
    let mut cnot = Matrix::zeros(4, 4);
    cnot[(0, 0)] = one;
    cnot[(1, 1)] = one;
    cnot[(2, 3)] = one;
    cnot[(3, 2)] = one;
    let result = compiled(&t, &cnot);
    assert_eq!(two_qubit_ops(&result), 1);
    assert!(phase_distance(&realized(&result, &t), &cnot) < 1e-6);
}

#[test]
fn separable_unitary_is_local() {
    let mut rng = StdRng::seed_from_u64(4);
    let t = targets(4);
    let factors: Vec<Matrix> = (0..4).map(|_| random_unitary(1, &mut rng)).collect();
    let u = factors[1..]
        .iter()
        .fold(factors[0].clone(), |acc, f| acc.kronecker(f));
    let result = compiled(&t, &u);
    assert_eq!(two_qubit_ops(&result), 0);
    assert_eq!(result.operations.len(), 4);
    assert!(phase_distance(&realized(&result, &t), &u) < 1e-6);
}

#[test]
fn separable_with_identity_factor_skips_it() {
    let t = targets(3);
    let h = Unitary2x2::h().to_matrix();
    let u = h.kronecker(&matrix::identity(1)).kronecker(&Unitary2x2::x().to_matrix());
    let result = compiled(&t, &u);
    assert_eq!(result.operations.len(), 2);
    assert!(result.operations.iter().all(|op| op.qubits()[0] != t[1]));
}

#[test]
fn random_unitaries_up_to_five_qubits() {
    let mut rng = StdRng::seed_from_u64(2024);
    for n in 1..=5 {
        let t = targets(n);
        let u = random_unitary(n, &mut rng);
        let result = compiled(&t, &u);
        assert_structurally_valid(&result, &t);
        let expected = kron_identity(&u, result.ancillas.len());
        assert!(phase_distance(&realized(&result, &t), &expected) < 1e-5, "n = {n}");
    }
}

#[test]
fn toffoli_and_qubit_reversal() {
    let t = targets(3);
    let mut toffoli = matrix::identity(3);
    toffoli.swap_rows(6, 7);
    let result = compiled(&t, &toffoli);
    assert_structurally_valid(&result, &t);
    assert!(phase_distance(&realized(&result, &t), &kron_identity(&toffoli, result.ancillas.len())) < 1e-5);

    let reversal = permute_qubits(&matrix::identity(3), &[2, 1, 0]);
    let mut rng = StdRng::seed_from_u64(5);
    let u = &reversal * random_unitary(1, &mut rng).kronecker(&matrix::identity(2));
    let result = compiled(&t, &u);
    assert_structurally_valid(&result, &t);
    assert!(phase_distance(&realized(&result, &t), &kron_identity(&u, result.ancillas.len())) < 1e-5);
}

#[test]
fn recompiling_the_realized_operator_reproduces_it() {
    let mut rng = StdRng::seed_from_u64(99);
    let t = targets(3);
    let first = compiled(&t, &random_unitary(3, &mut rng));
    let realized_once = realized(&first, &t);
    let n = t.len() + first.ancillas.len();
    let mut register = t.clone();
    register.extend(first.ancillas.iter().copied());

    let again = compiled(&register, &realized_once);
    let realized_twice = realized(&again, &register);
    assert!(phase_distance(&realized_twice, &kron_identity(&realized_once, again.ancillas.len())) < 1e-5);
    assert!(n <= 10);
}

#[test]
fn incrementer_gets_a_permutation_network() {
    for n in 3..=8 {
        let t = targets(n);
        let image: Vec<usize> = (0..1usize << n).map(|x| (x + 1) % (1 << n)).collect();
        let mut u = Matrix::zeros(1 << n, 1 << n);
        for (x, y) in image.iter().enumerate() {
            u[(*y, x)] = Complex64::new(1.0, 0.0);
        }
        let result = compiled(&t, &u);
        assert_structurally_valid(&result, &t);
        assert!(result.stats.validation.distance < 1e-5, "n = {n}");
        assert_monomial_action(&result, &t, &image, &vec![0.0; image.len()]);
        // A generic eight-qubit unitary needs over 10^5 entanglers.
        let bound = ((1usize << (2 * n)) / 8).max(256);
        assert!(two_qubit_ops(&result) < bound, "n = {n}: {}", two_qubit_ops(&result));
    }
}

#[test]
fn random_diagonals_up_to_eight_qubits() {
    let mut rng = StdRng::seed_from_u64(31);
    for n in 1..=8 {
        let t = targets(n);
        let phases: Vec<f64> = (0..1usize << n).map(|_| rng.gen_range(-3.0..3.0)).collect();
        let u = Matrix::from_fn(1 << n, 1 << n, |i, j| {
            if i == j {
                Complex64::from_polar(1.0, phases[i])
            } else {
                Complex64::new(0.0, 0.0)
            }
        });
        let result = compiled(&t, &u);
        assert_structurally_valid(&result, &t);
        assert!(result.stats.validation.distance < 1e-5, "n = {n}");
        let image: Vec<usize> = (0..1usize << n).collect();
        assert_monomial_action(&result, &t, &image, &phases);
    }
}

#[test]
fn distant_targets_borrow_an_ancilla() {
    // (3, 4) sits between the targets and is free.
    let t = [GridQubit::new(3, 3), GridQubit::new(3, 5)];
    let one = Complex64::new(1.0, 0.0);
    let mut cnot = Matrix::zeros(4, 4);
    cnot[(0, 0)] = one;
    cnot[(1, 1)] = one;
    cnot[(2, 3)] = one;
    cnot[(3, 2)] = one;
    let result = compiled(&t, &cnot);
    assert_structurally_valid(&result, &t);
    assert!(!result.ancillas.is_empty());
    assert!(result.ancillas.iter().all(|q| !t.contains(q)));
    assert!(two_qubit_ops(&result) > 1);
    let expected = kron_identity(&cnot, result.ancillas.len());
    assert!(phase_distance(&realized(&result, &t), &expected) < 1e-6);
}

#[test]
fn sqrt_iswap_gate_set_compiles_cnot() {
    let device = Device::sycamore();
    let gate_set = NativeGateSet::sqrt_iswap();
    let config = SynthesisConfig::default().with_gate_set(gate_set.clone());
    let t = targets(2);
    let one = Complex64::new(1.0, 0.0);
    let mut cnot = Matrix::zeros(4, 4);
    cnot[(0, 0)] = one;
    cnot[(1, 1)] = one;
    cnot[(2, 3)] = one;
    cnot[(3, 2)] = one;
    let result = match compile(&t, &cnot, &device, &config).unwrap() {
        CompileOutcome::Compiled(result) => result,
        CompileOutcome::Unsupported { reason } => panic!("unsupported: {reason}"),
    };
    assert_eq!(two_qubit_ops(&result), 2);
    for op in &result.operations {
        if let Operation::TwoQubit { primitive, exponent, .. } = op {
            assert!(gate_set.allows(*primitive, *exponent), "{op} is not in the gate set");
        }
    }
    assert!(phase_distance(&realized(&result, &t), &cnot) < 1e-6);
}

#[test]
fn random_seven_qubits_single_strategy() {
    let device = Device::sycamore();
    let config = SynthesisConfig::default()
        .with_strategies(vec![Strategy::new(QubitOrdering::Identity, AxisPolicy::MostSignificant)]);
    let mut rng = StdRng::seed_from_u64(7);
    let t = targets(7);
    let u = random_unitary(7, &mut rng);
    match compile(&t, &u, &device, &config).unwrap() {
        CompileOutcome::Compiled(result) => {
            assert_structurally_valid(&result, &t);
            assert!(result.stats.validation.distance < 1e-5);
        }
        CompileOutcome::Unsupported { reason } => panic!("unsupported: {reason}"),
    }
}

#[test]
fn sampled_validation_is_deterministic() {
    let device = Device::sycamore();
    let config = SynthesisConfig::default().with_full_check_qubits(2);
    let mut rng = StdRng::seed_from_u64(17);
    let t = targets(4);
    let u = random_unitary(4, &mut rng);
    let a = compile(&t, &u, &device, &config).unwrap();
    let b = compile(&t, &u, &device, &config).unwrap();
    assert_eq!(a, b);
}

#[test]
#[ignore = "slow: eight-qubit decomposition"]
fn random_eight_qubits_never_errors() {
    let device = Device::sycamore();
    let mut rng = StdRng::seed_from_u64(8);
    let t = targets(8);
    let u = random_unitary(8, &mut rng);
    let outcome = compile(&t, &u, &device, &SynthesisConfig::default()).unwrap();
    if let CompileOutcome::Compiled(result) = outcome {
        assert_structurally_valid(&result, &t);
        assert!(result.stats.validation.distance < 1e-5);
    }
}
