//! qsyn Unitary Compiler
//!
//! This crate turns an arbitrary unitary on 1 to 8 target qubits into a
//! list of native operations for a grid-coupled device. Every two-qubit
//! operation acts on coupled qubits, and the realized operator equals the
//! requested one (up to global phase and identity on ancillas) within a
//! configurable tolerance.
//!
//! # Overview
//!
//! 1. **Decomposition**: recursive cosine-sine splitting with structure
//!    recognition at every node, down to one- and two-qubit blocks
//! 2. **Routing**: placement of logical qubits on the targets and relay
//!    exchanges for uncoupled pairs, with optional ancillas
//! 3. **Assembly**: exchange lowering and single-qubit gate merging
//! 4. **Validation**: structural checks and operator comparison
//!
//! # Architecture
//!
//! ```text
//! Unitary U (2^n x 2^n)
//!       │
//!       ▼
//! ┌────────────┐
//! │ Decomposer │ ◄── pattern table (identity, separable, permutation,
//! └────────────┘     diagonal, single control), KAK, CSD
//!       │ logical ops
//!       ▼
//! ┌────────────┐
//! │   Router   │ ◄── Device, qubit budget
//! └────────────┘
//!       │ physical ops + exchanges
//!       ▼
//! ┌────────────┐
//! │ Assembler  │ ◄── NativeGateSet
//! └────────────┘
//!       │ native ops
//!       ▼
//! ┌────────────┐
//! │ Validator  │ ──► retry with the next Strategy on failure
//! └────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use qsyn_compile::{CompileOutcome, SynthesisConfig, compile};
//! use qsyn_ir::{Device, GridQubit, TwoQubitPrimitive};
//!
//! let device = Device::sycamore();
//! let targets = [GridQubit::new(3, 3), GridQubit::new(3, 4)];
//! let cz = TwoQubitPrimitive::Cz.matrix(1.0);
//!
//! let outcome = compile(&targets, &cz, &device, &SynthesisConfig::default()).unwrap();
//! match outcome {
//!     CompileOutcome::Compiled(result) => assert_eq!(result.two_qubit_count(), 1),
//!     CompileOutcome::Unsupported { reason } => panic!("{reason}"),
//! }
//! ```

pub mod assemble;
pub mod compiler;
pub mod config;
pub mod decompose;
pub mod error;
pub mod logical;
pub mod matcher;
pub mod routing;
pub mod simulate;
pub mod synthesis;
pub mod validate;

pub use compiler::{CompileOutcome, SynthesisResult, SynthesisStats, Synthesizer, compile};
pub use config::{AxisPolicy, QubitOrdering, Strategy, SynthesisConfig};
pub use decompose::{Decomposer, Decomposition};
pub use error::{CompileError, CompileResult};
pub use logical::LogicalOp;
pub use routing::{PhysicalOp, RoutedCircuit, Router};
pub use simulate::{Statevector, random_unitary};
pub use synthesis::{SingleQubitSynthesizer, TwoQubitSynthesizer};
pub use validate::{CheckMethod, ValidationReport, Validator};
