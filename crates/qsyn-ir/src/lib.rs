//! qsyn Intermediate Representation
//!
//! This crate provides the data model shared by the qsyn unitary compiler:
//! dense matrices, physical qubits, the native gate set, compiled operations
//! and the device coupling graph.
//!
//! # Core Components
//!
//! - **Matrices**: [`Matrix`] (dense, big-endian qubit order) and the
//!   fixed-size [`Unitary2x2`] used for single-qubit work
//! - **Qubits**: [`GridQubit`], a position on the device grid
//! - **Gates**: [`PhasedXZ`] for the single-qubit family and
//!   [`TwoQubitPrimitive`] for the entanglers, collected in a [`NativeGateSet`]
//! - **Operations**: [`Operation`], one entry of a compiled operation list
//! - **Devices**: [`Device`], the coupling graph with precomputed distances
//!
//! # Example: Checking a Two-Qubit Gate Against the Device
//!
//! ```rust
//! use qsyn_ir::{Device, GridQubit, NativeGateSet, Operation};
//!
//! let device = Device::sycamore();
//! let gates = NativeGateSet::sycamore();
//!
//! let op = Operation::cz(GridQubit::new(3, 3), GridQubit::new(3, 4));
//! let [a, b] = [op.qubits()[0], op.qubits()[1]];
//! assert!(device.is_adjacent(&a, &b));
//! assert!(gates.allows(qsyn_ir::TwoQubitPrimitive::Cz, 1.0));
//! ```
//!
//! # Native Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `PhasedXZ(x, z, a)` | 1 | `Z^z · Z^a · X^x · Z^-a` |
//! | `CZ` | 2 | Controlled phase, exponent 1 |
//! | `ISWAP^±0.5` | 2 | Square root of the excitation exchange |

pub mod device;
pub mod error;
pub mod gate;
pub mod matrix;
pub mod operation;
pub mod qubit;
pub mod unitary;

pub use device::{Device, SYCAMORE_DIAGRAM};
pub use error::{IrError, IrResult};
pub use gate::{NativeGateSet, PhasedXZ, TwoQubitPrimitive};
pub use matrix::Matrix;
pub use operation::Operation;
pub use qubit::GridQubit;
pub use unitary::Unitary2x2;

// Re-exported so downstream crates name the same complex type.
pub use num_complex::Complex64;
