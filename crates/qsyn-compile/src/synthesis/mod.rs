//! Leaf synthesizers used by the decomposer.

pub mod diagonal;
pub mod linear;
pub mod multiplex;
pub mod single;
pub mod two_qubit;

pub use diagonal::DiagonalSynthesizer;
pub use multiplex::{RotationAxis, cosine_sine, demultiplex, multiplexed_rotation};
pub use single::SingleQubitSynthesizer;
pub use two_qubit::{KakDecomposition, TwoQubitSynthesizer, swap_operations, zz_cost};
