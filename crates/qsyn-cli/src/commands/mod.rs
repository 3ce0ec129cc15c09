//! CLI command implementations.

pub mod common;
pub mod compile;
pub mod layout;
pub mod version;
