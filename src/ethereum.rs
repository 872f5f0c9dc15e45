//! https://github.com/ethereum/execution-specs/tree/master/src/ethereum
//!
//! These modules follow the layout of the ethereum spec, cut down to
//! what the storage opcodes and their message calls need.
//!
pub mod ethereum_types;

pub mod crypto;
pub mod cancun;
pub mod exceptions;

pub mod utils;
