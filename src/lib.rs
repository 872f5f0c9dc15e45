//! A small EVM interpreter whose storage opcodes read through a per-call
//! slot cache.
//!
//! The layout follows https://github.com/ethereum/execution-specs/tree/master/src/ethereum
//! one module per execution-specs file. See [`ethereum::cancun::vm::sload_cache`] for the cache and
//! [`ethereum::cancun::vm::interpreter`] for the entry points.

pub mod ethereum;
