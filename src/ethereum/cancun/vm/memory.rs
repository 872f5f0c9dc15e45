//! Ethereum Virtual Machine (EVM) Memory
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! .. contents:: Table of Contents
//!     :backlinks: none
//!     :local:
//!
//! Introduction
//! ------------
//!
//! EVM memory operations. Expansion is not charged for, so it is bounded by
//! a byte budget instead. The budget belongs to the whole top-level call:
//! a callee may only grow into what its suspended callers left unused.

use crate::ethereum::{ethereum_types::{bytes::Bytes, numeric::U256}, utils::numeric::ceil32};

use super::exceptions::VmError;

/// Default memory budget of one top-level call, shared by all its frames.
pub const MAX_MEMORY_SIZE : usize = 0x100_0000;

/// Grows `memory` in whole words so that `[start, start + size)` is
/// addressable and returns the range as native offsets.
///
/// A zero sized access never expands memory, whatever its offset.
///
/// Parameters
/// ----------
/// memory :
///     Memory of the current frame.
/// limit :
///     Largest size `memory` may reach, see [`Evm::memory_limit`].
///
/// [`Evm::memory_limit`]: crate::ethereum::cancun::vm::Evm::memory_limit
pub fn extend_memory(memory: &mut Vec<u8>, limit: usize, start: U256, size: U256) -> Result<(usize, usize), VmError> {
    if size.is_zero() {
        return Ok((0, 0));
    }
    let start = start.to_usize().map_err(|_| VmError::MemoryLimitExceeded)?;
    let size = size.to_usize().map_err(|_| VmError::MemoryLimitExceeded)?;
    let end = start
        .checked_add(size)
        .and_then(ceil32)
        .filter(|end| *end <= limit)
        .ok_or(VmError::MemoryLimitExceeded)?;
    if memory.len() < end {
        memory.resize(end, 0);
    }
    Ok((start, size))
}

/// Writes `value` at `start_position`. The range must already be extended.
pub fn memory_write(memory: &mut [u8], start_position: usize, value: &[u8]) {
    memory[start_position..start_position + value.len()].copy_from_slice(value);
}

/// Reads `size` bytes from `start_position`. The range must already be extended.
pub fn memory_read_bytes(memory: &[u8], start_position: usize, size: usize) -> Bytes {
    Bytes(memory[start_position..start_position + size].to_vec())
}
