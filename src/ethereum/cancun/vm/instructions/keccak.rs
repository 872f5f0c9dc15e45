//! Ethereum Virtual Machine (EVM) Keccak Instructions
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! Introduction
//! ------------
//!
//! Implementations of the EVM keccak instructions. Contracts use it to
//! derive mapping slots, which then feed SLOAD/SSTORE.

use crate::ethereum::{cancun::vm::{exceptions::VmError, memory::{extend_memory, memory_read_bytes}, stack::{pop, push}, Evm}, crypto::hash::keccak256, ethereum_types::numeric::U256};

/// Pushes to the stack the Keccak-256 hash of a region of memory.
pub fn keccak(evm: &mut Evm) -> Result<(), VmError> {
    // STACK
    let memory_start_index = pop(&mut evm.stack)?;
    let size = pop(&mut evm.stack)?;

    // OPERATION
    let (start, size) = extend_memory(&mut evm.memory, evm.memory_limit, memory_start_index, size)?;
    let data = memory_read_bytes(&evm.memory, start, size);
    push(&mut evm.stack, U256::from(keccak256(&data)))?;

    // PROGRAM COUNTER
    evm.pc += 1;
    Ok(())
}
