//! Ethereum Virtual Machine (EVM) Memory Instructions
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! Introduction
//! ------------
//!
//! Implementations of the EVM Memory instructions.

use crate::ethereum::{cancun::vm::{exceptions::VmError, memory::{extend_memory, memory_read_bytes, memory_write}, stack::{pop, push}, Evm}, ethereum_types::numeric::U256};

/// Stores a word to memory.
pub fn mstore(evm: &mut Evm) -> Result<(), VmError> {
    // STACK
    let start_position = pop(&mut evm.stack)?;
    let value = pop(&mut evm.stack)?;

    // OPERATION
    let (start, _) = extend_memory(&mut evm.memory, evm.memory_limit, start_position, U256::from(32_u32))?;
    memory_write(&mut evm.memory, start, &value.to_be_bytes());

    // PROGRAM COUNTER
    evm.pc += 1;
    Ok(())
}

/// Load word from memory.
pub fn mload(evm: &mut Evm) -> Result<(), VmError> {
    let start_position = pop(&mut evm.stack)?;

    let (start, size) = extend_memory(&mut evm.memory, evm.memory_limit, start_position, U256::from(32_u32))?;
    let value = U256::from_be_slice(&memory_read_bytes(&evm.memory, start, size));
    push(&mut evm.stack, value)?;

    evm.pc += 1;
    Ok(())
}
