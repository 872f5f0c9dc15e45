//! Ethereum Virtual Machine (EVM) Stack Instructions
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! Introduction
//! ------------
//!
//! Implementations of the EVM stack related instructions.

use crate::ethereum::{cancun::vm::{exceptions::VmError, stack, Evm}, ethereum_types::numeric::U256};

/// Remove item from stack.
pub fn pop(evm: &mut Evm) -> Result<(), VmError> {
    stack::pop(&mut evm.stack)?;
    evm.pc += 1;
    Ok(())
}

/// Pushes an `num_bytes` long immediate onto the stack. Code is treated as
/// zero padded past its end.
pub fn push_n(evm: &mut Evm, num_bytes: usize) -> Result<(), VmError> {
    let start = (evm.pc + 1).min(evm.code.len());
    let end = (evm.pc + 1 + num_bytes).min(evm.code.len());
    let mut data = [0; 32];
    data[..end - start].copy_from_slice(&evm.code[start..end]);

    // Immediate is big-endian and may have been truncated by the code end.
    let value = U256::from_be_slice(&data[..num_bytes]);
    stack::push(&mut evm.stack, value)?;

    evm.pc += 1 + num_bytes;
    Ok(())
}

/// Duplicate the stack item `item_number` places below the top (0 is the top).
pub fn dup_n(evm: &mut Evm, item_number: usize) -> Result<(), VmError> {
    let data_to_duplicate = stack::peek(&evm.stack, item_number)?;
    stack::push(&mut evm.stack, data_to_duplicate)?;
    evm.pc += 1;
    Ok(())
}

/// Swap the top with the `item_number` element of the stack, where
/// the top of the stack is position zero.
pub fn swap_n(evm: &mut Evm, item_number: usize) -> Result<(), VmError> {
    let len = evm.stack.len();
    if item_number >= len {
        return Err(VmError::StackUnderflowError);
    }
    evm.stack.swap(len - 1, len - 1 - item_number);
    evm.pc += 1;
    Ok(())
}
