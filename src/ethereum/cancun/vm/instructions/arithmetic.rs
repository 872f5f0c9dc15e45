//! Ethereum Virtual Machine (EVM) Arithmetic Instructions
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! Introduction
//! ------------
//!
//! Implementations of the EVM Arithmetic instructions. Both wrap modulo
//! 2^256.

use crate::ethereum::cancun::vm::{exceptions::VmError, stack::{pop, push}, Evm};

/// Adds the top two elements of the stack together, and pushes the result back
/// on the stack.
pub fn add(evm: &mut Evm) -> Result<(), VmError> {
    // STACK
    let x = pop(&mut evm.stack)?;
    let y = pop(&mut evm.stack)?;

    // OPERATION
    push(&mut evm.stack, x + y)?;

    // PROGRAM COUNTER
    evm.pc += 1;
    Ok(())
}

/// Subtracts the second element of the stack from the top one.
pub fn sub(evm: &mut Evm) -> Result<(), VmError> {
    let x = pop(&mut evm.stack)?;
    let y = pop(&mut evm.stack)?;

    push(&mut evm.stack, x - y)?;

    evm.pc += 1;
    Ok(())
}
