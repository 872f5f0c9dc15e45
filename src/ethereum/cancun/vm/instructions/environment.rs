//! Ethereum Virtual Machine (EVM) Environmental Instructions
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! Introduction
//! ------------
//!
//! Implementations of the EVM environment related instructions that read
//! the message itself.

use crate::ethereum::{cancun::vm::{exceptions::VmError, stack::{pop, push}, Evm}, ethereum_types::numeric::U256};

/// Pushes the address of the current executing account to the stack.
pub fn address(evm: &mut Evm) -> Result<(), VmError> {
    let word = evm.message.current_target.to_word();
    push(&mut evm.stack, word)?;
    evm.pc += 1;
    Ok(())
}

/// Pushes the address of the caller onto the stack.
pub fn caller(evm: &mut Evm) -> Result<(), VmError> {
    let word = evm.message.caller.to_word();
    push(&mut evm.stack, word)?;
    evm.pc += 1;
    Ok(())
}

/// Push a word (32 bytes) of the input data belonging to the current
/// environment onto the stack. Bytes past the end of the data read as zero.
pub fn calldataload(evm: &mut Evm) -> Result<(), VmError> {
    let start_index = pop(&mut evm.stack)?;

    let data = &evm.message.data;
    let mut word = [0; 32];
    if let Ok(start) = start_index.to_usize() {
        if start < data.len() {
            let end = data.len().min(start + 32);
            word[..end - start].copy_from_slice(&data[start..end]);
        }
    }
    push(&mut evm.stack, U256::from_be_bytes(word))?;

    evm.pc += 1;
    Ok(())
}

/// Push the size of input data in current environment onto the stack.
pub fn calldatasize(evm: &mut Evm) -> Result<(), VmError> {
    let size = U256::from(evm.message.data.len());
    push(&mut evm.stack, size)?;
    evm.pc += 1;
    Ok(())
}
