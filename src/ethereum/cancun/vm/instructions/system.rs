//! Ethereum Virtual Machine (EVM) System Instructions
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! .. contents:: Table of Contents
//!     :backlinks: none
//!     :local:
//!
//! Introduction
//! ------------
//!
//! Implementations of the EVM system related instructions.
//!
//! Gas and value operands are popped to keep the stack layout but are not
//! acted on: there is no gas schedule and no value transfer here.
//!
//! A call instruction does not run the callee itself. It leaves a
//! [`PendingCall`] on the frame and the interpreter, which keeps suspended
//! frames on its own stack, resumes the caller through [`finish_call`].

use tracing::debug;

use crate::ethereum::{
    cancun::{
        fork_types::Address,
        vm::{
            exceptions::VmError,
            memory::{extend_memory, memory_read_bytes, memory_write},
            stack::{pop, push},
            Environment, Evm, Message,
        },
    },
    ethereum_types::{bytes::Bytes, numeric::U256},
};

/// A sub-call waiting to be run on behalf of the frame that requested it.
#[derive(Debug, Clone)]
pub struct PendingCall {
    pub message: Message,
    /// Where the callee's output goes in the caller's memory.
    pub output_start: usize,
    pub output_size: usize,
}

/// Perform the core logic of the `CALL*` family of opcodes.
#[allow(clippy::too_many_arguments)]
fn generic_call(
    evm: &mut Evm,
    env: &mut Environment<'_>,
    to: Address,
    is_static: bool,
    memory_input_start_position: U256,
    memory_input_size: U256,
    memory_output_start_position: U256,
    memory_output_size: U256,
) -> Result<(), VmError> {
    let (input_start, input_size) = extend_memory(&mut evm.memory, evm.memory_limit, memory_input_start_position, memory_input_size)?;
    let (output_start, output_size) = extend_memory(&mut evm.memory, evm.memory_limit, memory_output_start_position, memory_output_size)?;

    evm.return_data = Bytes::default();

    if evm.message.depth + 1 > env.config.max_call_depth {
        push(&mut evm.stack, U256::ZERO)?;
        evm.pc += 1;
        return Ok(());
    }

    let call_data = memory_read_bytes(&evm.memory, input_start, input_size);
    let code = env.state.get_code(&to)?;
    let message = Message {
        caller: evm.message.current_target,
        target: to,
        current_target: to,
        data: call_data,
        code,
        depth: evm.message.depth + 1,
        is_static,
    };
    evm.pending_call = Some(PendingCall { message, output_start, output_size });
    Ok(())
}

/// """
/// Resumes `evm` after the sub-call it requested has finished.
///
/// Parameters
/// ----------
/// evm :
///     The suspended caller frame.
/// output_start, output_size :
///     Where the caller asked for the callee's output.
/// child_evm :
///     The finished callee frame.
/// """
pub fn finish_call(evm: &mut Evm, output_start: usize, output_size: usize, child_evm: Evm) -> Result<(), VmError> {
    if let Some(error) = &child_evm.error {
        debug!(to = ?child_evm.message.target, error = %error, "sub-call failed");
        push(&mut evm.stack, U256::ZERO)?;
    } else {
        push(&mut evm.stack, U256::ONE)?;
    }

    evm.return_data = child_evm.output;
    let actual_output_size = output_size.min(evm.return_data.len());
    memory_write(&mut evm.memory, output_start, &evm.return_data[..actual_output_size]);

    evm.pc += 1;
    Ok(())
}

/// Message-call into an account.
pub fn call(evm: &mut Evm, env: &mut Environment<'_>) -> Result<(), VmError> {
    // STACK
    let _gas = pop(&mut evm.stack)?;
    let to = Address::from_word(pop(&mut evm.stack)?);
    let _value = pop(&mut evm.stack)?;
    let memory_input_start_position = pop(&mut evm.stack)?;
    let memory_input_size = pop(&mut evm.stack)?;
    let memory_output_start_position = pop(&mut evm.stack)?;
    let memory_output_size = pop(&mut evm.stack)?;

    let is_static = evm.message.is_static;
    generic_call(
        evm,
        env,
        to,
        is_static,
        memory_input_start_position,
        memory_input_size,
        memory_output_start_position,
        memory_output_size,
    )
}

/// Message-call into an account that may not modify state.
pub fn staticcall(evm: &mut Evm, env: &mut Environment<'_>) -> Result<(), VmError> {
    // STACK
    let _gas = pop(&mut evm.stack)?;
    let to = Address::from_word(pop(&mut evm.stack)?);
    let memory_input_start_position = pop(&mut evm.stack)?;
    let memory_input_size = pop(&mut evm.stack)?;
    let memory_output_start_position = pop(&mut evm.stack)?;
    let memory_output_size = pop(&mut evm.stack)?;

    generic_call(
        evm,
        env,
        to,
        true,
        memory_input_start_position,
        memory_input_size,
        memory_output_start_position,
        memory_output_size,
    )
}

/// Halts execution returning output data.
pub fn return_(evm: &mut Evm) -> Result<(), VmError> {
    // STACK
    let memory_start_position = pop(&mut evm.stack)?;
    let memory_size = pop(&mut evm.stack)?;

    // OPERATION
    let (start, size) = extend_memory(&mut evm.memory, evm.memory_limit, memory_start_position, memory_size)?;
    evm.output = memory_read_bytes(&evm.memory, start, size);
    evm.running = false;

    // PROGRAM COUNTER
    evm.pc += 1;
    Ok(())
}

/// Stop execution and revert state changes, without consuming all provided gas
/// and also has the ability to return a reason
pub fn revert(evm: &mut Evm) -> Result<(), VmError> {
    // STACK
    let memory_start_index = pop(&mut evm.stack)?;
    let size = pop(&mut evm.stack)?;

    // OPERATION
    let (start, size) = extend_memory(&mut evm.memory, evm.memory_limit, memory_start_index, size)?;
    evm.output = memory_read_bytes(&evm.memory, start, size);
    Err(VmError::Revert)
}
