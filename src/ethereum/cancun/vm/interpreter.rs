//! """
//! Ethereum Virtual Machine (EVM) Interpreter
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! .. contents:: Table of Contents
//!     :backlinks: none
//!     :local:
//!
//! Introduction
//! ------------
//!
//! A straightforward interpreter that executes EVM code.
//! """

use tracing::{debug, debug_span, warn};

use crate::ethereum::{cancun::state::StateError, ethereum_types::{bytes::Bytes, numeric::U256}, exceptions::Exception};

use super::{
    exceptions::VmError,
    instructions::{op_implementation, system::{finish_call, PendingCall}},
    Environment, Evm, Message,
};


pub const STACK_DEPTH_LIMIT : usize = 1024;

/// """
/// Output of a particular message call
///
/// Contains the following:
///
/// 1. `output`: bytes handed back by RETURN or REVERT.
/// 2. `stack`: the operand stack as the top frame left it.
/// 3. `error`: The error from the execution if any.
/// """
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCallOutput {
    pub output: Bytes,
    pub stack: Vec<U256>,
    pub error: Option<VmError>,
}

/// """
/// Executes a top-level call from `message.caller` to `message.target`.
///
/// This is the boundary of the slot cache: a fresh store is attached on
/// entry when `env.config.sload_cache` is set, and none is attached on
/// return, whatever the outcome.
///
/// Parameters
/// ----------
/// message :
///     Transaction specific items.
///
/// env :
///     External items required for EVM execution.
///
/// Returns
/// -------
/// output : `MessageCallOutput`
///     Output of the message call. A failing storage backend is an `Err`,
///     not a halted call.
/// """
pub fn process_message_call(
    message: Message, env: &mut Environment<'_>
) -> Result<MessageCallOutput, Exception> {
    let _span = debug_span!(
        "message_call",
        target = ?message.target,
        code_hash = ?message.code_hash(),
    ).entered();

    if env.config.sload_cache {
        env.sload_cache.activate();
    } else {
        env.sload_cache.discard();
    }

    let result = process_message(message, env);
    env.sload_cache.discard();

    let evm = result.inspect_err(|error| {
        warn!(error = %error, "message call aborted by state backend");
    })?;

    debug!(error = ?evm.error, output = ?evm.output, "message call finished");
    Ok(MessageCallOutput {
        output: evm.output,
        stack: evm.stack,
        error: evm.error,
    })
}


/// """
/// Executes a message in its own backend transaction.
///
/// The transaction is committed if the code finishes without error and
/// rolled back otherwise. A rollback also clears the slot cache, since
/// entries read or evicted inside this frame no longer describe the
/// backend.
///
/// Parameters
/// ----------
/// message :
///     Transaction specific items.
/// env :
///     External items required for EVM execution.
///
/// Returns
/// -------
/// evm: `Evm`
///     Items containing execution specific objects
/// """
pub fn process_message(message: Message, env: &mut Environment<'_>) -> Result<Evm, StateError> {
    if message.depth > env.config.max_call_depth {
        let mut evm = Evm::new(message);
        evm.error = Some(VmError::StackDepthLimitError);
        return Ok(evm);
    }

    // take snapshot of state before processing the message
    env.state.begin_transaction();

    match execute_code(message, env) {
        Ok(evm) if evm.error.is_none() => {
            env.state.commit_transaction();
            Ok(evm)
        }
        Ok(evm) => {
            // revert state to the last saved checkpoint
            // since the message call resulted in an error
            rollback_transaction(env);
            Ok(evm)
        }
        Err(error) => {
            rollback_transaction(env);
            Err(error)
        }
    }
}

fn rollback_transaction(env: &mut Environment<'_>) {
    env.state.rollback_transaction();
    env.sload_cache.on_rollback();
}


/// A caller waiting for its sub-call to finish.
struct SuspendedFrame {
    evm: Evm,
    output_start: usize,
    output_size: usize,
}

/// """
/// Executes bytecode present in the `message`, along with every sub-call it
/// makes.
///
/// Runs against whatever slot cache `env` currently holds, so a harness
/// can attach a store with [`Environment::with_sload_cache`] and call this
/// directly. No backend transaction is opened for `message` itself; each
/// sub-call gets its own.
///
/// Suspended callers are kept on a heap allocated stack rather than the
/// native one, so `Config::max_call_depth` is the only bound on nesting.
///
/// Parameters
/// ----------
/// message :
///     Transaction specific items.
/// env :
///     External items required for EVM execution.
///
/// Returns
/// -------
/// evm: `Evm`
///     Items containing execution specific objects
/// """
pub fn execute_code(message: Message, env: &mut Environment<'_>) -> Result<Evm, StateError> {
    let mut evm = Evm::new(message);
    evm.memory_limit = env.config.max_call_memory;
    // Innermost last. Every entry has a transaction open for its callee.
    let mut callers: Vec<SuspendedFrame> = Vec::new();

    loop {
        if let Err(error) = run_frame(&mut evm, env) {
            for _ in 0..callers.len() {
                rollback_transaction(env);
            }
            return Err(error);
        }

        if let Some(PendingCall { message, output_start, output_size }) = evm.pending_call.take() {
            env.state.begin_transaction();
            let mut child = Evm::new(message);
            child.memory_limit = evm.memory_limit.saturating_sub(evm.memory.len());
            let caller = std::mem::replace(&mut evm, child);
            callers.push(SuspendedFrame { evm: caller, output_start, output_size });
            continue;
        }

        let Some(SuspendedFrame { evm: mut caller, output_start, output_size }) = callers.pop() else {
            return Ok(evm);
        };
        if evm.error.is_none() {
            env.state.commit_transaction();
        } else {
            rollback_transaction(env);
        }
        if let Err(error) = finish_call(&mut caller, output_start, output_size, evm) {
            halt(&mut caller, error);
        }
        evm = caller;
    }
}

/// Steps `evm` until it halts or asks for a sub-call.
fn run_frame(evm: &mut Evm, env: &mut Environment<'_>) -> Result<(), StateError> {
    while evm.running && evm.pc < evm.code.len() && evm.pending_call.is_none() {
        let op = evm.code[evm.pc];
        match op_implementation(op, evm, env) {
            Ok(()) => {}
            Err(VmError::Backend(error)) => return Err(error),
            Err(error) => halt(evm, error),
        }
    }
    Ok(())
}

/// Ends the frame with `error`. Only a revert keeps its output.
fn halt(evm: &mut Evm, error: VmError) {
    if error != VmError::Revert {
        debug!(pc = evm.pc, op = ?evm.code.get(evm.pc), error = %error, "exceptional halt");
        evm.output = Bytes::default();
    }
    evm.error = Some(error);
    evm.running = false;
}

#[cfg(test)]
mod tests;
