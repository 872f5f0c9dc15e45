//! Ethereum Virtual Machine (EVM) Storage Instructions
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! .. contents:: Table of Contents
//!     :backlinks: none
//!     :local:
//!
//! Introduction
//! ------------
//!
//! Implementations of the EVM storage related instructions.
//!
//! Both go through the environment's [`SloadCacheLifecycle`]: SLOAD answers
//! from the active store when it can and fills it on a miss, SSTORE writes
//! the backend and then evicts the slot. With no active store both talk to
//! the backend directly.
//!
//! [`SloadCacheLifecycle`]: crate::ethereum::cancun::vm::sload_cache::SloadCacheLifecycle

use tracing::trace;

use crate::ethereum::{
    cancun::{
        fork_types::Address,
        vm::{exceptions::VmError, sload_cache::SlotKey, stack::{pop, push}, Environment, Evm},
    },
    ethereum_types::{bytes::Bytes32, numeric::U256},
};

/// Loads to the stack, the value corresponding to a certain key from the
/// storage of the current account.
///
/// Parameters
/// ----------
/// evm :
///     The current EVM frame.
/// env :
///     Supplies the storage backend and the slot cache.
///
pub fn sload(evm: &mut Evm, env: &mut Environment<'_>) -> Result<(), VmError> {
    // STACK
    let key = Bytes32::from(pop(&mut evm.stack)?);

    // OPERATION
    let value = load_slot(env, &evm.message.current_target, &key)?;
    push(&mut evm.stack, value)?;

    // PROGRAM COUNTER
    evm.pc += 1;
    Ok(())
}

/// Stores a value at a certain key in the current context's storage.
///
/// Parameters
/// ----------
/// evm :
///     The current EVM frame.
/// env :
///     Supplies the storage backend and the slot cache.
///
pub fn sstore(evm: &mut Evm, env: &mut Environment<'_>) -> Result<(), VmError> {
    // STACK
    let key = Bytes32::from(pop(&mut evm.stack)?);
    let new_value = pop(&mut evm.stack)?;

    if evm.message.is_static {
        return Err(VmError::WriteInStaticContext);
    }

    // OPERATION
    store_slot(env, &evm.message.current_target, &key, new_value)?;

    // PROGRAM COUNTER
    evm.pc += 1;
    Ok(())
}

/// Value of `key` in the storage of `address`, from the cache if it holds
/// the slot, otherwise from the backend.
///
/// A backend failure leaves the cache untouched.
pub fn load_slot(env: &mut Environment<'_>, address: &Address, key: &Bytes32) -> Result<U256, VmError> {
    let slot = SlotKey::new(*address, *key);
    if let Some(value) = env.sload_cache.store().and_then(|cache| cache.lookup(&slot)) {
        trace!(address = ?address, key = ?key, "sload cache hit");
        return Ok(value);
    }

    let value = env.state.get_storage(address, key)?;

    if let Some(cache) = env.sload_cache.store_mut() {
        trace!(address = ?address, key = ?key, "sload cache miss");
        cache.install(slot, value);
    }
    Ok(value)
}

/// Writes `value` to the backend, then evicts the slot from the cache.
///
/// A rejected write leaves the cache as it was. The error unwinds every
/// frame, and their rollbacks clear the store.
pub fn store_slot(env: &mut Environment<'_>, address: &Address, key: &Bytes32, value: U256) -> Result<(), VmError> {
    env.state.set_storage(address, key, value)?;

    if let Some(cache) = env.sload_cache.store_mut() {
        trace!(address = ?address, key = ?key, "sload cache invalidated");
        cache.invalidate(&SlotKey::new(*address, *key));
    }
    Ok(())
}
