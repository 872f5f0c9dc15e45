//! Ethereum Virtual Machine (EVM) Stack
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! .. contents:: Table of Contents
//!     :backlinks: none
//!     :local:
//!
//! Introduction
//! ------------
//!
//! Implementation of the stack operators for the EVM.

use crate::ethereum::ethereum_types::numeric::U256;

use super::exceptions::VmError;

pub const STACK_LIMIT : usize = 1024;

/// Pops the top item off of `stack`.
///
/// Parameters
/// ----------
/// stack :
///     EVM stack.
///
/// Returns
/// -------
/// value : `U256`
///     The top element on the stack.
///
pub fn pop(stack: &mut Vec<U256>) -> Result<U256, VmError> {
    stack.pop().ok_or(VmError::StackUnderflowError)
}


/// Pushes `value` onto `stack`.
///
/// Parameters
/// ----------
/// stack :
///     EVM stack.
///
/// value :
///     Item to be pushed onto `stack`.
///
pub fn push(stack: &mut Vec<U256>, value: U256) -> Result<(), VmError> {
    if stack.len() == STACK_LIMIT {
        Err(VmError::StackOverflowError)
    } else {
        stack.push(value);
        Ok(())
    }
}

/// Item `n` places below the top, zero being the top itself.
pub fn peek(stack: &[U256], n: usize) -> Result<U256, VmError> {
    stack
        .len()
        .checked_sub(n + 1)
        .map(|i| stack[i])
        .ok_or(VmError::StackUnderflowError)
}
