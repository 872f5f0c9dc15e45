//! Ethereum Virtual Machine (EVM) Comparison Instructions
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! Introduction
//! ------------
//!
//! Implementations of the EVM Comparison instructions. Results are pushed
//! as 1 or 0.

use crate::ethereum::{cancun::vm::{exceptions::VmError, stack::{pop, push}, Evm}, ethereum_types::numeric::U256};

fn compare(evm: &mut Evm, f: impl FnOnce(U256, U256) -> bool) -> Result<(), VmError> {
    let left = pop(&mut evm.stack)?;
    let right = pop(&mut evm.stack)?;

    push(&mut evm.stack, U256::from_bool(f(left, right)))?;

    evm.pc += 1;
    Ok(())
}

pub fn less_than(evm: &mut Evm) -> Result<(), VmError> {
    compare(evm, |l, r| l < r)
}

pub fn greater_than(evm: &mut Evm) -> Result<(), VmError> {
    compare(evm, |l, r| l > r)
}

pub fn equal(evm: &mut Evm) -> Result<(), VmError> {
    compare(evm, |l, r| l == r)
}

/// Checks if the top element is equal to 0.
pub fn is_zero(evm: &mut Evm) -> Result<(), VmError> {
    let x = pop(&mut evm.stack)?;

    push(&mut evm.stack, U256::from_bool(x.is_zero()))?;

    evm.pc += 1;
    Ok(())
}
