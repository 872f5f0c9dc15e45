//! Ethereum Virtual Machine (EVM) Control Flow Instructions
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! Introduction
//! ------------
//!
//! Only STOP. Without jump-destination analysis there are no jumps.

use crate::ethereum::cancun::vm::{exceptions::VmError, Evm};

/// Stop further execution of EVM code.
pub fn stop(evm: &mut Evm) -> Result<(), VmError> {
    evm.running = false;
    evm.pc += 1;
    Ok(())
}
