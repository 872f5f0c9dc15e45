//! """
//! Ethereum Virtual Machine (EVM) Exceptions
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! .. contents:: Table of Contents
//!     :backlinks: none
//!     :local:
//!
//! Introduction
//! ------------
//!
//! Exceptions which cause the EVM to halt exceptionally.
//! """

use thiserror::Error;

use crate::ethereum::cancun::state::StateError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// """
    /// Raised by the `REVERT` opcode.
    ///
    /// Unlike other EVM exceptions this does not result in the consumption of all
    /// gas.
    /// """
    #[error("execution reverted")]
    Revert,

    /// """
    /// Occurs when a pop is executed on an empty stack.
    /// """
    #[error("stack underflow")]
    StackUnderflowError,

    /// """
    /// Occurs when a push is executed on a stack at max capacity.
    /// """
    #[error("stack overflow")]
    StackOverflowError,

    /// """
    /// Raised when an invalid opcode is encountered.
    /// """
    #[error("invalid opcode {0:#04x}")]
    InvalidOpcode(u8),

    /// """
    /// Raised when the message depth is greater than `1024`
    /// """
    #[error("stack depth limit reached")]
    StackDepthLimitError,

    /// """
    /// Raised when an attempt is made to modify the state while operating inside
    /// of a STATICCALL context.
    /// """
    #[error("write in static context")]
    WriteInStaticContext,

    /// Memory access past the unmetered expansion limit.
    #[error("memory limit exceeded")]
    MemoryLimitExceeded,

    /// The storage backend failed. Not a contract level halt: it aborts the
    /// whole message call.
    #[error(transparent)]
    Backend(#[from] StateError),
}
