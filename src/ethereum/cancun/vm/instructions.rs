//! https://github.com/ethereum/execution-specs/blob/master/src/ethereum/cancun/vm/instructions/__init__.py
//!
//! EVM Instruction Encoding (Opcodes)
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! .. contents:: Table of Contents
//!     :backlinks: none
//!     :local:
//!
//! Introduction
//! ------------
//!
//! Machine readable representations of EVM instructions, and a mapping to
//! their implementations. Only the subset needed to drive storage through
//! message calls is implemented; everything else is an invalid opcode.

use super::{exceptions::VmError, Environment, Evm};

pub mod arithmetic;
pub mod comparison;
pub mod control_flow;
pub mod environment;
pub mod keccak;
pub mod memory;
pub mod stack;
pub mod storage;
pub mod system;

pub mod opcode {
    pub const STOP : u8 = 0x00;
    pub const ADD : u8 = 0x01;
    pub const SUB : u8 = 0x03;
    pub const LT : u8 = 0x10;
    pub const GT : u8 = 0x11;
    pub const EQ : u8 = 0x14;
    pub const ISZERO : u8 = 0x15;
    pub const KECCAK256 : u8 = 0x20;
    pub const ADDRESS : u8 = 0x30;
    pub const CALLER : u8 = 0x33;
    pub const CALLDATALOAD : u8 = 0x35;
    pub const CALLDATASIZE : u8 = 0x36;
    pub const POP : u8 = 0x50;
    pub const MLOAD : u8 = 0x51;
    pub const MSTORE : u8 = 0x52;
    pub const SLOAD : u8 = 0x54;
    pub const SSTORE : u8 = 0x55;
    pub const PUSH0 : u8 = 0x5f;
    pub const PUSH1 : u8 = 0x60;
    pub const PUSH32 : u8 = 0x7f;
    pub const DUP1 : u8 = 0x80;
    pub const DUP16 : u8 = 0x8f;
    pub const SWAP1 : u8 = 0x90;
    pub const SWAP16 : u8 = 0x9f;
    pub const CALL : u8 = 0xf1;
    pub const RETURN : u8 = 0xf3;
    pub const STATICCALL : u8 = 0xfa;
    pub const REVERT : u8 = 0xfd;
    pub const INVALID : u8 = 0xfe;
}

/// Runs the instruction `op`, which must be the byte at `evm.pc`.
pub fn op_implementation(op: u8, evm: &mut Evm, env: &mut Environment<'_>) -> Result<(), VmError> {
    use opcode::*;
    match op {
        STOP => control_flow::stop(evm),
        ADD => arithmetic::add(evm),
        SUB => arithmetic::sub(evm),
        LT => comparison::less_than(evm),
        GT => comparison::greater_than(evm),
        EQ => comparison::equal(evm),
        ISZERO => comparison::is_zero(evm),
        KECCAK256 => keccak::keccak(evm),
        ADDRESS => environment::address(evm),
        CALLER => environment::caller(evm),
        CALLDATALOAD => environment::calldataload(evm),
        CALLDATASIZE => environment::calldatasize(evm),
        POP => stack::pop(evm),
        MLOAD => memory::mload(evm),
        MSTORE => memory::mstore(evm),
        SLOAD => storage::sload(evm, env),
        SSTORE => storage::sstore(evm, env),
        PUSH0..=PUSH32 => stack::push_n(evm, (op - PUSH0) as usize),
        DUP1..=DUP16 => stack::dup_n(evm, (op - DUP1) as usize),
        SWAP1..=SWAP16 => stack::swap_n(evm, (op - SWAP1 + 1) as usize),
        CALL => system::call(evm, env),
        RETURN => system::return_(evm),
        STATICCALL => system::staticcall(evm, env),
        REVERT => system::revert(evm),
        _ => Err(VmError::InvalidOpcode(op)),
    }
}
