//! https://github.com/ethereum/execution-specs/blob/master/src/ethereum/cancun/vm/__init__.py
//!

use exceptions::VmError;
use instructions::system::PendingCall;
use memory::MAX_MEMORY_SIZE;
use sload_cache::{SloadCache, SloadCacheLifecycle};

use crate::ethereum::{cancun::{fork_types::*, state::StorageBackend}, crypto::hash::{keccak256, Hash32}, ethereum_types::{bytes::*, numeric::*}};

use interpreter::STACK_DEPTH_LIMIT;

pub mod exceptions;
pub mod instructions;
pub mod interpreter;
pub mod memory;
pub mod sload_cache;
pub mod stack;


/// Interpreter settings for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether a top-level call reads storage through an [`SloadCache`].
    pub sload_cache: bool,
    /// Message depth past which a call halts with `StackDepthLimitError`.
    pub max_call_depth: usize,
    /// Bytes of EVM memory all frames of one top-level call may hold together.
    pub max_call_memory: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sload_cache: true,
            max_call_depth: STACK_DEPTH_LIMIT,
            max_call_memory: MAX_MEMORY_SIZE,
        }
    }
}

impl Config {
    pub fn without_sload_cache() -> Self {
        Self { sload_cache: false, ..Self::default() }
    }
}

/// Items external to the virtual machine itself, provided by the environment.
pub struct Environment<'a> {
    pub state: &'a mut dyn StorageBackend,
    pub config: Config,
    pub sload_cache: SloadCacheLifecycle,
}

impl<'a> Environment<'a> {
    pub fn new(state: &'a mut dyn StorageBackend, config: Config) -> Self {
        Self {
            state,
            config,
            sload_cache: SloadCacheLifecycle::Absent,
        }
    }

    /// Attaches `cache` so that code run directly through
    /// [`interpreter::execute_code`] reads through it.
    pub fn with_sload_cache(mut self, cache: SloadCache) -> Self {
        self.sload_cache.attach(cache);
        self
    }
}

/// Items that are used by a message call.
#[derive(Debug, Clone)]
pub struct Message {
    pub caller: Address,
    pub target: Address,
    pub current_target: Address,
    pub data: Bytes,
    pub code: Bytes,
    pub depth: usize,
    pub is_static: bool,
}

impl Message {
    /// A depth zero call from `caller` running `code` as `target`.
    pub fn new(caller: Address, target: Address, code: Bytes) -> Self {
        Self {
            caller,
            target,
            current_target: target,
            data: Bytes::default(),
            code,
            depth: 0,
            is_static: false,
        }
    }

    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = data;
        self
    }

    pub fn code_hash(&self) -> Hash32 {
        keccak256(&self.code)
    }
}


/// The internal state of the virtual machine.
#[derive(Debug)]
pub struct Evm {
    pub pc: usize,
    pub stack: Vec<U256>,
    pub memory: Vec<u8>,
    pub code: Bytes,
    pub running: bool,
    pub message: Message,
    pub output: Bytes,
    pub return_data: Bytes,
    pub error: Option<VmError>,
    /// Largest size `memory` may grow to: the call's memory budget less
    /// what the suspended callers of this frame hold.
    pub memory_limit: usize,
    /// Sub-call requested by the last CALL or STATICCALL, picked up by the
    /// interpreter before the next instruction.
    pub pending_call: Option<PendingCall>,
}

impl Evm {
    pub fn new(message: Message) -> Self {
        Self {
            pc: 0,
            stack: Vec::new(),
            memory: Vec::new(),
            code: message.code.clone(),
            running: true,
            message,
            output: Bytes::default(),
            return_data: Bytes::default(),
            error: None,
            memory_limit: MAX_MEMORY_SIZE,
            pending_call: None,
        }
    }
}
