use tracing_test::traced_test;

use crate::ethereum::{
    cancun::{
        fork_types::Address,
        state::{CountingState, State, StateError, StorageBackend},
        vm::{
            exceptions::VmError,
            instructions::opcode::*,
            sload_cache::{SloadCache, SlotKey},
            Config, Environment, Evm, Message,
        },
    },
    ethereum_types::{bytes::{Bytes, Bytes32}, numeric::U256},
    exceptions::Exception,
    utils::hexadecimal::{hex_to_bytes32, hex_to_u256},
};

use super::{execute_code, process_message_call, MessageCallOutput};

/// Builds bytecode the way the tests read it: every immediate is a PUSH32.
#[derive(Default)]
struct Asm(Vec<u8>);

impl Asm {
    fn new() -> Self {
        Self::default()
    }

    fn push(mut self, word: U256) -> Self {
        self.0.push(PUSH32);
        self.0.extend_from_slice(&word.to_be_bytes());
        self
    }

    fn push_u64(self, value: u64) -> Self {
        self.push(U256::from(value))
    }

    fn op(mut self, op: u8) -> Self {
        self.0.push(op);
        self
    }

    fn sload(self, slot: u64) -> Self {
        self.push_u64(slot).op(SLOAD)
    }

    fn sstore(self, slot: u64, value: u64) -> Self {
        self.push_u64(value).push_u64(slot).op(SSTORE)
    }

    /// CALL `to` with no input, copying 32 bytes of output to memory 0.
    fn call(self, to: Address) -> Self {
        self.push_u64(32)
            .push_u64(0)
            .push_u64(0)
            .push_u64(0)
            .push_u64(0)
            .push(to.to_word())
            .push_u64(0)
            .op(CALL)
    }

    fn staticcall(self, to: Address) -> Self {
        self.push_u64(32)
            .push_u64(0)
            .push_u64(0)
            .push_u64(0)
            .push(to.to_word())
            .push_u64(0)
            .op(STATICCALL)
    }

    /// RETURN or REVERT the first memory word.
    fn leave_with_word(self, op: u8) -> Self {
        self.push_u64(32).push_u64(0).op(op)
    }

    fn build(self) -> Bytes {
        Bytes(self.0)
    }
}

fn addr(s: &str) -> Address {
    Address::from_hex(s).unwrap()
}

fn slot(n: u64) -> Bytes32 {
    Bytes32::from(U256::from(n))
}

fn word(n: u64) -> U256 {
    U256::from(n)
}

fn contract_a() -> Address {
    addr("0x1000000000000000000000000000000000000001")
}

fn contract_b() -> Address {
    addr("0x3000000000000000000000000000000000000003")
}

fn caller() -> Address {
    addr("0x2000000000000000000000000000000000000002")
}

fn run(state: &mut dyn StorageBackend, config: Config, code: Bytes) -> Result<MessageCallOutput, Exception> {
    let mut env = Environment::new(state, config);
    let output = process_message_call(Message::new(caller(), contract_a(), code), &mut env);
    assert!(!env.sload_cache.is_active(), "store must not outlive the call");
    output
}

/// Runs `code` directly against an explicitly attached store, the way an
/// interpreter embedded in a larger call would.
fn run_with_store(state: &mut dyn StorageBackend, cache: SloadCache, code: Bytes) -> (Result<Evm, StateError>, Option<SloadCache>) {
    let mut env = Environment::new(state, Config::default()).with_sload_cache(cache);
    let evm = execute_code(Message::new(caller(), contract_a(), code), &mut env);
    (evm, env.sload_cache.discard())
}

fn double_sload_code(slot: Bytes32) -> Bytes {
    Asm::new()
        .push(U256::from(slot))
        .op(SLOAD)
        .op(POP)
        .push(U256::from(slot))
        .op(SLOAD)
        .op(STOP)
        .build()
}

fn sstore_then_sload_code(slot: Bytes32, new_value: U256) -> Bytes {
    Asm::new()
        .push(U256::from(slot))
        .op(SLOAD)
        .op(POP)
        .push(new_value)
        .push(U256::from(slot))
        .op(SSTORE)
        .push(U256::from(slot))
        .op(SLOAD)
        .op(STOP)
        .build()
}

#[test]
fn sload_cache_hits_within_frame() {
    let slot = hex_to_bytes32("0x01").unwrap();
    let value = hex_to_u256("0x02").unwrap();

    let mut state = State::new();
    state.set_storage_value(contract_a(), slot, value);
    let mut counting = CountingState::new(state);

    let (evm, cache) = run_with_store(&mut counting, SloadCache::new(), double_sload_code(slot));
    let evm = evm.unwrap();

    assert_eq!(evm.error, None);
    assert_eq!(evm.stack, vec![value]);
    assert_eq!(counting.load_count(), 1);
    assert_eq!(cache.unwrap().lookup(&SlotKey::new(contract_a(), slot)), Some(value));
}

#[test]
fn sload_cache_invalidated_by_sstore() {
    let slot = hex_to_bytes32("0x04").unwrap();
    let initial = hex_to_u256("0x05").unwrap();
    let updated = hex_to_u256("0x06").unwrap();

    let mut state = State::new();
    state.set_storage_value(contract_a(), slot, initial);
    let mut counting = CountingState::new(state);

    let (evm, cache) = run_with_store(&mut counting, SloadCache::new(), sstore_then_sload_code(slot, updated));
    let evm = evm.unwrap();

    assert_eq!(evm.stack, vec![updated]);
    assert_eq!(counting.load_count(), 2);
    assert_eq!(counting.inner().storage_value(&contract_a(), &slot), updated);
    // The value the last SLOAD read back is cached, the SSTORE itself wrote nothing in.
    assert_eq!(cache.unwrap().lookup(&SlotKey::new(contract_a(), slot)), Some(updated));
}

#[test]
fn top_level_call_reads_through_fresh_store() {
    let mut state = State::new();
    state.set_storage_value(contract_a(), slot(1), word(2));
    let mut counting = CountingState::new(state);

    let out = run(&mut counting, Config::default(), double_sload_code(slot(1))).unwrap();

    assert_eq!(out.error, None);
    assert_eq!(out.stack, vec![word(2)]);
    assert_eq!(counting.load_count(), 1);
}

#[test]
fn top_level_call_invalidates_on_sstore() {
    let mut state = State::new();
    state.set_storage_value(contract_a(), slot(4), word(5));
    let mut counting = CountingState::new(state);

    let out = run(&mut counting, Config::default(), sstore_then_sload_code(slot(4), word(6))).unwrap();

    assert_eq!(out.stack, vec![word(6)]);
    assert_eq!(counting.load_count(), 2);
    assert_eq!(counting.store_count(), 1);
    assert_eq!(counting.inner().storage_value(&contract_a(), &slot(4)), word(6));
}

#[test]
fn disabled_cache_reads_backend_every_time() {
    let mut state = State::new();
    state.set_storage_value(contract_a(), slot(1), word(2));
    let mut counting = CountingState::new(state);

    let out = run(&mut counting, Config::without_sload_cache(), double_sload_code(slot(1))).unwrap();

    assert_eq!(out.stack, vec![word(2)]);
    assert_eq!(counting.load_count(), 2);
}

#[test]
fn disabled_config_ignores_attached_store() {
    let mut state = State::new();
    state.set_storage_value(contract_a(), slot(1), word(2));
    let mut counting = CountingState::new(state);

    let mut stale = SloadCache::new();
    stale.install(SlotKey::new(contract_a(), slot(1)), word(99));
    let mut env = Environment::new(&mut counting, Config::without_sload_cache()).with_sload_cache(stale);
    let out = process_message_call(Message::new(caller(), contract_a(), double_sload_code(slot(1))), &mut env).unwrap();
    assert!(!env.sload_cache.is_active());
    drop(env);

    assert_eq!(out.stack, vec![word(2)]);
    assert_eq!(counting.load_count(), 2);
}

#[test]
fn repeated_reads_hit_backend_once() {
    let mut state = State::new();
    state.set_storage_value(contract_a(), slot(7), word(8));
    let mut counting = CountingState::new(state);

    let code = (0..5).fold(Asm::new(), |asm, _| asm.sload(7)).op(STOP).build();
    let out = run(&mut counting, Config::default(), code).unwrap();

    assert_eq!(out.stack, vec![word(8); 5]);
    assert_eq!(counting.load_count(), 1);
}

#[test]
fn cached_and_uncached_runs_agree() {
    let code = Asm::new()
        .sload(1)
        .sload(2)
        .sstore(1, 10)
        .sload(1)
        .sload(2)
        .sstore(2, 0)
        .sload(2)
        .sload(1)
        .op(ADD)
        .sload(1)
        .op(STOP)
        .build();

    let seeded = || {
        let mut state = State::new();
        state.set_storage_value(contract_a(), slot(1), word(3));
        state.set_storage_value(contract_a(), slot(2), word(4));
        CountingState::new(state)
    };

    let mut cached_state = seeded();
    let cached = run(&mut cached_state, Config::default(), code.clone()).unwrap();
    let mut uncached_state = seeded();
    let uncached = run(&mut uncached_state, Config::without_sload_cache(), code).unwrap();

    assert_eq!(cached, uncached);
    assert_eq!(cached.stack, vec![word(3), word(4), word(10), word(4), word(10), word(10)]);
    assert_eq!(uncached_state.load_count(), 7);
    assert_eq!(cached_state.load_count(), 4);
    assert_eq!(
        cached_state.inner().storage_value(&contract_a(), &slot(1)),
        uncached_state.inner().storage_value(&contract_a(), &slot(1)),
    );
}

#[test]
fn nested_calls_share_the_store() {
    let b_code = Asm::new()
        .sload(1)
        .sload(1)
        .op(ADD)
        .push_u64(0)
        .op(MSTORE)
        .leave_with_word(RETURN)
        .build();
    let a_code = Asm::new()
        .sload(1)
        .op(POP)
        .call(contract_b())
        .op(POP)
        .push_u64(0)
        .op(MLOAD)
        .sload(1)
        .op(STOP)
        .build();

    let mut state = State::new();
    state.set_storage_value(contract_a(), slot(1), word(2));
    state.set_storage_value(contract_b(), slot(1), word(5));
    state.set_account_code(contract_b(), b_code);
    let mut counting = CountingState::new(state);

    let out = run(&mut counting, Config::default(), a_code).unwrap();

    assert_eq!(out.error, None);
    assert_eq!(out.stack, vec![word(10), word(2)]);
    assert_eq!(counting.load_count(), 2);
}

#[test]
fn reverted_sub_call_clears_the_store() {
    let a_code = |callee| {
        Asm::new()
            .sload(1)
            .op(POP)
            .call(callee)
            .sload(1)
            .op(STOP)
            .build()
    };
    let reverting = contract_b();
    let succeeding = addr("0x4000000000000000000000000000000000000004");

    let mut state = State::new();
    state.set_storage_value(contract_a(), slot(1), word(2));
    state.set_account_code(reverting, Asm::new().sstore(1, 1).push_u64(0).push_u64(0).op(REVERT).build());
    state.set_account_code(succeeding, Asm::new().sstore(1, 1).op(STOP).build());
    let mut counting = CountingState::new(state);

    let out = run(&mut counting, Config::default(), a_code(reverting)).unwrap();
    assert_eq!(out.stack, vec![word(0), word(2)]);
    assert_eq!(counting.load_count(), 2);
    assert_eq!(counting.inner().storage_value(&reverting, &slot(1)), word(0));

    counting.reset_loads();
    let out = run(&mut counting, Config::default(), a_code(succeeding)).unwrap();
    assert_eq!(out.stack, vec![word(1), word(2)]);
    assert_eq!(counting.load_count(), 1);
    assert_eq!(counting.inner().storage_value(&succeeding, &slot(1)), word(1));
}

#[test]
fn revert_never_leaves_a_stale_value() {
    // Reads its slot into memory, overwrites it, reads the new value back
    // (caching it) and reverts with the first read as output.
    let b_code = Asm::new()
        .sload(1)
        .push_u64(0)
        .op(MSTORE)
        .sstore(1, 9)
        .sload(1)
        .op(POP)
        .leave_with_word(REVERT)
        .build();
    let a_code = Asm::new()
        .call(contract_b())
        .op(POP)
        .push_u64(0)
        .op(MLOAD)
        .call(contract_b())
        .op(POP)
        .push_u64(0)
        .op(MLOAD)
        .op(STOP)
        .build();

    let seeded = || {
        let mut state = State::new();
        state.set_account_code(contract_b(), b_code.clone());
        state
    };

    let mut cached_state = seeded();
    let cached = run(&mut cached_state, Config::default(), a_code.clone()).unwrap();
    let mut uncached_state = seeded();
    let uncached = run(&mut uncached_state, Config::without_sload_cache(), a_code).unwrap();

    assert_eq!(cached.stack, vec![word(0), word(0)]);
    assert_eq!(cached, uncached);
    assert_eq!(cached_state.storage_value(&contract_b(), &slot(1)), word(0));
}

#[test]
fn store_is_not_reused_across_top_level_calls() {
    let mut state = State::new();
    state.set_storage_value(contract_a(), slot(1), word(2));
    let mut counting = CountingState::new(state);

    let out = run(&mut counting, Config::default(), double_sload_code(slot(1))).unwrap();
    assert_eq!(out.stack, vec![word(2)]);

    // Another writer changes the slot between calls.
    counting.inner_mut().set_storage_value(contract_a(), slot(1), word(3));

    let out = run(&mut counting, Config::default(), double_sload_code(slot(1))).unwrap();
    assert_eq!(out.stack, vec![word(3)]);
    assert_eq!(counting.load_count(), 2);
}

#[test]
fn static_sub_call_cannot_write() {
    let b_code = Asm::new().sstore(1, 1).op(STOP).build();
    let a_code = Asm::new().staticcall(contract_b()).sload(1).op(STOP).build();

    let mut state = State::new();
    state.set_storage_value(contract_a(), slot(1), word(2));
    state.set_account_code(contract_b(), b_code);
    let mut counting = CountingState::new(state);

    let out = run(&mut counting, Config::default(), a_code).unwrap();

    assert_eq!(out.stack, vec![word(0), word(2)]);
    assert_eq!(counting.store_count(), 0);
    assert_eq!(counting.inner().storage_value(&contract_b(), &slot(1)), word(0));
}

#[test]
fn halting_top_level_call_rolls_back_writes() {
    let code = Asm::new().sstore(1, 7).op(INVALID).build();

    let mut state = State::new();
    let out = run(&mut state, Config::default(), code).unwrap();

    assert_eq!(out.error, Some(VmError::InvalidOpcode(INVALID)));
    assert_eq!(state.storage_value(&contract_a(), &slot(1)), word(0));
    assert_eq!(state.transaction_depth(), 0);
}

/// Fails every read of one slot and every write, otherwise defers to `State`.
struct FailingState {
    inner: State,
    poisoned: Bytes32,
    reads: usize,
}

impl StorageBackend for FailingState {
    fn get_storage(&mut self, address: &Address, key: &Bytes32) -> Result<U256, StateError> {
        self.reads += 1;
        if *key == self.poisoned {
            return Err(StateError::Unavailable("disk gone".into()));
        }
        self.inner.get_storage(address, key)
    }

    fn set_storage(&mut self, address: &Address, key: &Bytes32, _value: U256) -> Result<(), StateError> {
        Err(StateError::Rejected { address: *address, key: *key })
    }

    fn get_code(&mut self, address: &Address) -> Result<Bytes, StateError> {
        self.inner.get_code(address)
    }

    fn begin_transaction(&mut self) {
        self.inner.begin_transaction()
    }

    fn commit_transaction(&mut self) {
        self.inner.commit_transaction()
    }

    fn rollback_transaction(&mut self) {
        self.inner.rollback_transaction()
    }
}

fn failing_state() -> FailingState {
    let mut inner = State::new();
    inner.set_storage_value(contract_a(), slot(1), word(2));
    FailingState { inner, poisoned: slot(3), reads: 0 }
}

#[test]
#[traced_test]
fn backend_read_failure_aborts_call() {
    let mut state = failing_state();
    let code = Asm::new().sload(1).sload(3).op(STOP).build();

    let err = run(&mut state, Config::default(), code).unwrap_err();

    assert_eq!(err, Exception::State(StateError::Unavailable("disk gone".into())));
    assert_eq!(state.inner.transaction_depth(), 0);
    assert!(logs_contain("message call aborted by state backend"));
}

#[test]
fn backend_read_failure_leaves_store_untouched() {
    let mut state = failing_state();
    let code = Asm::new().sload(3).op(STOP).build();

    let (evm, cache) = run_with_store(&mut state, SloadCache::new(), code);

    assert!(matches!(evm, Err(StateError::Unavailable(_))));
    assert!(cache.unwrap().is_empty());
}

#[test]
fn hit_never_consults_backend() {
    let mut state = failing_state();
    let poisoned = SlotKey::new(contract_a(), slot(3));
    let mut cache = SloadCache::new();
    cache.install(poisoned, word(1));

    // A cached key is answered without the backend, an uncached one is not.
    let (evm, _) = run_with_store(&mut state, cache, Asm::new().sload(3).op(STOP).build());
    assert_eq!(evm.unwrap().stack, vec![word(1)]);
    assert_eq!(state.reads, 0);

    let (evm, _) = run_with_store(&mut state, SloadCache::new(), Asm::new().sload(3).op(STOP).build());
    assert!(evm.is_err());
    assert_eq!(state.reads, 1);
}

#[test]
fn backend_write_failure_leaves_store_untouched() {
    let mut state = failing_state();
    let code = Asm::new().sload(1).op(POP).sstore(1, 4).op(STOP).build();

    let (evm, cache) = run_with_store(&mut state, SloadCache::new(), code);

    assert_eq!(evm.unwrap_err(), StateError::Rejected { address: contract_a(), key: slot(1) });
    assert_eq!(cache.unwrap().lookup(&SlotKey::new(contract_a(), slot(1))), Some(word(2)));
    assert_eq!(state.inner.storage_value(&contract_a(), &slot(1)), word(2));
}

#[test]
fn backend_write_failure_in_sub_call_clears_store() {
    let mut state = failing_state();
    state.inner.set_account_code(contract_b(), Asm::new().sstore(1, 4).op(STOP).build());
    let code = Asm::new().sload(1).op(POP).call(contract_b()).op(STOP).build();

    let (evm, cache) = run_with_store(&mut state, SloadCache::new(), code);

    assert!(matches!(evm, Err(StateError::Rejected { .. })));
    assert!(cache.unwrap().is_empty());
    assert_eq!(state.inner.transaction_depth(), 0);
}

#[test]
fn backend_failure_in_sub_call_aborts_top_level_call() {
    let mut state = failing_state();
    state.inner.set_account_code(contract_b(), Asm::new().sload(3).op(STOP).build());
    let code = Asm::new().call(contract_b()).op(STOP).build();

    let err = run(&mut state, Config::default(), code).unwrap_err();

    assert!(matches!(err, Exception::State(StateError::Unavailable(_))));
    assert_eq!(state.inner.transaction_depth(), 0);
}

#[test]
#[traced_test]
fn cache_traffic_is_traced() {
    let mut state = State::new();
    run(&mut state, Config::default(), sstore_then_sload_code(slot(1), word(2))).unwrap();

    assert!(logs_contain("sload cache activated"));
    assert!(logs_contain("sload cache miss"));
    assert!(logs_contain("sload cache invalidated"));
    assert!(logs_contain("sload cache discarded"));
}

#[test]
fn return_and_calldata() {
    let code = Asm::new()
        .push_u64(0)
        .op(CALLDATALOAD)
        .op(CALLDATASIZE)
        .op(ADD)
        .push_u64(0)
        .op(MSTORE)
        .leave_with_word(RETURN)
        .build();
    let mut state = State::new();
    let mut env = Environment::new(&mut state, Config::default());
    let message = Message::new(caller(), contract_a(), code).with_data(Bytes(vec![0x01; 32]));

    let out = process_message_call(message, &mut env).unwrap();

    let expected = U256::from_be_bytes([0x01; 32]) + word(32);
    assert_eq!(out.output, Bytes(expected.to_be_bytes().to_vec()));
    assert!(out.stack.is_empty());
}

#[test]
fn keccak_derived_mapping_slot() {
    // slot = keccak256(caller . 0), the usual `mapping(address => _)` layout.
    let code = Asm::new()
        .op(CALLER)
        .push_u64(0)
        .op(MSTORE)
        .push_u64(0)
        .push_u64(32)
        .op(MSTORE)
        .push_u64(64)
        .push_u64(0)
        .op(KECCAK256)
        .op(SLOAD)
        .op(STOP)
        .build();

    let mut preimage = caller().to_word().to_be_bytes().to_vec();
    preimage.extend_from_slice(&[0; 32]);
    let mapping_slot = Bytes32(*crate::ethereum::crypto::hash::keccak256(&preimage));

    let mut state = State::new();
    state.set_storage_value(contract_a(), mapping_slot, word(42));
    let out = run(&mut state, Config::default(), code).unwrap();

    assert_eq!(out.stack, vec![word(42)]);
}

#[test]
fn stack_and_opcode_halts() {
    let mut state = State::new();

    let out = run(&mut state, Config::default(), Asm::new().op(SLOAD).build()).unwrap();
    assert_eq!(out.error, Some(VmError::StackUnderflowError));

    let out = run(&mut state, Config::default(), Bytes(vec![0x0c])).unwrap();
    assert_eq!(out.error, Some(VmError::InvalidOpcode(0x0c)));

    let out = run(&mut state, Config::default(), Bytes(vec![PUSH1 + 1, 0xab])).unwrap();
    assert_eq!(out.stack, vec![word(0xab00)]);

    let code = Asm::new().push_u64(1).push_u64(2).op(DUP1 + 1).op(SWAP1).op(LT).op(ISZERO).op(STOP).build();
    let out = run(&mut state, Config::default(), code).unwrap();
    // [1, 2] -> DUP2 [1, 2, 1] -> SWAP1 [1, 1, 2] -> LT [1, 0] -> ISZERO [1, 1]
    assert_eq!(out.stack, vec![word(1), word(1)]);
}

#[test]
fn self_call_at_default_depth_limit() {
    // 1024 nested frames, each calling the next, under the default config.
    let mut state = State::new();
    state.set_account_code(contract_b(), Asm::new().call(contract_b()).op(STOP).build());
    let mut counting = CountingState::new(state);

    let out = run(&mut counting, Config::default(), Asm::new().call(contract_b()).op(STOP).build()).unwrap();

    assert_eq!(out.error, None);
    assert_eq!(out.stack, vec![word(1)]);
    assert_eq!(counting.inner().transaction_depth(), 0);
    assert_eq!(counting.inner().journal_len(), 0);
}

#[test]
fn deep_sub_call_reads_through_shared_store() {
    // Each frame reads slot 1 of B before calling itself, so only the first read loads.
    let b_code = Asm::new().sload(1).op(POP).call(contract_b()).op(STOP).build();
    let mut state = State::new();
    state.set_storage_value(contract_b(), slot(1), word(3));
    state.set_account_code(contract_b(), b_code);
    let mut counting = CountingState::new(state);

    let out = run(&mut counting, Config::default(), Asm::new().call(contract_b()).op(STOP).build()).unwrap();

    assert_eq!(out.stack, vec![word(1)]);
    assert_eq!(counting.load_count(), 1);
}

#[test]
fn memory_budget_is_shared_with_sub_calls() {
    let b_code = Asm::new().push_u64(1).push_u64(32).op(MSTORE).op(STOP).build();
    let a_code = Asm::new()
        .push_u64(1)
        .push_u64(0)
        .op(MSTORE)
        .call(contract_b())
        .op(STOP)
        .build();
    let config = Config { max_call_memory: 64, ..Config::default() };

    let mut state = State::new();
    state.set_account_code(contract_b(), b_code.clone());

    // A holds one word, so B may only grow to one word.
    let out = run(&mut state, config.clone(), a_code).unwrap();
    assert_eq!(out.error, None);
    assert_eq!(out.stack, vec![word(0)]);

    // B alone fits.
    let out = run(&mut state, config.clone(), b_code).unwrap();
    assert_eq!(out.error, None);

    let too_big = Asm::new().push_u64(1).push_u64(64).op(MSTORE).op(STOP).build();
    let out = run(&mut state, config, too_big).unwrap();
    assert_eq!(out.error, Some(VmError::MemoryLimitExceeded));
}

#[test]
fn call_depth_limit() {
    // Calls itself until the depth limit stops it.
    let mut state = State::new();
    state.set_account_code(contract_b(), Asm::new().call(contract_b()).op(STOP).build());
    let config = Config { max_call_depth: 8, ..Config::default() };

    let out = run(&mut state, config, Asm::new().call(contract_b()).op(STOP).build()).unwrap();

    assert_eq!(out.error, None);
    assert_eq!(out.stack, vec![word(1)]);
    assert_eq!(state.transaction_depth(), 0);
}
