//! https://github.com/ethereum/execution-specs/blob/master/src/ethereum/cancun/state.py
//!
//! State
//! ^^^^^
//!
//! .. contents:: Table of Contents
//!     :backlinks: none
//!     :local:
//!
//! Introduction
//! ------------
//!
//! The state contains all information that is preserved between transactions.
//!
//! The interpreter only ever sees it through [`StorageBackend`]: slot reads,
//! slot writes, code lookups and the nested transactions that back reverts.
//! [`State`] is an in-memory implementation of that contract and
//! [`CountingState`] wraps any backend to count the slot reads that reach it.
//!
//! `State` keeps a journal of overwritten values rather than copying itself
//! per transaction, so opening a transaction is constant time and the extra
//! memory held by a call grows with the writes it makes.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::ethereum::ethereum_types::{bytes::{Bytes, Bytes32}, numeric::U256};

use super::fork_types::{Account, Address, EMPTY_ACCOUNT};

/// Failures raised by a storage backend. The interpreter never interprets
/// these, it only propagates them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("write to slot {key:?} of {address:?} rejected")]
    Rejected { address: Address, key: Bytes32 },
}

/// Slot level access to a versioned account store.
///
/// `begin_transaction`, `commit_transaction` and `rollback_transaction`
/// nest. Every message frame opens one and closes it exactly once.
pub trait StorageBackend {
    /// Value of `key` in the storage of `address`. Absent slots read as zero.
    fn get_storage(&mut self, address: &Address, key: &Bytes32) -> Result<U256, StateError>;

    /// Sets `key` of `address` to `value`. Writing zero deletes the slot.
    fn set_storage(&mut self, address: &Address, key: &Bytes32, value: U256) -> Result<(), StateError>;

    /// Code of the account at `address`, empty if there is none.
    fn get_code(&mut self, address: &Address) -> Result<Bytes, StateError>;

    fn begin_transaction(&mut self);

    fn commit_transaction(&mut self);

    fn rollback_transaction(&mut self);
}

/// A value overwritten inside an open transaction.
#[derive(Debug, Clone)]
enum JournalEntry {
    Storage { address: Address, key: Bytes32, previous: U256 },
    Code { address: Address, previous: Option<Account> },
}

/// In-memory state with a journal of undoable writes.
#[derive(Debug, Default, Clone)]
pub struct State {
    accounts: BTreeMap<Address, Account>,
    storage: BTreeMap<Address, BTreeMap<Bytes32, U256>>,
    journal: Vec<JournalEntry>,
    /// Journal length at the start of each open transaction.
    checkpoints: Vec<usize>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the account if needed and replaces its code.
    pub fn set_account_code(&mut self, address: Address, code: Bytes) {
        let previous = self.accounts.insert(address, Account { code });
        self.record(JournalEntry::Code { address, previous });
    }

    pub fn get_account(&self, address: &Address) -> &Account {
        self.accounts.get(address).unwrap_or(&EMPTY_ACCOUNT)
    }

    /// Reads a slot without going through [`StorageBackend`], for setup and checks.
    pub fn storage_value(&self, address: &Address, key: &Bytes32) -> U256 {
        self.storage
            .get(address)
            .and_then(|slots| slots.get(key))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Writes a slot without going through [`StorageBackend`], for setup.
    pub fn set_storage_value(&mut self, address: Address, key: Bytes32, value: U256) {
        let previous = self.storage_value(&address, &key);
        self.record(JournalEntry::Storage { address, key, previous });
        self.write_slot(address, key, value);
    }

    fn write_slot(&mut self, address: Address, key: Bytes32, value: U256) {
        let slots = self.storage.entry(address).or_default();
        if value.is_zero() {
            slots.remove(&key);
            if slots.is_empty() {
                self.storage.remove(&address);
            }
        } else {
            slots.insert(key, value);
        }
    }

    /// Depth of the open transaction stack. Zero outside any message frame.
    pub fn transaction_depth(&self) -> usize {
        self.checkpoints.len()
    }

    /// Number of undo records held for the open transactions.
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    fn record(&mut self, entry: JournalEntry) {
        if !self.checkpoints.is_empty() {
            self.journal.push(entry);
        }
    }
}

impl StorageBackend for State {
    fn get_storage(&mut self, address: &Address, key: &Bytes32) -> Result<U256, StateError> {
        Ok(self.storage_value(address, key))
    }

    fn set_storage(&mut self, address: &Address, key: &Bytes32, value: U256) -> Result<(), StateError> {
        self.set_storage_value(*address, *key, value);
        Ok(())
    }

    fn get_code(&mut self, address: &Address) -> Result<Bytes, StateError> {
        Ok(self.get_account(address).code.clone())
    }

    fn begin_transaction(&mut self) {
        self.checkpoints.push(self.journal.len());
    }

    fn commit_transaction(&mut self) {
        self.checkpoints.pop();
        // The outermost commit leaves nothing to undo into.
        if self.checkpoints.is_empty() {
            self.journal.clear();
        }
    }

    fn rollback_transaction(&mut self) {
        let Some(checkpoint) = self.checkpoints.pop() else {
            return;
        };
        while self.journal.len() > checkpoint {
            match self.journal.pop() {
                Some(JournalEntry::Storage { address, key, previous }) => {
                    self.write_slot(address, key, previous);
                }
                Some(JournalEntry::Code { address, previous: Some(account) }) => {
                    self.accounts.insert(address, account);
                }
                Some(JournalEntry::Code { address, previous: None }) => {
                    self.accounts.remove(&address);
                }
                None => break,
            }
        }
    }
}

/// Wraps a backend and records how many slot reads and writes reach it.
#[derive(Debug, Default)]
pub struct CountingState<S> {
    inner: S,
    loads: usize,
    stores: usize,
}

impl<S: StorageBackend> CountingState<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, loads: 0, stores: 0 }
    }

    pub fn load_count(&self) -> usize {
        self.loads
    }

    pub fn store_count(&self) -> usize {
        self.stores
    }

    pub fn reset_loads(&mut self) {
        self.loads = 0;
        self.stores = 0;
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}

impl<S: StorageBackend> StorageBackend for CountingState<S> {
    fn get_storage(&mut self, address: &Address, key: &Bytes32) -> Result<U256, StateError> {
        self.loads += 1;
        self.inner.get_storage(address, key)
    }

    fn set_storage(&mut self, address: &Address, key: &Bytes32, value: U256) -> Result<(), StateError> {
        self.stores += 1;
        self.inner.set_storage(address, key, value)
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
