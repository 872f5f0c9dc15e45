//! Storage Read Cache
//! ^^^^^^^^^^^^^^^^^^
//!
//! .. contents:: Table of Contents
//!     :backlinks: none
//!     :local:
//!
//! Introduction
//! ------------
//!
//! Repeated `SLOAD`s of the same slot within one top-level message call are
//! answered from an [`SloadCache`] instead of the storage backend.
//!
//! Rules the interpreter follows:
//!
//!   1. A store exists only while a top-level call runs
//!      ([`SloadCacheLifecycle::activate`] / [`SloadCacheLifecycle::discard`]).
//!      Every nested call under it shares the same store; the address in
//!      [`SlotKey`] keeps contracts apart.
//!   2. `SLOAD` installs what the backend returned on a miss.
//!   3. `SSTORE` evicts the slot after the backend write. The written value is
//!      never installed.
//!   4. Any frame rollback clears the whole store
//!      ([`SloadCacheLifecycle::on_rollback`]).
//!
//! Under these rules every entry equals what the backend would return for
//! its key, so a cached run and an uncached run produce the same values and
//! differ only in how many reads reach the backend.

use std::collections::HashMap;

use tracing::debug;

use crate::ethereum::{cancun::fork_types::Address, ethereum_types::{bytes::Bytes32, numeric::U256}};

/// One storage cell: a slot within the storage of one account.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct SlotKey {
    pub address: Address,
    pub key: Bytes32,
}

impl SlotKey {
    pub fn new(address: Address, key: Bytes32) -> Self {
        Self { address, key }
    }
}

/// Slot values observed during one top-level call.
///
/// No eviction policy: the store lives no longer than the call that owns it.
#[derive(Debug, Default, Clone)]
pub struct SloadCache {
    entries: HashMap<SlotKey, U256>,
}

impl SloadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key`, if any.
    pub fn lookup(&self, key: &SlotKey) -> Option<U256> {
        self.entries.get(key).copied()
    }

    /// Inserts or overwrites the entry for `key`.
    pub fn install(&mut self, key: SlotKey, value: U256) {
        self.entries.insert(key, value);
    }

    /// Removes the entry for `key`. Absent keys are fine.
    pub fn invalidate(&mut self, key: &SlotKey) {
        self.entries.remove(key);
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether `key` has an entry.
    pub fn contains(&self, key: &SlotKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no slot is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether a store is attached to the running call.
///
/// `Absent` behaves exactly as if the cache did not exist: every `SLOAD`
/// goes to the backend.
#[derive(Debug, Default)]
pub enum SloadCacheLifecycle {
    #[default]
    Absent,
    Active(SloadCache),
}

impl SloadCacheLifecycle {
    /// Start of a top-level call: attaches a fresh, empty store.
    ///
    /// A store left over from an earlier call (one that unwound before it
    /// could discard) is dropped, never reused.
    pub fn activate(&mut self) {
        if let SloadCacheLifecycle::Active(stale) = self {
            debug!(entries = stale.len(), "dropping sload cache left by an earlier call");
        }
        debug!("sload cache activated");
        *self = SloadCacheLifecycle::Active(SloadCache::new());
    }

    /// Attaches a caller supplied store as is.
    pub fn attach(&mut self, cache: SloadCache) {
        *self = SloadCacheLifecycle::Active(cache);
    }

    /// End of a top-level call: detaches the store and hands it back.
    pub fn discard(&mut self) -> Option<SloadCache> {
        match std::mem::take(self) {
            SloadCacheLifecycle::Active(cache) => {
                debug!(entries = cache.len(), "sload cache discarded");
                Some(cache)
            }
            SloadCacheLifecycle::Absent => None,
        }
    }

    /// A message frame rolled its backend transaction back. The backend may
    /// now hold older values for any slot touched since the frame began, so
    /// nothing cached can be trusted.
    pub fn on_rollback(&mut self) {
        if let SloadCacheLifecycle::Active(cache) = self {
            debug!(entries = cache.len(), "sload cache cleared on rollback");
            cache.clear();
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SloadCacheLifecycle::Active(_))
    }

    pub fn store(&self) -> Option<&SloadCache> {
        match self {
            SloadCacheLifecycle::Active(cache) => Some(cache),
            SloadCacheLifecycle::Absent => None,
        }
    }

    pub fn store_mut(&mut self) -> Option<&mut SloadCache> {
        match self {
            SloadCacheLifecycle::Active(cache) => Some(cache),
            SloadCacheLifecycle::Absent => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::ethereum::utils::hexadecimal::hex_to_bytes32;

    fn key(addr: &str, slot: &str) -> SlotKey {
        SlotKey::new(Address::from_hex(addr).unwrap(), hex_to_bytes32(slot).unwrap())
    }

    #[test]
    fn new_store_is_empty() {
        let cache = SloadCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.lookup(&key("0x01", "0x00")), None);
        assert_eq!(cache.lookup(&key("0x01", "0xffff")), None);
    }

    #[test]
    fn install_lookup_invalidate() {
        let mut cache = SloadCache::new();
        let k = key("0x01", "0x01");

        assert!(!cache.contains(&k));
        cache.install(k, U256::from(2_u32));
        assert!(cache.contains(&k));
        assert_eq!(cache.lookup(&k), Some(U256::from(2_u32)));

        cache.install(k, U256::from(3_u32));
        assert_eq!(cache.lookup(&k), Some(U256::from(3_u32)));
        assert_eq!(cache.len(), 1);

        cache.invalidate(&k);
        assert!(!cache.contains(&k));
        assert_eq!(cache.lookup(&k), None);
        cache.invalidate(&k);
        assert!(cache.is_empty());
    }

    #[test]
    fn same_slot_in_different_contracts_does_not_collide() {
        let mut cache = SloadCache::new();
        let a = key("0x0a", "0x01");
        let b = key("0x0b", "0x01");

        cache.install(a, U256::from(1_u32));
        cache.install(b, U256::from(2_u32));
        cache.invalidate(&a);

        assert_eq!(cache.lookup(&a), None);
        assert_eq!(cache.lookup(&b), Some(U256::from(2_u32)));
    }

    #[test]
    fn clear_drops_everything() {
        let mut cache = SloadCache::new();
        cache.install(key("0x0a", "0x01"), U256::ONE);
        cache.install(key("0x0b", "0x02"), U256::ONE);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    #[traced_test]
    fn lifecycle_transitions() {
        let mut lifecycle = SloadCacheLifecycle::default();
        assert!(!lifecycle.is_active());
        assert!(lifecycle.store_mut().is_none());
        lifecycle.on_rollback();
        assert!(lifecycle.discard().is_none());

        lifecycle.activate();
        assert!(lifecycle.is_active());
        let k = key("0x0a", "0x01");
        if let Some(cache) = lifecycle.store_mut() {
            cache.install(k, U256::ONE);
        }

        lifecycle.on_rollback();
        assert!(lifecycle.is_active());
        assert!(lifecycle.store().is_some_and(SloadCache::is_empty));

        if let Some(cache) = lifecycle.store_mut() {
            cache.install(k, U256::ONE);
        }
        let discarded = lifecycle.discard().unwrap();
        assert_eq!(discarded.lookup(&k), Some(U256::ONE));
        assert!(!lifecycle.is_active());

        assert!(logs_contain("sload cache activated"));
        assert!(logs_contain("sload cache cleared on rollback"));
        assert!(logs_contain("sload cache discarded"));
    }

    #[test]
    fn activate_never_reuses_a_leftover_store() {
        let mut lifecycle = SloadCacheLifecycle::default();
        let mut leftover = SloadCache::new();
        leftover.install(key("0x0a", "0x01"), U256::ONE);
        lifecycle.attach(leftover);

        lifecycle.activate();
        assert!(lifecycle.store().is_some_and(SloadCache::is_empty));
    }
}
