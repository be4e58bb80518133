//! The store boundary and the high-level client built on it.

use std::collections::BTreeMap;

use tracing::debug;

use crate::aw_map::AwMapService;
use crate::counter::CounterService;
use crate::error::Result;
use crate::integer::IntegerService;
use crate::key::{Key, Kind, MapKey, TypedKey};
use crate::register::RegisterService;
use crate::service::CrdtService;
use crate::set::SetService;
use crate::update::UpdateOp;
use crate::value::Value;

/// A replicated store that accepts update descriptors and answers reads.
///
/// Implementations own transport, retries and conflict resolution. The
/// contract the client layer relies on:
///
/// - every descriptor passed to one `apply_*` call is applied atomically,
///   never split into separate round-trips;
/// - a key that was never written, or was removed and not re-added, reads
///   as its kind's identity value rather than an error;
/// - store failures are returned as `Connection` or `Conflict` errors.
pub trait StoreClient {
    /// Apply one descriptor.
    fn apply_update(&mut self, update: &UpdateOp) -> Result<()> {
        self.apply_updates(core::slice::from_ref(update))
    }

    /// Apply several top-level descriptors as one transaction.
    fn apply_updates(&mut self, updates: &[UpdateOp]) -> Result<()>;

    /// Read the merged value of a top-level key.
    fn read(&self, key: &TypedKey) -> Result<Value>;

    /// Read the merged value of `nested` inside the map at `map_key`.
    fn read_key_in_map(&self, map_key: &MapKey, nested: &TypedKey) -> Result<Value> {
        Ok(self.read(&map_key.typed())?.get(nested))
    }
}

impl<C: StoreClient + ?Sized> StoreClient for &mut C {
    fn apply_update(&mut self, update: &UpdateOp) -> Result<()> {
        (**self).apply_update(update)
    }

    fn apply_updates(&mut self, updates: &[UpdateOp]) -> Result<()> {
        (**self).apply_updates(updates)
    }

    fn read(&self, key: &TypedKey) -> Result<Value> {
        (**self).read(key)
    }

    fn read_key_in_map(&self, map_key: &MapKey, nested: &TypedKey) -> Result<Value> {
        (**self).read_key_in_map(map_key, nested)
    }
}

/// Name-based convenience API over a [`StoreClient`].
///
/// Each method mints the key, builds the descriptor and submits it in one
/// call. Typed reads convert the store's [`Value`] into the Rust type of the
/// key's kind.
pub struct CrdtClient<C: StoreClient> {
    store: C,
    integers: IntegerService,
    counters: CounterService,
    sets: SetService,
    registers: RegisterService,
    maps: AwMapService,
}

impl<C: StoreClient> CrdtClient<C> {
    /// Wrap a store.
    pub fn new(store: C) -> Self {
        Self {
            store,
            integers: IntegerService::new(),
            counters: CounterService::new(),
            sets: SetService::new(),
            registers: RegisterService::new(),
            maps: AwMapService::new(),
        }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &C {
        &self.store
    }

    /// Get a mutable reference to the underlying store.
    pub fn store_mut(&mut self) -> &mut C {
        &mut self.store
    }

    /// Unwrap the store.
    pub fn into_inner(self) -> C {
        self.store
    }

    /// Submit one descriptor.
    pub fn apply(&mut self, update: &UpdateOp) -> Result<()> {
        debug!(
            key = %update.key(),
            op = update.operation().name(),
            leaves = update.leaf_count(),
            "applying update"
        );
        self.store.apply_update(update)
    }

    /// Submit several descriptors as one transaction.
    pub fn apply_all(&mut self, updates: &[UpdateOp]) -> Result<()> {
        debug!(count = updates.len(), "applying update batch");
        self.store.apply_updates(updates)
    }

    /// Read a top-level key as its kind's Rust type.
    pub fn read_key<K: Kind>(&self, key: &Key<K>) -> Result<K::Value> {
        K::from_value(self.store.read(&key.typed())?)
    }

    /// Read a key nested in a map as its kind's Rust type.
    pub fn read_key_in_map<K: Kind>(&self, map_key: &MapKey, key: &Key<K>) -> Result<K::Value> {
        K::from_value(self.store.read_key_in_map(map_key, &key.typed())?)
    }

    /// Set the integer `name` to `value`.
    pub fn assign_integer(&mut self, name: &str, value: i64) -> Result<()> {
        let key = self.integers.get_key(name)?;
        let op = self.integers.assign_integer(&key, value);
        self.apply(&op)
    }

    /// Add `delta` to the integer `name`.
    pub fn increment_integer(&mut self, name: &str, delta: i64) -> Result<()> {
        let key = self.integers.get_key(name)?;
        let op = self.integers.increment_integer(&key, delta);
        self.apply(&op)
    }

    /// Read the integer `name`.
    pub fn read_integer(&self, name: &str) -> Result<i64> {
        self.read_key(&self.integers.get_key(name)?)
    }

    /// Add `delta` to the counter `name`.
    pub fn increment_counter(&mut self, name: &str, delta: i64) -> Result<()> {
        let key = self.counters.get_key(name)?;
        let op = self.counters.increment_counter(&key, delta);
        self.apply(&op)
    }

    /// Read the counter `name`.
    pub fn read_counter(&self, name: &str) -> Result<i64> {
        self.read_key(&self.counters.get_key(name)?)
    }

    /// Add elements to the set `name`.
    pub fn add_to_set<I, S>(&mut self, name: &str, elements: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = self.sets.get_key(name)?;
        let op = self.sets.add_elements(&key, elements);
        self.apply(&op)
    }

    /// Remove elements from the set `name`.
    pub fn remove_from_set<I, S>(&mut self, name: &str, elements: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = self.sets.get_key(name)?;
        let op = self.sets.remove_elements(&key, elements);
        self.apply(&op)
    }

    /// Read the set `name`, elements in ascending order.
    pub fn read_set(&self, name: &str) -> Result<Vec<String>> {
        self.read_key(&self.sets.get_key(name)?)
    }

    /// Overwrite the register `name`.
    pub fn assign_register(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let key = self.registers.get_key(name)?;
        let op = self.registers.assign_register(&key, value);
        self.apply(&op)
    }

    /// Read the register `name`.
    pub fn read_register(&self, name: &str) -> Result<String> {
        self.read_key(&self.registers.get_key(name)?)
    }

    /// Apply nested descriptors to the map `name` in one submission.
    pub fn update_map<I>(&mut self, name: &str, ops: I) -> Result<()>
    where
        I: IntoIterator<Item = UpdateOp>,
    {
        let key = self.maps.get_key(name)?;
        let op = self.maps.update_map(&key, ops)?;
        self.apply(&op)
    }

    /// Remove entries from the map `name` in one submission.
    pub fn remove_from_map<I, K>(&mut self, name: &str, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<TypedKey>,
    {
        let key = self.maps.get_key(name)?;
        let op = self.maps.remove_key(&key, keys)?;
        self.apply(&op)
    }

    /// Read `nested` inside the map `name`.
    pub fn read_in_map(&self, name: &str, nested: &TypedKey) -> Result<Value> {
        let key = self.maps.get_key(name)?;
        self.store.read_key_in_map(&key, nested)
    }

    /// Read every entry of the map `name`.
    pub fn read_map(&self, name: &str) -> Result<BTreeMap<TypedKey, Value>> {
        self.read_key(&self.maps.get_key(name)?)
    }
}
