use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crdt_client::{ClientError, MapKey, Result, StoreClient, TypedKey, UpdateOp, Value};

use crate::memory::MemoryStore;
use crate::replica::{Replica, ReplicaState};
use crate::traits::StateStore;

/// A [`Replica`] shared between threads.
///
/// Writers hold the lock for a whole `apply_updates` call, so a reader
/// sees either none or all of a multi-entry map update.
///
/// ```
/// use crdt_client::prelude::*;
/// use crdt_replica::{Replica, ReplicaConfig, SharedReplica};
///
/// let shared = SharedReplica::new(Replica::new(ReplicaConfig::new("r1")).unwrap());
/// let mut writer = CrdtClient::new(shared.clone());
/// let reader = CrdtClient::new(shared);
///
/// writer.assign_register("greeting", "hi").unwrap();
/// assert_eq!(reader.read_register("greeting").unwrap(), "hi");
/// ```
pub struct SharedReplica<S: StateStore = MemoryStore> {
    inner: Arc<RwLock<Replica<S>>>,
}

impl<S: StateStore> Clone for SharedReplica<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn poisoned() -> ClientError {
    ClientError::Connection("replica lock poisoned".into())
}

impl<S: StateStore> SharedReplica<S> {
    /// Share `replica`.
    pub fn new(replica: Replica<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(replica)),
        }
    }

    /// Lock for reading.
    pub fn read_lock(&self) -> Result<RwLockReadGuard<'_, Replica<S>>> {
        self.inner.read().map_err(|_| poisoned())
    }

    /// Lock for writing.
    pub fn write_lock(&self) -> Result<RwLockWriteGuard<'_, Replica<S>>> {
        self.inner.write().map_err(|_| poisoned())
    }

    /// Copy out the full state.
    pub fn export(&self) -> Result<ReplicaState> {
        Ok(self.read_lock()?.export())
    }

    /// Pull `other`'s state into this replica.
    ///
    /// `other` is snapshotted before this replica is locked, so syncing two
    /// handles in opposite directions from two threads cannot deadlock.
    pub fn sync_from<T: StateStore>(&self, other: &SharedReplica<T>) -> Result<()> {
        let state = other.export()?;
        self.write_lock()?.merge_state(&state)
    }
}

impl<S: StateStore> StoreClient for SharedReplica<S> {
    fn apply_updates(&mut self, updates: &[UpdateOp]) -> Result<()> {
        self.write_lock()?.apply_updates(updates)
    }

    fn read(&self, key: &TypedKey) -> Result<Value> {
        self.read_lock()?.read(key)
    }

    fn read_key_in_map(&self, map_key: &MapKey, nested: &TypedKey) -> Result<Value> {
        self.read_lock()?.read_key_in_map(map_key, nested)
    }
}

impl<S: StateStore> fmt::Debug for SharedReplica<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedReplica").finish_non_exhaustive()
    }
}
