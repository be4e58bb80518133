//! A single replica: the objects it holds, its clock, and its backend.

use std::collections::BTreeMap;
use std::fmt;

use crdt_client::{ClientError, MapKey, Result, StoreClient, TypedKey, UpdateOp, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{HybridClock, HybridTimestamp};
use crate::config::ReplicaConfig;
use crate::envelope::VersionedEnvelope;
use crate::memory::MemoryStore;
use crate::object::{Object, OpContext};
use crate::traits::StateStore;
use crate::Crdt;

/// Previous contents of every key an in-flight call touched.
type Backup = BTreeMap<TypedKey, Option<Object>>;

/// What gets framed into the envelope for one key.
#[derive(Serialize, Deserialize)]
struct Stored<O> {
    clock: HybridTimestamp,
    object: O,
}

/// A full copy of a replica's state, for anti-entropy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaState {
    /// Latest timestamp the exporting replica had issued or observed.
    pub clock: HybridTimestamp,
    /// Every object the replica holds.
    pub objects: BTreeMap<TypedKey, Object>,
}

impl ReplicaState {
    /// Encode with postcard.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(persistence)
    }

    /// Decode from postcard bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        postcard::from_bytes(bytes).map_err(persistence)
    }
}

fn persistence<E: fmt::Display>(err: E) -> ClientError {
    ClientError::Persistence(err.to_string())
}

pub(crate) fn encode(key: &TypedKey, object: &Object, clock: HybridTimestamp) -> Result<Vec<u8>> {
    let payload = postcard::to_allocvec(&Stored { clock, object }).map_err(persistence)?;
    Ok(VersionedEnvelope::current(key.kind(), payload).to_bytes())
}

fn decode(key: &TypedKey, bytes: &[u8]) -> Result<Stored<Object>> {
    let envelope = VersionedEnvelope::from_bytes(bytes).map_err(persistence)?;
    envelope.check_version().map_err(persistence)?;
    if envelope.kind != key.kind() {
        return Err(ClientError::Persistence(format!(
            "`{key}` is framed as a {} object",
            envelope.kind
        )));
    }

    let stored: Stored<Object> = postcard::from_bytes(&envelope.payload).map_err(persistence)?;
    stored
        .object
        .check_kind(key.kind())
        .map_err(|err| ClientError::Persistence(format!("`{key}`: {err}")))?;
    Ok(stored)
}

/// An in-process replica implementing [`StoreClient`].
///
/// Every `apply_updates` call is atomic: descriptors are validated up
/// front, applied in order, and the touched objects are written to the
/// backend in one batch. If anything fails, the in-memory objects are
/// restored and the error is returned.
///
/// # Example
///
/// ```
/// use crdt_client::prelude::*;
/// use crdt_replica::{Replica, ReplicaConfig};
///
/// let replica = Replica::new(ReplicaConfig::new("node-1")).unwrap();
/// let mut client = CrdtClient::new(replica);
///
/// client.increment_counter("hits", 2).unwrap();
/// assert_eq!(client.read_counter("hits").unwrap(), 2);
/// ```
pub struct Replica<S: StateStore = MemoryStore> {
    config: ReplicaConfig,
    clock: HybridClock,
    objects: BTreeMap<TypedKey, Object>,
    store: S,
}

impl Replica<MemoryStore> {
    /// A replica backed by a fresh [`MemoryStore`].
    pub fn new(config: ReplicaConfig) -> Result<Self> {
        Self::open(MemoryStore::new(), config)
    }
}

impl<S: StateStore> Replica<S> {
    /// Start configuring a replica over `store`.
    pub fn builder(store: S) -> ReplicaBuilder<S> {
        ReplicaBuilder {
            store,
            config: ReplicaConfig::default(),
            clock: None,
        }
    }

    /// Open a replica over `store`, loading every object of the bucket.
    pub fn open(store: S, config: ReplicaConfig) -> Result<Self> {
        Self::open_with_clock(store, config, HybridClock::new())
    }

    fn open_with_clock(store: S, config: ReplicaConfig, mut clock: HybridClock) -> Result<Self> {
        config.validate()?;

        let mut objects = BTreeMap::new();
        for key in store.keys(&config.bucket).map_err(persistence)? {
            let Some(bytes) = store.load(&config.bucket, &key).map_err(persistence)? else {
                continue;
            };
            let stored = decode(&key, &bytes)?;
            clock.receive(&stored.clock);
            objects.insert(key, stored.object);
        }

        info!(
            replica = %config.replica_id,
            bucket = %config.bucket,
            objects = objects.len(),
            "replica opened"
        );

        Ok(Self {
            config,
            clock,
            objects,
            store,
        })
    }

    /// The replica's configuration.
    pub fn config(&self) -> &ReplicaConfig {
        &self.config
    }

    /// This replica's id.
    pub fn replica_id(&self) -> &str {
        &self.config.replica_id
    }

    /// Get a reference to the backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Close the replica, returning its backend.
    pub fn into_store(self) -> S {
        self.store
    }

    /// The object stored under `key`, if any.
    pub fn object(&self, key: &TypedKey) -> Option<&Object> {
        self.objects.get(key)
    }

    /// Iterate over the keys holding an object.
    pub fn keys(&self) -> impl Iterator<Item = &TypedKey> {
        self.objects.keys()
    }

    /// Number of top-level objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the replica holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Copy out the full state.
    pub fn export(&self) -> ReplicaState {
        ReplicaState {
            clock: self.clock.last_timestamp(),
            objects: self.objects.clone(),
        }
    }

    /// Merge another replica's state into this one.
    pub fn merge<T: StateStore>(&mut self, other: &Replica<T>) -> Result<()> {
        self.merge_objects(&other.objects, other.clock.last_timestamp())
    }

    /// Merge an exported state into this one.
    pub fn merge_state(&mut self, state: &ReplicaState) -> Result<()> {
        self.merge_objects(&state.objects, state.clock)
    }

    /// Write every object to the backend.
    ///
    /// Only needed when `persist_on_apply` is off.
    pub fn flush(&mut self) -> Result<()> {
        let keys: Vec<TypedKey> = self.objects.keys().cloned().collect();
        self.persist(&keys)
    }

    fn merge_objects(
        &mut self,
        objects: &BTreeMap<TypedKey, Object>,
        remote_clock: HybridTimestamp,
    ) -> Result<()> {
        objects
            .iter()
            .try_for_each(|(key, object)| object.check_kind(key.kind()))?;

        self.clock.receive(&remote_clock);

        let mut backup = Backup::new();
        for (key, theirs) in objects {
            backup.insert(key.clone(), self.objects.get(key).cloned());
            match self.objects.get_mut(key) {
                Some(mine) => mine.merge(theirs),
                None => {
                    self.objects.insert(key.clone(), theirs.clone());
                }
            }
        }

        let touched = backup.len();
        self.finish(backup, Ok(()))?;
        info!(replica = %self.config.replica_id, touched, "merged remote state");
        Ok(())
    }

    fn apply_all(&mut self, updates: &[UpdateOp], backup: &mut Backup) -> Result<()> {
        for update in updates {
            let key = update.key();
            if !backup.contains_key(key) {
                backup.insert(key.clone(), self.objects.get(key).cloned());
            }

            debug!(
                replica = %self.config.replica_id,
                key = %key,
                op = update.operation().name(),
                "apply"
            );

            let object = self
                .objects
                .entry(key.clone())
                .or_insert_with(|| Object::new(key.kind()));
            let mut ctx = OpContext::new(&self.config.replica_id, &mut self.clock);
            object.apply(update.operation(), &mut ctx)?;
        }
        Ok(())
    }

    /// Persist the touched keys, or restore them if `outcome` or the write failed.
    fn finish(&mut self, backup: Backup, outcome: Result<()>) -> Result<()> {
        let outcome = outcome.and_then(|()| {
            if self.config.persist_on_apply {
                let keys: Vec<TypedKey> = backup.keys().cloned().collect();
                self.persist(&keys)
            } else {
                Ok(())
            }
        });

        if let Err(err) = &outcome {
            warn!(
                replica = %self.config.replica_id,
                error = %err,
                touched = backup.len(),
                "rolling back"
            );
            for (key, previous) in backup {
                match previous {
                    Some(object) => {
                        self.objects.insert(key, object);
                    }
                    None => {
                        self.objects.remove(&key);
                    }
                }
            }
        }
        outcome
    }

    fn persist(&mut self, keys: &[TypedKey]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let stamp = self.clock.last_timestamp();
        let mut encoded = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(object) = self.objects.get(key) {
                encoded.push((key, encode(key, object, stamp)?));
            }
        }

        let batch: Vec<(&TypedKey, &[u8])> = encoded
            .iter()
            .map(|(key, bytes)| (*key, bytes.as_slice()))
            .collect();
        self.store
            .save_batch(&self.config.bucket, &batch)
            .map_err(persistence)
    }
}

impl<S: StateStore> StoreClient for Replica<S> {
    fn apply_updates(&mut self, updates: &[UpdateOp]) -> Result<()> {
        for update in updates {
            update.validate()?;
        }

        let mut backup = Backup::new();
        let outcome = self.apply_all(updates, &mut backup);
        self.finish(backup, outcome)
    }

    fn read(&self, key: &TypedKey) -> Result<Value> {
        debug!(replica = %self.config.replica_id, key = %key, "read");
        Ok(self
            .objects
            .get(key)
            .map(Object::value)
            .unwrap_or_else(|| Value::identity(key.kind())))
    }

    fn read_key_in_map(&self, map_key: &MapKey, nested: &TypedKey) -> Result<Value> {
        let map_key = map_key.typed();
        debug!(replica = %self.config.replica_id, key = %map_key, nested = %nested, "read");
        Ok(self
            .objects
            .get(&map_key)
            .and_then(Object::as_map)
            .map(|map| map.get_value(nested))
            .unwrap_or_else(|| Value::identity(nested.kind())))
    }
}

impl<S: StateStore> fmt::Debug for Replica<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replica")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("objects", &self.objects.len())
            .finish()
    }
}

/// Builder for [`Replica`].
///
/// ```
/// use crdt_replica::{MemoryStore, Replica};
///
/// let replica = Replica::builder(MemoryStore::new())
///     .replica_id("edge-1")
///     .bucket("sensors")
///     .open()
///     .unwrap();
/// assert_eq!(replica.replica_id(), "edge-1");
/// ```
pub struct ReplicaBuilder<S> {
    store: S,
    config: ReplicaConfig,
    clock: Option<HybridClock>,
}

impl<S: StateStore> ReplicaBuilder<S> {
    /// Replace the whole configuration.
    pub fn config(mut self, config: ReplicaConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the replica id.
    pub fn replica_id(mut self, id: impl Into<String>) -> Self {
        self.config.replica_id = id.into();
        self
    }

    /// Set the storage bucket.
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.bucket = bucket.into();
        self
    }

    /// Toggle writing touched objects on every apply.
    pub fn persist_on_apply(mut self, enabled: bool) -> Self {
        self.config.persist_on_apply = enabled;
        self
    }

    /// Use a specific clock, e.g. one with a fixed time source in tests.
    pub fn clock(mut self, clock: HybridClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Open the replica, loading any persisted objects.
    pub fn open(self) -> Result<Replica<S>> {
        let clock = self.clock.unwrap_or_default();
        Replica::open_with_clock(self.store, self.config, clock)
    }
}
