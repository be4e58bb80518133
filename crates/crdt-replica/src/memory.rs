use std::collections::BTreeMap;
use std::convert::Infallible;

use crdt_client::TypedKey;

use crate::traits::StateStore;

/// In-memory backend: one ordered map of framed objects per bucket.
///
/// Nothing touches disk, so a replica over a `MemoryStore` forgets
/// everything when the store is dropped. Cloning the store and reopening a
/// replica over the clone behaves like a restart.
///
/// # Example
///
/// ```
/// use crdt_client::{CrdtKind, TypedKey};
/// use crdt_replica::{MemoryStore, StateStore};
///
/// let hits = TypedKey::new("hits", CrdtKind::Counter).unwrap();
/// let mut store = MemoryStore::new();
/// store.save_batch("default", &[(&hits, b"\xCF\x01\x02".as_slice())]).unwrap();
///
/// assert_eq!(store.keys("default").unwrap(), vec![hits.clone()]);
/// assert_eq!(store.load("default", &hits).unwrap().unwrap(), b"\xCF\x01\x02");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    buckets: BTreeMap<String, BTreeMap<TypedKey, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saved objects across all buckets.
    pub fn state_count(&self) -> usize {
        self.buckets.values().map(BTreeMap::len).sum()
    }
}

impl StateStore for MemoryStore {
    type Error = Infallible;

    fn keys(&self, bucket: &str) -> Result<Vec<TypedKey>, Self::Error> {
        Ok(self
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn load(&self, bucket: &str, key: &TypedKey) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned())
    }

    fn save_batch(
        &mut self,
        bucket: &str,
        objects: &[(&TypedKey, &[u8])],
    ) -> Result<(), Self::Error> {
        let stored = self.buckets.entry(bucket.to_string()).or_default();
        for (key, bytes) in objects {
            stored.insert((*key).clone(), bytes.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crdt_client::CrdtKind;

    fn key(name: &str, kind: CrdtKind) -> TypedKey {
        TypedKey::new(name, kind).unwrap()
    }

    #[test]
    fn save_overwrites_and_load_reads_back() {
        let mut store = MemoryStore::new();
        let n = key("n", CrdtKind::Integer);

        store.save_batch("b", &[(&n, b"old".as_slice())]).unwrap();
        store.save_batch("b", &[(&n, b"new".as_slice())]).unwrap();

        assert_eq!(store.load("b", &n).unwrap(), Some(b"new".to_vec()));
        assert_eq!(store.state_count(), 1);
    }

    #[test]
    fn same_name_under_two_kinds_is_two_objects() {
        let mut store = MemoryStore::new();
        let as_set = key("x", CrdtKind::Set);
        let as_counter = key("x", CrdtKind::Counter);

        store
            .save_batch("b", &[(&as_set, b"1".as_slice()), (&as_counter, b"2".as_slice())])
            .unwrap();

        assert_eq!(store.keys("b").unwrap().len(), 2);
        assert_eq!(store.load("b", &as_counter).unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn buckets_are_isolated() {
        let mut store = MemoryStore::new();
        let k = key("k", CrdtKind::Register);
        store.save_batch("a", &[(&k, b"1".as_slice())]).unwrap();

        assert_eq!(store.load("other", &k).unwrap(), None);
        assert!(store.keys("other").unwrap().is_empty());
    }
}
