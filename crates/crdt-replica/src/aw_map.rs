use std::collections::{BTreeMap, BTreeSet};

use crdt_client::{Operation, Result, TypedKey, Value};
use serde::{Deserialize, Serialize};

use crate::clock::Dot;
use crate::object::{Object, OpContext};
use crate::Crdt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Entry {
    /// dots of the updates that (re)created or touched this entry
    dots: BTreeSet<Dot>,
    value: Object,
}

impl Entry {
    fn is_live(&self) -> bool {
        !self.dots.is_empty()
    }
}

/// An add-wins map from typed keys to nested CRDT values.
///
/// Every update of an entry adds a dot to it, and an entry is present while
/// it holds a dot nobody has removed. Removing an entry tombstones the dots
/// observed at that moment and resets the nested value, which discards the
/// state the remover saw. An update made concurrently on another replica
/// carries a dot the remover never saw, so the entry survives the merge with
/// that update's contribution only. A re-added entry starts from its kind's
/// identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwMap {
    entries: BTreeMap<TypedKey, Entry>,
    tombstones: BTreeSet<Dot>,
}

impl AwMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `operation` to the entry at `key`, creating it if absent.
    pub fn update(
        &mut self,
        key: &TypedKey,
        operation: &Operation,
        ctx: &mut OpContext<'_>,
    ) -> Result<()> {
        let entry = self.entries.entry(key.clone()).or_insert_with(|| Entry {
            dots: BTreeSet::new(),
            value: Object::new(key.kind()),
        });
        entry.value.apply(operation, ctx)?;
        entry.dots.insert(ctx.next_dot());
        Ok(())
    }

    /// Remove the entry at `key`. Returns `false` if it was absent.
    pub fn remove(&mut self, key: &TypedKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if entry.is_live() => {
                self.tombstones.append(&mut entry.dots);
                entry.value.reset();
                true
            }
            _ => false,
        }
    }

    /// Remove every present entry.
    pub fn reset(&mut self) {
        for entry in self.entries.values_mut().filter(|entry| entry.is_live()) {
            self.tombstones.append(&mut entry.dots);
            entry.value.reset();
        }
    }

    /// Check if an entry is present.
    #[must_use]
    pub fn contains_key(&self, key: &TypedKey) -> bool {
        self.get(key).is_some()
    }

    /// The nested object at `key`, if present.
    pub fn get(&self, key: &TypedKey) -> Option<&Object> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_live())
            .map(|entry| &entry.value)
    }

    /// The value at `key`, or the identity of its kind if absent.
    pub fn get_value(&self, key: &TypedKey) -> Value {
        self.get(key)
            .map(Object::value)
            .unwrap_or_else(|| Value::identity(key.kind()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live().count()
    }

    /// Check if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live().next().is_none()
    }

    /// Iterate over the present keys.
    pub fn keys(&self) -> impl Iterator<Item = &TypedKey> {
        self.live().map(|(key, _)| key)
    }

    /// All entries as client values.
    pub fn values(&self) -> BTreeMap<TypedKey, Value> {
        self.live()
            .map(|(key, entry)| (key.clone(), entry.value.value()))
            .collect()
    }

    /// Check that every nested object, present or removed, matches the kind
    /// of its key.
    pub fn check_kinds(&self) -> Result<()> {
        self.entries
            .iter()
            .try_for_each(|(key, entry)| entry.value.check_kind(key.kind()))
    }

    fn live(&self) -> impl Iterator<Item = (&TypedKey, &Entry)> {
        self.entries.iter().filter(|(_, entry)| entry.is_live())
    }
}

impl Crdt for AwMap {
    fn merge(&mut self, other: &Self) {
        for (key, theirs) in &other.entries {
            match self.entries.get_mut(key) {
                Some(mine) => {
                    mine.value.merge(&theirs.value);
                    mine.dots.extend(theirs.dots.iter().cloned());
                }
                None => {
                    self.entries.insert(key.clone(), theirs.clone());
                }
            }
        }

        self.tombstones.extend(other.tombstones.iter().cloned());
        let tombstones = &self.tombstones;
        for entry in self.entries.values_mut() {
            entry.dots.retain(|dot| !tombstones.contains(dot));
        }
    }
}
