use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::clock::Dot;
use crate::Crdt;

/// An observed-remove set (OR-Set), also known as an add-wins set.
///
/// Each insertion is tagged with the [`Dot`] of the mutation that made it.
/// Remove only drops the tags the remover has observed, so an insertion
/// racing with a remove on another replica survives the merge.
///
/// # Example
///
/// ```
/// use crdt_replica::clock::{Dot, HybridTimestamp};
/// use crdt_replica::{Crdt, OrSet};
///
/// let ts = |ms| HybridTimestamp { physical: ms, logical: 0 };
///
/// let mut s1 = OrSet::new();
/// s1.insert("banana", Dot::new("node-1", ts(1)));
/// s1.remove("banana");
///
/// let mut s2 = OrSet::new();
/// s2.insert("banana", Dot::new("node-2", ts(1))); // concurrent add
///
/// s1.merge(&s2);
/// assert!(s1.contains("banana"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrSet {
    /// element -> tags of the insertions still alive
    elements: BTreeMap<String, BTreeSet<Dot>>,
    /// tags that have been removed
    tombstones: BTreeSet<Dot>,
}

impl OrSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element under a fresh tag.
    ///
    /// Re-adding a previously removed element works because the new tag
    /// was never observed by the earlier remove.
    pub fn insert(&mut self, value: impl Into<String>, dot: Dot) {
        self.elements.entry(value.into()).or_default().insert(dot);
    }

    /// Remove an element's observed tags.
    ///
    /// Returns `true` if the element was present.
    pub fn remove(&mut self, value: &str) -> bool {
        if let Some(tags) = self.elements.remove(value) {
            self.tombstones.extend(tags);
            true
        } else {
            false
        }
    }

    /// Remove every element, tombstoning all observed tags.
    pub fn reset(&mut self) {
        for (_, tags) in std::mem::take(&mut self.elements) {
            self.tombstones.extend(tags);
        }
    }

    /// Check if the set contains an element.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.elements
            .get(value)
            .is_some_and(|tags| !tags.is_empty())
    }

    /// Number of distinct elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the elements in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.elements
            .iter()
            .filter(|(_, tags)| !tags.is_empty())
            .map(|(v, _)| v)
    }
}

impl Crdt for OrSet {
    fn merge(&mut self, other: &Self) {
        for (value, other_tags) in &other.elements {
            let self_tags = self.elements.entry(value.clone()).or_default();
            for tag in other_tags {
                if !self.tombstones.contains(tag) {
                    self_tags.insert(tag.clone());
                }
            }
        }

        for tag in &other.tombstones {
            for tags in self.elements.values_mut() {
                tags.remove(tag);
            }
        }

        self.tombstones.extend(other.tombstones.iter().cloned());
        self.elements.retain(|_, tags| !tags.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::HybridTimestamp;

    fn dot(replica: &str, ms: u64) -> Dot {
        Dot::new(
            replica,
            HybridTimestamp {
                physical: ms,
                logical: 0,
            },
        )
    }

    #[test]
    fn new_set_is_empty() {
        let s = OrSet::new();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn insert_and_remove() {
        let mut s = OrSet::new();
        s.insert("x", dot("a", 1));
        assert!(s.contains("x"));
        assert!(s.remove("x"));
        assert!(!s.contains("x"));
        assert!(!s.remove("x"));
    }

    #[test]
    fn can_readd_after_remove() {
        let mut s = OrSet::new();
        s.insert("x", dot("a", 1));
        s.remove("x");
        s.insert("x", dot("a", 2));
        assert!(s.contains("x"));
    }

    #[test]
    fn remove_propagates_through_merge() {
        let mut s1 = OrSet::new();
        s1.insert("x", dot("a", 1));
        let mut s2 = s1.clone();

        s2.remove("x");
        s1.merge(&s2);
        assert!(!s1.contains("x"));
    }

    #[test]
    fn concurrent_add_survives_remove() {
        let mut s1 = OrSet::new();
        s1.insert("x", dot("a", 1));
        let mut s2 = s1.clone();

        s1.remove("x");
        s2.insert("x", dot("b", 2));

        s1.merge(&s2);
        assert!(s1.contains("x"));
    }

    #[test]
    fn reset_drops_observed_elements_only() {
        let mut s1 = OrSet::new();
        s1.insert("x", dot("a", 1));
        s1.insert("y", dot("a", 2));
        let mut s2 = s1.clone();

        s1.reset();
        assert!(s1.is_empty());
        s2.insert("z", dot("b", 3));

        s1.merge(&s2);
        assert_eq!(s1.iter().collect::<Vec<_>>(), vec!["z"]);
    }

    #[test]
    fn merge_is_commutative_and_idempotent() {
        let mut s1 = OrSet::new();
        s1.insert("x", dot("a", 1));
        s1.insert("y", dot("a", 2));

        let mut s2 = OrSet::new();
        s2.insert("y", dot("b", 1));
        s2.insert("z", dot("b", 2));
        s2.remove("y");

        let mut left = s1.clone();
        left.merge(&s2);
        let mut right = s2.clone();
        right.merge(&s1);

        let l: Vec<_> = left.iter().collect();
        let r: Vec<_> = right.iter().collect();
        assert_eq!(l, r);

        let snapshot = left.clone();
        left.merge(&s2);
        assert_eq!(left, snapshot);
    }

    #[test]
    fn iterates_in_order() {
        let mut s = OrSet::new();
        s.insert("c", dot("a", 1));
        s.insert("a", dot("a", 2));
        s.insert("b", dot("a", 3));
        s.remove("b");
        let elems: Vec<&String> = s.iter().collect();
        assert_eq!(elems, vec!["a", "c"]);
    }
}
