use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Crdt;

/// Per-replica grow-only totals. The value is the sum across replicas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GCounter {
    counts: BTreeMap<String, u64>,
}

impl GCounter {
    /// Create a zero counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment `replica`'s count by `n`.
    pub fn increment_by(&mut self, replica: &str, n: u64) {
        let entry = self.counts.entry(replica.to_string()).or_insert(0);
        *entry = entry.saturating_add(n);
    }

    /// Total across all replicas.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.counts
            .values()
            .fold(0u64, |acc, c| acc.saturating_add(*c))
    }

    /// Total of what each replica counted beyond `floor`.
    #[must_use]
    pub fn value_above(&self, floor: &GCounter) -> u64 {
        self.counts.iter().fold(0u64, |acc, (replica, c)| {
            acc.saturating_add(c.saturating_sub(floor.count_for(replica)))
        })
    }

    /// Count contributed by one replica.
    #[must_use]
    pub fn count_for(&self, replica: &str) -> u64 {
        self.counts.get(replica).copied().unwrap_or(0)
    }
}

impl Crdt for GCounter {
    fn merge(&mut self, other: &Self) {
        for (replica, &count) in &other.counts {
            let entry = self.counts.entry(replica.clone()).or_insert(0);
            *entry = (*entry).max(count);
        }
    }
}

/// A positive-negative counter (PN-Counter).
///
/// Two grow-only counters, one for increments and one for decrements.
/// Concurrent deltas from different replicas are summed on merge.
/// [`PnCounter::reset`] records the observed totals as a floor, so only
/// deltas made after (or concurrently with) the reset still count.
///
/// # Example
///
/// ```
/// use crdt_replica::{Crdt, PnCounter};
///
/// let mut c1 = PnCounter::new();
/// c1.add("node-1", 3);
///
/// let mut c2 = PnCounter::new();
/// c2.add("node-2", -1);
///
/// c1.merge(&c2);
/// assert_eq!(c1.value(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnCounter {
    increments: GCounter,
    decrements: GCounter,
    floor_increments: GCounter,
    floor_decrements: GCounter,
}

impl PnCounter {
    /// Create a zero counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a signed delta on behalf of `replica`.
    pub fn add(&mut self, replica: &str, delta: i64) {
        if delta >= 0 {
            self.increments.increment_by(replica, delta.unsigned_abs());
        } else {
            self.decrements.increment_by(replica, delta.unsigned_abs());
        }
    }

    /// Current value (increments - decrements), above the reset floor.
    #[must_use]
    pub fn value(&self) -> i64 {
        let up = self.increments.value_above(&self.floor_increments);
        let down = self.decrements.value_above(&self.floor_decrements);
        (up as i64).wrapping_sub(down as i64)
    }

    /// Bring the counter back to zero, discarding every observed delta.
    pub fn reset(&mut self) {
        self.floor_increments = self.increments.clone();
        self.floor_decrements = self.decrements.clone();
    }
}

impl Crdt for PnCounter {
    fn merge(&mut self, other: &Self) {
        self.increments.merge(&other.increments);
        self.decrements.merge(&other.decrements);
        self.floor_increments.merge(&other.floor_increments);
        self.floor_decrements.merge(&other.floor_decrements);
    }
}
