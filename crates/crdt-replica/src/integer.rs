use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clock::Dot;
use crate::lww_register::LwwRegister;
use crate::Crdt;

/// Increments one replica made on top of a particular assigned base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Increments {
    base: Option<Dot>,
    up: u64,
    down: u64,
}

impl Increments {
    fn net_above(&self, floor: Option<&Increments>) -> i64 {
        let (up, down) = match floor {
            Some(floor) if floor.base == self.base => (
                self.up.saturating_sub(floor.up),
                self.down.saturating_sub(floor.down),
            ),
            _ => (self.up, self.down),
        };
        (up as i64).wrapping_sub(down as i64)
    }

    fn join(&mut self, other: &Increments) {
        if self.base == other.base {
            self.up = self.up.max(other.up);
            self.down = self.down.max(other.down);
        } else if self.base < other.base {
            *self = other.clone();
        }
    }
}

/// What a reset observed: the winning base and each replica's increments on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Floor {
    base: Option<Dot>,
    increments: BTreeMap<String, Increments>,
}

impl Floor {
    fn merge(&mut self, other: &Floor) {
        if other.base > self.base {
            *self = other.clone();
        } else if other.base == self.base {
            for (replica, theirs) in &other.increments {
                match self.increments.get_mut(replica) {
                    Some(mine) => mine.join(theirs),
                    None => {
                        self.increments.insert(replica.clone(), theirs.clone());
                    }
                }
            }
        }
    }
}

/// An integer supporting both absolute assignment and relative increments.
///
/// The assigned base is a last-writer-wins register. Each replica's
/// increments are tagged with the base they were applied to, and only
/// increments on top of the winning base count. An assign therefore
/// discards increments it did not observe. A reset zeroes the observed
/// base and increments while keeping later ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerCrdt {
    base: LwwRegister<i64>,
    increments: BTreeMap<String, Increments>,
    floor: Floor,
}

impl IntegerCrdt {
    /// Create a zero integer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the integer to `value`.
    pub fn assign(&mut self, value: i64, dot: Dot) {
        if self.base.assign(value, dot) {
            self.prune();
        }
    }

    /// Add `delta` on behalf of `replica`.
    pub fn increment(&mut self, replica: &str, delta: i64) {
        let base = self.base.stamp().cloned();
        let entry = self.increments.entry(replica.to_string()).or_default();
        if entry.base != base {
            *entry = Increments {
                base,
                up: 0,
                down: 0,
            };
        }
        if delta >= 0 {
            entry.up = entry.up.saturating_add(delta.unsigned_abs());
        } else {
            entry.down = entry.down.saturating_add(delta.unsigned_abs());
        }
    }

    /// Current value: the winning base plus the increments made on it,
    /// less whatever a reset observed.
    #[must_use]
    pub fn value(&self) -> i64 {
        let base = self.base.stamp();
        let floored = self.floor.base.as_ref() == base;
        let start = if floored { 0 } else { *self.base.value() };
        self.increments
            .iter()
            .filter(|(_, inc)| inc.base.as_ref() == base)
            .fold(start, |acc, (replica, inc)| {
                let floor = self.floor.increments.get(replica).filter(|_| floored);
                acc.wrapping_add(inc.net_above(floor))
            })
    }

    /// Bring the integer back to zero, discarding the observed base and
    /// increments.
    pub fn reset(&mut self) {
        self.floor = Floor {
            base: self.base.stamp().cloned(),
            increments: self.increments.clone(),
        };
    }

    fn prune(&mut self) {
        let base = self.base.stamp().cloned();
        self.increments.retain(|_, inc| inc.base == base);
    }
}

impl Crdt for IntegerCrdt {
    fn merge(&mut self, other: &Self) {
        self.base.merge(&other.base);

        for (replica, theirs) in &other.increments {
            match self.increments.get_mut(replica) {
                Some(mine) => mine.join(theirs),
                None => {
                    self.increments.insert(replica.clone(), theirs.clone());
                }
            }
        }
        self.floor.merge(&other.floor);

        self.prune();
    }
}
