use serde::{Deserialize, Serialize};

use crate::clock::Dot;
use crate::Crdt;

/// A last-writer-wins register (LWW-Register).
///
/// Keeps the value written under the greatest [`Dot`]: highest timestamp,
/// then highest replica id. An unwritten register holds `T::default()`.
/// After [`LwwRegister::reset`], writes stamped at or before the cleared
/// stamp are ignored.
///
/// # Example
///
/// ```
/// use crdt_replica::clock::{Dot, HybridTimestamp};
/// use crdt_replica::{Crdt, LwwRegister};
///
/// let ts = |ms| HybridTimestamp { physical: ms, logical: 0 };
///
/// let mut r1 = LwwRegister::new();
/// r1.assign("hello".to_string(), Dot::new("node-1", ts(1)));
///
/// let mut r2 = LwwRegister::new();
/// r2.assign("world".to_string(), Dot::new("node-2", ts(2)));
///
/// r1.merge(&r2);
/// assert_eq!(r1.value(), "world");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwRegister<T> {
    value: T,
    stamp: Option<Dot>,
    cleared: Option<Dot>,
}

impl<T: Clone + Default> LwwRegister<T> {
    /// Create an unwritten register.
    pub fn new() -> Self {
        Self {
            value: T::default(),
            stamp: None,
            cleared: None,
        }
    }

    /// Write `value` if `dot` is newer than the current and cleared stamps.
    ///
    /// Returns whether the write took effect.
    pub fn assign(&mut self, value: T, dot: Dot) -> bool {
        let newer = |bound: &Option<Dot>| bound.as_ref().map_or(true, |current| dot > *current);
        if newer(&self.stamp) && newer(&self.cleared) {
            self.value = value;
            self.stamp = Some(dot);
            true
        } else {
            false
        }
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Clear the register back to `T::default()`.
    pub fn reset(&mut self) {
        if let Some(stamp) = self.stamp.take() {
            self.cleared = self.cleared.take().max(Some(stamp));
        }
        self.value = T::default();
    }

    /// Stamp of the winning write, `None` if never written.
    #[must_use]
    pub fn stamp(&self) -> Option<&Dot> {
        self.stamp.as_ref()
    }
}

impl<T: Clone + Default> Crdt for LwwRegister<T> {
    fn merge(&mut self, other: &Self) {
        if other.cleared > self.cleared {
            self.cleared = other.cleared.clone();
            if self.stamp <= self.cleared {
                self.stamp = None;
                self.value = T::default();
            }
        }
        if let Some(dot) = &other.stamp {
            self.assign(other.value.clone(), dot.clone());
        }
    }
}
