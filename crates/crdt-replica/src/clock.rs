//! Hybrid Logical Clock (HLC) and the dots it mints.
//!
//! Every mutation a replica performs is stamped with a [`Dot`]: the
//! replica's id plus a timestamp from its [`HybridClock`]. Dots are unique
//! per replica and totally ordered, which makes them usable both as
//! observed-remove tags and as last-writer-wins stamps.
//!
//! # Example
//!
//! ```
//! use crdt_replica::clock::{HybridClock, HybridTimestamp};
//!
//! let mut clock = HybridClock::new();
//! let ts1 = clock.now();
//! let ts2 = clock.now();
//! assert!(ts2 > ts1);
//!
//! let remote = HybridTimestamp { physical: ts2.physical + 1000, logical: 0 };
//! let ts3 = clock.receive(&remote);
//! assert!(ts3 > remote);
//! ```

use core::cmp;

use serde::{Deserialize, Serialize};

/// A timestamp from a Hybrid Logical Clock.
///
/// `physical` is milliseconds since the Unix epoch (or any monotonic
/// source); `logical` orders events within the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HybridTimestamp {
    /// Physical time component (milliseconds).
    pub physical: u64,
    /// Logical counter for same-millisecond ordering.
    pub logical: u32,
}

impl HybridTimestamp {
    /// Create a zero timestamp.
    pub fn zero() -> Self {
        Self::default()
    }
}

impl Ord for HybridTimestamp {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.physical
            .cmp(&other.physical)
            .then(self.logical.cmp(&other.logical))
    }
}

impl PartialOrd for HybridTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A unique, totally ordered mutation stamp.
///
/// Ordered by timestamp first, replica id second, so two replicas writing
/// in the same instant still resolve deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dot {
    /// When the mutation happened.
    pub ts: HybridTimestamp,
    /// Which replica performed it.
    pub replica: String,
}

impl Dot {
    /// Create a dot.
    pub fn new(replica: impl Into<String>, ts: HybridTimestamp) -> Self {
        Self {
            ts,
            replica: replica.into(),
        }
    }
}

/// A Hybrid Logical Clock for one replica.
#[derive(Clone)]
pub struct HybridClock {
    last: HybridTimestamp,
    /// Milliseconds source. Defaults to `SystemTime`.
    physical_time_fn: fn() -> u64,
}

fn system_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl HybridClock {
    /// Create a clock driven by `SystemTime`.
    pub fn new() -> Self {
        Self::with_time_source(system_time_ms)
    }

    /// Create a clock with a custom physical time source in milliseconds.
    pub fn with_time_source(time_fn: fn() -> u64) -> Self {
        Self {
            last: HybridTimestamp::zero(),
            physical_time_fn: time_fn,
        }
    }

    /// Generate a timestamp for a local event.
    ///
    /// Strictly increasing even if the physical clock goes backward.
    pub fn now(&mut self) -> HybridTimestamp {
        let pt = (self.physical_time_fn)();

        self.last = if pt > self.last.physical {
            HybridTimestamp {
                physical: pt,
                logical: 0,
            }
        } else {
            HybridTimestamp {
                physical: self.last.physical,
                logical: self.last.logical + 1,
            }
        };

        self.last
    }

    /// Update the clock upon observing a remote timestamp.
    ///
    /// Returns a timestamp strictly greater than both the local clock and
    /// `remote`.
    pub fn receive(&mut self, remote: &HybridTimestamp) -> HybridTimestamp {
        let pt = (self.physical_time_fn)();
        let max_pt = cmp::max(cmp::max(pt, self.last.physical), remote.physical);

        let logical = if max_pt == self.last.physical && max_pt == remote.physical {
            cmp::max(self.last.logical, remote.logical) + 1
        } else if max_pt == self.last.physical {
            self.last.logical + 1
        } else if max_pt == remote.physical {
            remote.logical + 1
        } else {
            0
        };

        self.last = HybridTimestamp {
            physical: max_pt,
            logical,
        };

        self.last
    }

    /// Get the last generated timestamp.
    pub fn last_timestamp(&self) -> HybridTimestamp {
        self.last
    }
}

impl Default for HybridClock {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for HybridClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HybridClock")
            .field("last", &self.last)
            .finish()
    }
}
