use crate::key::{CounterKey, CounterKind};
use crate::service::CrdtService;
use crate::update::{Operation, UpdateOp};

/// Builds updates for counter keys.
///
/// Increments commute: concurrent deltas from different replicas are summed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterService;

impl CounterService {
    /// Create the service.
    pub fn new() -> Self {
        Self
    }

    /// Add `delta` to the counter. Negative deltas decrement.
    pub fn increment_counter(&self, key: &CounterKey, delta: i64) -> UpdateOp {
        UpdateOp::from_typed(key.typed(), Operation::IncrementCounter(delta))
    }

    /// Subtract `amount` from the counter.
    pub fn decrement_counter(&self, key: &CounterKey, amount: u32) -> UpdateOp {
        self.increment_counter(key, -i64::from(amount))
    }
}

impl CrdtService for CounterService {
    type Kind = CounterKind;
}
