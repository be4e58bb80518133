use crate::key::{IntegerKey, IntegerKind};
use crate::service::CrdtService;
use crate::update::{Operation, UpdateOp};

/// Builds updates for integer keys.
///
/// # Example
///
/// ```
/// use crdt_client::{CrdtService, IntegerService, Operation};
///
/// let ints = IntegerService::new();
/// let x = ints.get_key("x").unwrap();
/// let op = ints.assign_integer(&x, 1);
/// assert_eq!(op.operation(), &Operation::AssignInteger(1));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerService;

impl IntegerService {
    /// Create the service.
    pub fn new() -> Self {
        Self
    }

    /// Set the integer to `value`.
    ///
    /// Concurrent assigns from other replicas are resolved by the store.
    pub fn assign_integer(&self, key: &IntegerKey, value: i64) -> UpdateOp {
        UpdateOp::from_typed(key.typed(), Operation::AssignInteger(value))
    }

    /// Add `delta` to the integer.
    pub fn increment_integer(&self, key: &IntegerKey, delta: i64) -> UpdateOp {
        UpdateOp::from_typed(key.typed(), Operation::IncrementInteger(delta))
    }
}

impl CrdtService for IntegerService {
    type Kind = IntegerKind;
}
