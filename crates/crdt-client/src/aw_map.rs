use crate::error::{ClientError, Result};
use crate::key::{MapKey, MapKind, TypedKey};
use crate::service::CrdtService;
use crate::update::{Operation, UpdateOp};

/// Builds keys and updates for add-wins maps.
///
/// A map update wraps descriptors produced by any service, each already
/// tagged with the nested key it was built for. The whole update is one
/// descriptor, so the store applies every nested entry in one submission.
///
/// # Example
///
/// ```
/// use crdt_client::{AwMapService, CounterService, CrdtService, IntegerService};
///
/// let maps = AwMapService::new();
/// let ints = IntegerService::new();
/// let counters = CounterService::new();
///
/// let m = maps.get_key("key2").unwrap();
/// let y = ints.get_key("y").unwrap();
/// let z = counters.get_key("z").unwrap();
///
/// let update = maps
///     .update_map(&m, [ints.assign_integer(&y, 1), counters.increment_counter(&z, 3)])
///     .unwrap();
/// assert_eq!(update.leaf_count(), 2);
///
/// let removal = maps.remove_key(&m, [y.typed(), z.typed()]).unwrap();
/// assert_eq!(removal.leaf_count(), 2);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AwMapService;

impl AwMapService {
    /// Create the service.
    pub fn new() -> Self {
        Self
    }

    /// Compose nested descriptors into one update of the map at `map_key`.
    ///
    /// Entries are independent, so the order of `ops` has no observable
    /// effect unless two of them target the same nested key. Fails with
    /// `EmptyUpdate` when `ops` is empty.
    pub fn update_map<I>(&self, map_key: &MapKey, ops: I) -> Result<UpdateOp>
    where
        I: IntoIterator<Item = UpdateOp>,
    {
        let ops: Vec<UpdateOp> = ops.into_iter().collect();
        if ops.is_empty() {
            return Err(ClientError::EmptyUpdate);
        }
        Ok(UpdateOp::from_typed(
            map_key.typed(),
            Operation::UpdateMap(ops),
        ))
    }

    /// Remove one or more entries from the map at `map_key`.
    ///
    /// Keys that are not present are ignored when the update is applied.
    /// Fails with `EmptyUpdate` when `keys` is empty.
    pub fn remove_key<I, K>(&self, map_key: &MapKey, keys: I) -> Result<UpdateOp>
    where
        I: IntoIterator<Item = K>,
        K: Into<TypedKey>,
    {
        let keys: Vec<TypedKey> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(ClientError::EmptyUpdate);
        }
        Ok(UpdateOp::from_typed(
            map_key.typed(),
            Operation::RemoveKeys(keys),
        ))
    }
}

impl CrdtService for AwMapService {
    type Kind = MapKind;
}
