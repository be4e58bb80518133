//! Update descriptors.
//!
//! An [`UpdateOp`] says "apply this mutation to the value identified by this
//! key". Leaf descriptors come from the per-kind services; a map descriptor
//! wraps nested descriptors (or a list of keys to remove) under a map key.
//! Descriptors are plain values: building one never touches a store.

use crate::error::{ClientError, Result};
use crate::key::{CrdtKind, TypedKey};

/// A single mutation of one CRDT kind.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    /// Set an integer to an absolute value.
    AssignInteger(i64),
    /// Add a (possibly negative) delta to an integer.
    IncrementInteger(i64),
    /// Add a (possibly negative) delta to a counter.
    IncrementCounter(i64),
    /// Add elements to a set.
    AddElements(Vec<String>),
    /// Remove the observed instances of elements from a set.
    RemoveElements(Vec<String>),
    /// Overwrite a register.
    AssignRegister(String),
    /// Apply nested descriptors to entries of an add-wins map.
    UpdateMap(Vec<UpdateOp>),
    /// Remove entries from an add-wins map.
    RemoveKeys(Vec<TypedKey>),
}

impl Operation {
    /// The kind of key this operation applies to.
    pub fn target_kind(&self) -> CrdtKind {
        match self {
            Self::AssignInteger(_) | Self::IncrementInteger(_) => CrdtKind::Integer,
            Self::IncrementCounter(_) => CrdtKind::Counter,
            Self::AddElements(_) | Self::RemoveElements(_) => CrdtKind::Set,
            Self::AssignRegister(_) => CrdtKind::Register,
            Self::UpdateMap(_) | Self::RemoveKeys(_) => CrdtKind::Map,
        }
    }

    /// Short operation name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AssignInteger(_) => "assign_integer",
            Self::IncrementInteger(_) => "increment_integer",
            Self::IncrementCounter(_) => "increment_counter",
            Self::AddElements(_) => "add_elements",
            Self::RemoveElements(_) => "remove_elements",
            Self::AssignRegister(_) => "assign_register",
            Self::UpdateMap(_) => "update_map",
            Self::RemoveKeys(_) => "remove_keys",
        }
    }
}

/// An immutable, composable update descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpdateOp {
    key: TypedKey,
    operation: Operation,
}

impl UpdateOp {
    /// Build a descriptor from its runtime parts.
    ///
    /// Fails with `TypeMismatch` when `operation` does not apply to the
    /// key's kind (including nested descriptors and removal keys being
    /// checked recursively), and with `EmptyUpdate` when a map operation
    /// has no operands.
    pub fn new(key: TypedKey, operation: Operation) -> Result<Self> {
        key.expect_kind(operation.target_kind())?;
        match &operation {
            Operation::UpdateMap(ops) => {
                if ops.is_empty() {
                    return Err(ClientError::EmptyUpdate);
                }
                for op in ops {
                    op.validate()?;
                }
            }
            Operation::RemoveKeys(keys) if keys.is_empty() => {
                return Err(ClientError::EmptyUpdate);
            }
            _ => {}
        }
        Ok(Self { key, operation })
    }

    /// Builders on typed keys already guarantee the kind matches.
    pub(crate) fn from_typed(key: TypedKey, operation: Operation) -> Self {
        debug_assert_eq!(key.kind(), operation.target_kind());
        Self { key, operation }
    }

    /// Re-check a descriptor that may have been deserialized from elsewhere.
    pub fn validate(&self) -> Result<()> {
        Self::new(self.key.clone(), self.operation.clone()).map(|_| ())
    }

    /// The key this descriptor targets.
    #[must_use]
    pub fn key(&self) -> &TypedKey {
        &self.key
    }

    /// The mutation to apply.
    #[must_use]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Split into key and operation.
    pub fn into_parts(self) -> (TypedKey, Operation) {
        (self.key, self.operation)
    }

    /// Number of leaf mutations carried, counting each removed key once.
    pub fn leaf_count(&self) -> usize {
        match &self.operation {
            Operation::UpdateMap(ops) => ops.iter().map(UpdateOp::leaf_count).sum(),
            Operation::RemoveKeys(keys) => keys.len(),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str, kind: CrdtKind) -> TypedKey {
        TypedKey::new(name, kind).unwrap()
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let err = UpdateOp::new(
            key("x", CrdtKind::Counter),
            Operation::AssignInteger(1),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ClientError::TypeMismatch {
                expected: CrdtKind::Integer,
                found: CrdtKind::Counter,
            }
        );
    }

    #[test]
    fn empty_map_operations_are_rejected() {
        let map = key("m", CrdtKind::Map);
        assert_eq!(
            UpdateOp::new(map.clone(), Operation::UpdateMap(vec![])).unwrap_err(),
            ClientError::EmptyUpdate
        );
        assert_eq!(
            UpdateOp::new(map, Operation::RemoveKeys(vec![])).unwrap_err(),
            ClientError::EmptyUpdate
        );
    }

    #[test]
    fn nested_descriptors_are_checked() {
        let bad = UpdateOp {
            key: key("y", CrdtKind::Register),
            operation: Operation::IncrementCounter(1),
        };
        let err = UpdateOp::new(key("m", CrdtKind::Map), Operation::UpdateMap(vec![bad]));
        assert!(matches!(err, Err(ClientError::TypeMismatch { .. })));
    }

    #[test]
    fn leaf_count_walks_nested_maps() {
        let inner = UpdateOp::new(
            key("inner", CrdtKind::Map),
            Operation::UpdateMap(vec![
                UpdateOp::new(key("a", CrdtKind::Integer), Operation::AssignInteger(1)).unwrap(),
                UpdateOp::new(key("b", CrdtKind::Counter), Operation::IncrementCounter(2))
                    .unwrap(),
            ]),
        )
        .unwrap();
        let outer = UpdateOp::new(
            key("outer", CrdtKind::Map),
            Operation::UpdateMap(vec![
                inner,
                UpdateOp::new(key("c", CrdtKind::Register), Operation::AssignRegister("v".into()))
                    .unwrap(),
            ]),
        )
        .unwrap();
        assert_eq!(outer.leaf_count(), 3);
        assert_eq!(outer.operation().name(), "update_map");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialized_descriptor_is_revalidated() {
        let json = r#"{"key":{"name":"x","kind":"Counter"},"operation":{"AssignRegister":"v"}}"#;
        let op: UpdateOp = serde_json::from_str(json).unwrap();
        assert!(matches!(
            op.validate(),
            Err(ClientError::TypeMismatch { .. })
        ));

        let good = UpdateOp::new(key("x", CrdtKind::Counter), Operation::IncrementCounter(2)).unwrap();
        let back: UpdateOp = serde_json::from_str(&serde_json::to_string(&good).unwrap()).unwrap();
        assert_eq!(back, good);
    }
}
