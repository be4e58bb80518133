use std::collections::BTreeMap;

use crate::key::{CrdtKind, TypedKey};

/// A merged value read back from a store.
///
/// The variant is determined by the kind of the key that was read.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Integer value.
    Integer(i64),
    /// Counter value.
    Counter(i64),
    /// Set elements in ascending order.
    Set(Vec<String>),
    /// Register contents.
    Register(String),
    /// Entries of an add-wins map.
    Map(BTreeMap<TypedKey, Value>),
}

impl Value {
    /// The identity value of a kind: what a never-written key reads as.
    pub fn identity(kind: CrdtKind) -> Self {
        match kind {
            CrdtKind::Integer => Self::Integer(0),
            CrdtKind::Counter => Self::Counter(0),
            CrdtKind::Set => Self::Set(Vec::new()),
            CrdtKind::Register => Self::Register(String::new()),
            CrdtKind::Map => Self::Map(BTreeMap::new()),
        }
    }

    /// The kind this value belongs to.
    pub fn kind(&self) -> CrdtKind {
        match self {
            Self::Integer(_) => CrdtKind::Integer,
            Self::Counter(_) => CrdtKind::Counter,
            Self::Set(_) => CrdtKind::Set,
            Self::Register(_) => CrdtKind::Register,
            Self::Map(_) => CrdtKind::Map,
        }
    }

    /// Whether this is the identity value of its kind.
    pub fn is_identity(&self) -> bool {
        *self == Self::identity(self.kind())
    }

    /// Numeric view for integers and counters.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) | Self::Counter(v) => Some(*v),
            _ => None,
        }
    }

    /// Set elements, if this is a set.
    pub fn as_set(&self) -> Option<&[String]> {
        match self {
            Self::Set(v) => Some(v),
            _ => None,
        }
    }

    /// Register contents, if this is a register.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Register(v) => Some(v),
            _ => None,
        }
    }

    /// Map entries, if this is a map.
    pub fn as_map(&self) -> Option<&BTreeMap<TypedKey, Value>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a nested entry of a map value.
    ///
    /// Absent entries, or lookups on a non-map value, yield the identity of
    /// the nested key's kind.
    pub fn get(&self, key: &TypedKey) -> Value {
        self.as_map()
            .and_then(|entries| entries.get(key))
            .cloned()
            .unwrap_or_else(|| Value::identity(key.kind()))
    }
}
