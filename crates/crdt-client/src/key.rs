//! Keys identifying CRDT values in a store or inside an add-wins map.
//!
//! A [`TypedKey`] is the runtime form: a name plus a [`CrdtKind`], compared
//! structurally. [`Key<K>`] carries the kind in its type so that an
//! [`IntegerKey`] can never be handed to a counter builder; the conversion
//! from the runtime form is the one place a `TypeMismatch` can surface.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use crate::error::{ClientError, Result};
use crate::value::Value;

/// The closed set of CRDT kinds a key can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CrdtKind {
    /// Signed 64-bit integer supporting assign and increment.
    Integer = 1,
    /// Positive-negative counter.
    Counter = 2,
    /// Observed-remove set of strings.
    Set = 3,
    /// Single-value string register.
    Register = 4,
    /// Add-wins map of typed keys to nested values.
    Map = 5,
}

impl CrdtKind {
    /// All kinds, in tag order.
    pub const ALL: [CrdtKind; 5] = [
        CrdtKind::Integer,
        CrdtKind::Counter,
        CrdtKind::Set,
        CrdtKind::Register,
        CrdtKind::Map,
    ];

    /// Stable one-byte tag.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Convert from a raw tag byte.
    pub fn from_tag(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Integer),
            2 => Some(Self::Counter),
            3 => Some(Self::Set),
            4 => Some(Self::Register),
            5 => Some(Self::Map),
            _ => None,
        }
    }

    /// Lowercase name, as used in messages and storage keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Counter => "counter",
            Self::Set => "set",
            Self::Register => "register",
            Self::Map => "map",
        }
    }

    /// Parse a lowercase kind name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// The value a never-written key of this kind reads as.
    pub fn identity(self) -> Value {
        Value::identity(self)
    }
}

impl fmt::Display for CrdtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ClientError::InvalidArgument(
            "key name must not be empty".into(),
        ));
    }
    Ok(())
}

/// A named value of a specific CRDT kind.
///
/// Equality, ordering and hashing use `(name, kind)`: the same name under
/// two kinds identifies two unrelated values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypedKey {
    name: String,
    kind: CrdtKind,
}

impl TypedKey {
    /// Create a key, rejecting empty names.
    pub fn new(name: impl Into<String>, kind: CrdtKind) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self { name, kind })
    }

    /// The key's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key's kind.
    #[must_use]
    pub fn kind(&self) -> CrdtKind {
        self.kind
    }

    /// Fail with `TypeMismatch` unless this key is of `expected` kind.
    pub fn expect_kind(&self, expected: CrdtKind) -> Result<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(ClientError::TypeMismatch {
                expected,
                found: self.kind,
            })
        }
    }
}

impl fmt::Display for TypedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Compile-time marker for a CRDT kind.
///
/// Implemented only by the five marker types in this module.
pub trait Kind: sealed::Sealed {
    /// Runtime kind this marker stands for.
    const KIND: CrdtKind;

    /// Rust type a read of this kind produces.
    type Value;

    /// Extract the typed value from a dynamically typed read result.
    fn from_value(value: Value) -> Result<Self::Value>;
}

macro_rules! kind_marker {
    ($(#[$doc:meta])* $marker:ident, $kind:ident, $value:ty, $variant:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $marker {}

        impl sealed::Sealed for $marker {}

        impl Kind for $marker {
            const KIND: CrdtKind = CrdtKind::$kind;
            type Value = $value;

            fn from_value(value: Value) -> Result<$value> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(ClientError::TypeMismatch {
                        expected: CrdtKind::$kind,
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

kind_marker!(
    /// Marker for integer keys.
    IntegerKind, Integer, i64, Integer
);
kind_marker!(
    /// Marker for counter keys.
    CounterKind, Counter, i64, Counter
);
kind_marker!(
    /// Marker for set keys.
    SetKind, Set, Vec<String>, Set
);
kind_marker!(
    /// Marker for register keys.
    RegisterKind, Register, String, Register
);
kind_marker!(
    /// Marker for add-wins map keys.
    MapKind,
    Map,
    std::collections::BTreeMap<TypedKey, Value>,
    Map
);

/// A key whose kind is fixed by its type parameter.
pub struct Key<K: Kind> {
    name: String,
    _kind: PhantomData<fn() -> K>,
}

/// Key of an integer value.
pub type IntegerKey = Key<IntegerKind>;
/// Key of a counter value.
pub type CounterKey = Key<CounterKind>;
/// Key of a set value.
pub type SetKey = Key<SetKind>;
/// Key of a register value.
pub type RegisterKey = Key<RegisterKind>;
/// Key of an add-wins map.
pub type MapKey = Key<MapKind>;

impl<K: Kind> Key<K> {
    /// Create a key of kind `K`, rejecting empty names.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            _kind: PhantomData,
        })
    }

    /// The key's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key's kind.
    #[must_use]
    pub fn kind(&self) -> CrdtKind {
        K::KIND
    }

    /// The runtime form of this key.
    #[must_use]
    pub fn typed(&self) -> TypedKey {
        TypedKey {
            name: self.name.clone(),
            kind: K::KIND,
        }
    }
}

impl<K: Kind> Clone for Key<K> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: Kind> fmt::Debug for Key<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.name)
            .field("kind", &K::KIND)
            .finish()
    }
}

impl<K: Kind> fmt::Display for Key<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", K::KIND, self.name)
    }
}

impl<K: Kind> PartialEq for Key<K> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<K: Kind> Eq for Key<K> {}

impl<K: Kind> PartialOrd for Key<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Kind> Ord for Key<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl<K: Kind> Hash for Key<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        K::KIND.hash(state);
    }
}

impl<K: Kind> From<Key<K>> for TypedKey {
    fn from(key: Key<K>) -> Self {
        TypedKey {
            name: key.name,
            kind: K::KIND,
        }
    }
}

impl<K: Kind> From<&Key<K>> for TypedKey {
    fn from(key: &Key<K>) -> Self {
        key.typed()
    }
}

impl<K: Kind> TryFrom<TypedKey> for Key<K> {
    type Error = ClientError;

    fn try_from(key: TypedKey) -> Result<Self> {
        key.expect_kind(K::KIND)?;
        Ok(Self {
            name: key.name,
            _kind: PhantomData,
        })
    }
}

impl<K: Kind> TryFrom<&TypedKey> for Key<K> {
    type Error = ClientError;

    fn try_from(key: &TypedKey) -> Result<Self> {
        Key::try_from(key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_different_kind_are_distinct() {
        let a = TypedKey::new("x", CrdtKind::Integer).unwrap();
        let b = TypedKey::new("x", CrdtKind::Counter).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, TypedKey::new("x", CrdtKind::Integer).unwrap());
    }

    #[test]
    fn empty_name_is_invalid() {
        assert!(matches!(
            TypedKey::new("", CrdtKind::Set),
            Err(ClientError::InvalidArgument(_))
        ));
        assert!(matches!(
            IntegerKey::new("   "),
            Err(ClientError::InvalidArgument(_))
        ));
    }

    #[test]
    fn typed_key_roundtrips_through_runtime_form() {
        let key = CounterKey::new("z").unwrap();
        let typed: TypedKey = key.clone().into();
        assert_eq!(typed.kind(), CrdtKind::Counter);
        assert_eq!(typed.name(), "z");

        let back = CounterKey::try_from(typed).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn wrong_kind_conversion_is_type_mismatch() {
        let typed = TypedKey::new("y", CrdtKind::Integer).unwrap();
        let err = SetKey::try_from(&typed).unwrap_err();
        assert_eq!(
            err,
            ClientError::TypeMismatch {
                expected: CrdtKind::Set,
                found: CrdtKind::Integer,
            }
        );
    }

    #[test]
    fn tags_and_names_are_stable() {
        for kind in CrdtKind::ALL {
            assert_eq!(CrdtKind::from_tag(kind.tag()), Some(kind));
            assert_eq!(CrdtKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(CrdtKind::from_tag(0), None);
        assert_eq!(CrdtKind::from_name("gcounter"), None);
    }

    #[test]
    fn display_includes_kind() {
        let key = MapKey::new("key1").unwrap();
        assert_eq!(key.to_string(), "map:key1");
        assert_eq!(key.typed().to_string(), "map:key1");
    }
}
