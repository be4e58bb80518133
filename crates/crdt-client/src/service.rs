use crate::error::Result;
use crate::key::{CrdtKind, Key, Kind, TypedKey};

/// Key minting shared by every per-kind service.
///
/// Each service is stateless: it mints keys of its own kind and builds
/// update descriptors for them. Builders take typed keys, so they cannot
/// fail; the only runtime kind check happens in [`typed_key`], when a key
/// arrives in its untyped form.
///
/// [`typed_key`]: CrdtService::typed_key
pub trait CrdtService {
    /// The kind of key this service produces.
    type Kind: Kind;

    /// Runtime kind of this service.
    fn kind(&self) -> CrdtKind {
        <Self::Kind as Kind>::KIND
    }

    /// Mint the key named `name`.
    ///
    /// Deterministic: the same name always yields an equal key. Fails with
    /// `InvalidArgument` on an empty name.
    fn get_key(&self, name: &str) -> Result<Key<Self::Kind>> {
        Key::new(name)
    }

    /// Accept a runtime key, failing with `TypeMismatch` if it belongs to
    /// another kind.
    fn typed_key(&self, key: &TypedKey) -> Result<Key<Self::Kind>> {
        Key::try_from(key)
    }
}
