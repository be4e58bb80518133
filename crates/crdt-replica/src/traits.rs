use core::fmt;

use crdt_client::TypedKey;

/// Backend holding a replica's persisted objects.
///
/// Objects are grouped into buckets and addressed by their [`TypedKey`], so
/// a backend can index on kind and name separately. The bytes are a
/// [`VersionedEnvelope`](crate::VersionedEnvelope) the backend never
/// interprets.
pub trait StateStore {
    /// Error type for this backend.
    type Error: fmt::Debug + fmt::Display;

    /// Every key stored in `bucket`.
    fn keys(&self, bucket: &str) -> Result<Vec<TypedKey>, Self::Error>;

    /// The framed object under `key`, or `None` if it was never saved.
    fn load(&self, bucket: &str, key: &TypedKey) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Save every object in `objects`, or none of them.
    fn save_batch(
        &mut self,
        bucket: &str,
        objects: &[(&TypedKey, &[u8])],
    ) -> Result<(), Self::Error>;
}
