//! Versioned framing for persisted objects.
//!
//! ```text
//! [MAGIC: 0xCF][VERSION: u8][KIND: u8][PAYLOAD: N bytes]
//! ```

use crdt_client::CrdtKind;
use thiserror::Error;

/// Magic byte identifying persisted replica objects.
pub const MAGIC_BYTE: u8 = 0xCF;

/// Size of the envelope header in bytes.
pub const ENVELOPE_HEADER_SIZE: usize = 3;

/// Payload layout version written by this crate.
pub const CURRENT_VERSION: u8 = 1;

/// A version envelope wrapping one serialized object.
///
/// # Example
///
/// ```
/// use crdt_client::CrdtKind;
/// use crdt_replica::VersionedEnvelope;
///
/// let envelope = VersionedEnvelope::new(1, CrdtKind::Set, b"payload".to_vec());
/// let bytes = envelope.to_bytes();
///
/// let decoded = VersionedEnvelope::from_bytes(&bytes).unwrap();
/// assert_eq!(decoded.kind, CrdtKind::Set);
/// assert_eq!(decoded.payload, b"payload");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedEnvelope {
    /// Layout version of the payload.
    pub version: u8,
    /// Kind of the object inside.
    pub kind: CrdtKind,
    /// Serialized object.
    pub payload: Vec<u8>,
}

/// Error parsing a version envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Data is too short to contain a header.
    #[error("data too short for version envelope")]
    TooShort,
    /// Missing or incorrect magic byte.
    #[error("invalid magic byte: 0x{0:02X}, expected 0xCF")]
    InvalidMagic(u8),
    /// Unknown kind tag.
    #[error("unknown CRDT kind tag: {0}")]
    UnknownKind(u8),
    /// Written by a newer layout than this crate reads.
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),
}

impl VersionedEnvelope {
    /// Create a new envelope.
    pub fn new(version: u8, kind: CrdtKind, payload: Vec<u8>) -> Self {
        Self {
            version,
            kind,
            payload,
        }
    }

    /// Wrap a payload in the current layout version.
    pub fn current(kind: CrdtKind, payload: Vec<u8>) -> Self {
        Self::new(CURRENT_VERSION, kind, payload)
    }

    /// Serialize the envelope to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ENVELOPE_HEADER_SIZE + self.payload.len());
        bytes.push(MAGIC_BYTE);
        bytes.push(self.version);
        bytes.push(self.kind.tag());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Parse an envelope from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, EnvelopeError> {
        if data.len() < ENVELOPE_HEADER_SIZE {
            return Err(EnvelopeError::TooShort);
        }
        if data[0] != MAGIC_BYTE {
            return Err(EnvelopeError::InvalidMagic(data[0]));
        }

        let version = data[1];
        let kind = CrdtKind::from_tag(data[2]).ok_or(EnvelopeError::UnknownKind(data[2]))?;

        Ok(Self {
            version,
            kind,
            payload: data[ENVELOPE_HEADER_SIZE..].to_vec(),
        })
    }

    /// Fail unless this crate can decode the payload.
    pub fn check_version(&self) -> Result<(), EnvelopeError> {
        if self.version > CURRENT_VERSION {
            return Err(EnvelopeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }

    /// Check if bytes look like an envelope (start with the magic byte).
    pub fn is_versioned(data: &[u8]) -> bool {
        data.first() == Some(&MAGIC_BYTE)
    }
}
