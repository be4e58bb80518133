use thiserror::Error;

use crate::key::CrdtKind;

/// Errors raised while building descriptors or talking to a store.
///
/// Construction-time failures (`InvalidArgument`, `TypeMismatch`,
/// `EmptyUpdate`) are reported before any store interaction. Store-originated
/// failures are surfaced exactly as the [`StoreClient`](crate::StoreClient)
/// returned them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Malformed or missing key name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A key of one kind was used where another kind is required.
    #[error("type mismatch: expected {expected} key, found {found}")]
    TypeMismatch {
        /// Kind the operation or service requires.
        expected: CrdtKind,
        /// Kind that was actually supplied.
        found: CrdtKind,
    },

    /// A map update or removal was built with zero operands.
    #[error("empty update: map operation requires at least one operand")]
    EmptyUpdate,

    /// The store could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The store rejected the update because of a conflict.
    #[error("conflict error: {0}")]
    Conflict(String),

    /// The store failed to encode or persist its state.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl ClientError {
    /// Static code for the error class, suitable for log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::EmptyUpdate => "empty_update",
            Self::Connection(_) => "connection",
            Self::Conflict(_) => "conflict",
            Self::Persistence(_) => "persistence",
        }
    }

    /// Whether the error was raised before reaching the store.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::TypeMismatch { .. } | Self::EmptyUpdate
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
