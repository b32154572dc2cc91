//! Failure taxonomy for tokens and storage
//!
//! None of these ever reach the watchdog loop: the codec and store boundaries
//! collapse them into `None` and log the reason.

/// Why a token could not be produced or accepted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The key stream would be empty, making the XOR step lossy
    #[error("codec key must not be empty")]
    EmptyKey,

    /// Token did not split into exactly two non-empty segments
    #[error("malformed token: expected `<payload>.<checksum>`")]
    MalformedToken,

    /// Recomputed checksum disagrees with the one carried by the token
    #[error("checksum mismatch: token carries {expected}, payload hashes to {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Base64, UTF-8 or JSON decoding failed
    #[error("decode failure: {0}")]
    DecodeFailure(String),

    /// Value could not be serialized to JSON
    #[error("serialize failure: {0}")]
    Serialize(String),
}

/// The key/value backend could not be reached
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Why a persisted record was treated as absent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Decoded cleanly but has no non-negative integer `score`
    #[error("persisted record has no numeric `score` field")]
    MissingField,
}
