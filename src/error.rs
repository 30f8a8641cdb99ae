use thiserror::Error;

/// Errors surfaced by tree operations.
///
/// Every failure is reported as a value; no operation leaves the tree in a
/// structurally inconsistent state on any error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArtError {
    /// The encoded key exceeds the maximum length the tree was configured
    /// with at construction.
    #[error("encoded key length {len} exceeds configured maximum {max}")]
    KeyTooLong { len: usize, max: usize },

    /// The key bytes cannot participate in the binary-comparable encoding:
    /// empty, or violating the prefix-freedom the codec guarantees (e.g. a
    /// raw byte key that is a strict prefix of an already-stored key).
    #[error("key bytes are not binary-comparable encodable")]
    InvalidKeyBytes,

    /// `insert` on a key that is already present. Use `upsert` to replace.
    #[error("key already exists")]
    KeyExists,

    /// `remove` on a key that is not present.
    #[error("key not found")]
    KeyNotFound,
}
