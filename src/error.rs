//! Main Crate Error

use crate::common::ID_SIZE;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Crate error enum.
///
/// Every variant names the constraint that was violated and carries the
/// offending value, so callers can decide to drop a message or a peer
/// without parsing error strings.
pub enum ValidationError {
    /// Node ids must be exactly [ID_SIZE] bytes.
    #[error("Invalid Id size, expected {ID_SIZE} bytes, got {0}")]
    InvalidIdSize(usize),

    /// A node id element is outside `[0..255]`.
    #[error("Id byte at index {index} is {value}, must be in [0..255]")]
    ByteOutOfRange { index: usize, value: i64 },

    /// Id string is not valid hex.
    #[error("Invalid Id encoding: {0}")]
    InvalidHex(String),

    /// K-bucket capacity must be at least 1.
    #[error("K-bucket capacity is {0}, must be >= 1")]
    InvalidCapacity(usize),

    /// Contact host must not be empty.
    #[error("Contact host must not be empty")]
    EmptyHost,

    /// Contact port must be in `[1..65535]`.
    #[error("Contact port is {0}, must be in [1..65535]")]
    InvalidPort(u16),

    /// A node has no distance class relative to itself.
    #[error("No bucket index for the local node id")]
    SelfDistance,
}
