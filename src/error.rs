use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by bitmap operations
#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The bit offset addresses a byte past the end of the payload
    #[error("Bit offset {offset} is out of range for a payload of {payload_len} bytes")]
    OffsetOutOfRange {
        /// Requested bit offset
        offset: u32,
        /// Current payload length in bytes
        payload_len: usize,
    },

    /// Growing the payload would exceed the configured limit
    #[error("Payload of {requested} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge {
        /// Payload length the operation needed
        requested: usize,
        /// Configured maximum payload length
        limit: usize,
    },

    /// The raw value is shorter than its header
    #[error("Raw value of {len} bytes is shorter than the value header")]
    MalformedValue {
        /// Length of the raw value
        len: usize,
    },

    /// The key holds no value
    #[error("Key not found")]
    NotFound,

    /// The key holds a value that is not a string
    #[error("Operation against a key holding the wrong kind of value (type {found})")]
    WrongType {
        /// Type nibble found in the header
        found: u8,
    },

    /// The batched write was rejected by the store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A specialized Result type for bitmap operations
pub type Result<T> = std::result::Result<T, Error>;
