//! Error types for paste storage operations.

use crate::id::PasteId;
use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during paste storage operations.
///
/// Every operation reports its outcome explicitly; there is no retry or
/// local recovery inside the store. Mapping these to user-facing behavior
/// (HTTP status codes and the like) is the front-end's job.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No storage unit exists for the identifier.
    #[error("paste {id} was not found")]
    NotFound {
        /// The identifier that was looked up.
        id: PasteId,
    },

    /// The paste is encrypted and no key was supplied.
    #[error("paste {id} is encrypted")]
    EncryptionRequired {
        /// The identifier of the encrypted paste.
        id: PasteId,
    },

    /// A key was supplied but does not match the stored verification tag.
    #[error("invalid key for paste {id}")]
    InvalidKey {
        /// The identifier the key was checked against.
        id: PasteId,
    },

    /// Stored metadata could not be decoded.
    #[error("malformed metadata: {message}")]
    MalformedMetadata {
        /// Description of what failed to decode.
        message: String,
    },

    /// Key material has the wrong size.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },

    /// The random source failed during identifier generation.
    #[error("random source failure: {0}")]
    RandomSource(#[from] rand::Error),

    /// An I/O error from the underlying filesystem, propagated unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Creates a malformed metadata error.
    pub fn malformed_metadata(message: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            message: message.into(),
        }
    }

    /// Creates an invalid key size error.
    pub fn invalid_key_size(actual: usize, expected: usize) -> Self {
        Self::InvalidKeySize { expected, actual }
    }
}
