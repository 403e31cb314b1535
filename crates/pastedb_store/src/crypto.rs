//! Encryption at rest and key verification.
//!
//! Content is enciphered with AES-256 in output-feedback (OFB) mode, which
//! turns the block cipher into a byte-stream cipher: reads and writes of
//! arbitrary length pass through with zero framing overhead, so the bytes
//! on disk are exactly the ciphertext of the payload.
//!
//! Key verification is decoupled from decryption. At persist time the store
//! records an HMAC-SHA256 over the identifier's string bytes, keyed by the
//! encryption key; at fetch time a candidate key is checked against that tag
//! before any content is touched. A wrong key is therefore detected
//! deterministically rather than by garbled output, and the key itself never
//! reaches persistent state.
//!
//! Each write stream enciphers under a fresh random IV, persisted in the
//! metadata side-channel alongside the tag.

use crate::error::{StoreError, StoreResult};
use crate::id::{PasteId, BASE32};
use aes::Aes256;
use hmac::{Hmac, Mac};
use ofb::cipher::KeyIvInit;
use ofb::Ofb;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the OFB initialization vector in bytes (one AES block).
pub const IV_SIZE: usize = 16;
/// Size of the HMAC-SHA256 verification tag in bytes.
pub const TAG_SIZE: usize = 32;

/// Version marker persisted with every encrypted paste.
///
/// Version 1 enciphered under a fixed all-zero IV; version 2 stores a fresh
/// per-paste IV in the metadata side-channel.
pub const ENCRYPTION_VERSION: &str = "2";

type HmacSha256 = Hmac<Sha256>;

pub(crate) type Aes256Ofb = Ofb<Aes256>;

/// Caller-supplied symmetric key protecting a single paste.
///
/// The key lives only in memory for the lifetime of a paste handle and is
/// zeroized on drop. It is never serialized; persistent state carries only
/// the verification tag derived from it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Generates a new random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    ///
    /// The key is opaque caller-supplied material; no derivation is applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly [`KEY_SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(StoreError::invalid_key_size(bytes.len(), KEY_SIZE));
        }
        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);
        Ok(Self { bytes: key_bytes })
    }

    /// Returns the key as a byte slice.
    ///
    /// # Security
    ///
    /// Be careful with this method - don't log or serialize the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Builds the content stream cipher for a key and IV.
pub(crate) fn content_cipher(key: &EncryptionKey, iv: &[u8; IV_SIZE]) -> Aes256Ofb {
    Aes256Ofb::new(key.as_bytes().into(), iv.into())
}

/// Generates a fresh random IV for a write stream.
pub(crate) fn generate_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}

/// Computes the verification tag for an identifier under a key.
fn compute_tag(id: &PasteId, key: &EncryptionKey) -> [u8; TAG_SIZE] {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(id.as_str().as_bytes());
    mac.finalize().into_bytes().into()
}

/// Returns the text-encoded verification tag for an identifier under a key.
pub(crate) fn encoded_tag(id: &PasteId, key: &EncryptionKey) -> String {
    BASE32.encode(&compute_tag(id, key))
}

/// Checks a candidate key against a stored text-encoded verification tag.
///
/// An undecodable tag classifies as [`StoreError::MalformedMetadata`]; a
/// decodable tag that does not match the recomputed one classifies as
/// [`StoreError::InvalidKey`]. The comparison is constant-time.
pub(crate) fn check_tag(id: &PasteId, stored: &str, key: &EncryptionKey) -> StoreResult<()> {
    let tag = BASE32
        .decode(stored.as_bytes())
        .map_err(|e| StoreError::malformed_metadata(format!("verification tag: {e}")))?;

    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(id.as_str().as_bytes());
    if mac.verify_slice(&tag).is_err() {
        return Err(StoreError::InvalidKey { id: id.clone() });
    }
    Ok(())
}

/// Text-encodes an IV for the metadata side-channel.
pub(crate) fn encode_iv(iv: &[u8; IV_SIZE]) -> String {
    BASE32.encode(iv)
}

/// Decodes a text-encoded IV from the metadata side-channel.
pub(crate) fn decode_iv(encoded: &str) -> StoreResult<[u8; IV_SIZE]> {
    let bytes = BASE32
        .decode(encoded.as_bytes())
        .map_err(|e| StoreError::malformed_metadata(format!("iv: {e}")))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| StoreError::malformed_metadata(format!("iv has {} bytes", bytes.len())))
}
