//! Property-based test generators using proptest.

use pastedb_store::{EncryptionKey, PasteId};
use proptest::prelude::*;

/// Strategy for generating identifiers in the generated shape: five
/// symbols from the restricted alphabet.
pub fn paste_id_strategy() -> impl Strategy<Value = PasteId> {
    prop::string::string_regex("[abcdefghjkmnopqrstuvwxyz23456789]{5}")
        .expect("Invalid regex")
        .prop_map(PasteId::from)
}

/// Strategy for generating paste payloads (arbitrary bytes).
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

/// Strategy for generating encryption keys.
pub fn key_strategy() -> impl Strategy<Value = EncryptionKey> {
    prop::array::uniform32(any::<u8>()).prop_map(|bytes| {
        EncryptionKey::from_bytes(&bytes).expect("Key is exactly KEY_SIZE bytes")
    })
}

/// Strategy for generating language tags.
pub fn language_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9+-]{0,15}").expect("Invalid regex")
}

/// Strategy for generating a pair of distinct encryption keys.
pub fn distinct_key_pair_strategy() -> impl Strategy<Value = (EncryptionKey, EncryptionKey)> {
    (
        prop::array::uniform32(any::<u8>()),
        prop::array::uniform32(any::<u8>()),
    )
        .prop_filter("Keys must differ", |(a, b)| a != b)
        .prop_map(|(a, b)| {
            (
                EncryptionKey::from_bytes(&a).expect("Key is exactly KEY_SIZE bytes"),
                EncryptionKey::from_bytes(&b).expect("Key is exactly KEY_SIZE bytes"),
            )
        })
}
