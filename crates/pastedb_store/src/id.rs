//! Paste identifiers.

use crate::error::StoreResult;
use data_encoding::Encoding;
use data_encoding_macro::new_encoding;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

/// The restricted base32 alphabet used for identifiers and text-encoded
/// metadata values.
///
/// Visually ambiguous symbols (`i`, `l`, `0`, `1`) are excluded so that
/// identifiers survive being read aloud or retyped.
pub const ID_ALPHABET: &str = "abcdefghjkmnopqrstuvwxyz23456789";

/// Length of a generated identifier in symbols.
pub const ID_LENGTH: usize = 5;

/// Number of random bytes behind a generated identifier (24 bits of
/// entropy, ~16.7M possible values).
const ID_SEED_BYTES: usize = 3;

/// Unpadded base32 over [`ID_ALPHABET`], shared by identifier generation
/// and metadata value encoding.
pub(crate) const BASE32: Encoding = new_encoding! {
    symbols: "abcdefghjkmnopqrstuvwxyz23456789",
};

/// Opaque identifier naming a paste.
///
/// Identifiers are string-valued, compared by value, and immutable once
/// assigned to a paste. Generated identifiers are exactly [`ID_LENGTH`]
/// symbols from [`ID_ALPHABET`]; identifiers arriving from the outside
/// (URL paths and the like) are accepted as-is and simply fail lookup if
/// nothing is stored under them.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PasteId(String);

impl PasteId {
    /// Generates a new random identifier.
    ///
    /// No collision check against existing storage is performed; callers
    /// that need uniqueness must re-generate on conflict.
    ///
    /// # Errors
    ///
    /// Fails only if the operating system random source is unavailable.
    pub fn generate() -> StoreResult<Self> {
        let mut seed = [0u8; ID_SEED_BYTES];
        OsRng.try_fill_bytes(&mut seed)?;
        Ok(Self(BASE32.encode(&seed)))
    }

    /// Returns the identifier's string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasteId({})", self.0)
    }
}

impl fmt::Display for PasteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PasteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PasteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<PasteId> for String {
    fn from(id: PasteId) -> Self {
        id.0
    }
}
