//! The paste entity.

use crate::crypto::EncryptionKey;
use crate::id::PasteId;
use crate::meta::DEFAULT_LANGUAGE;
use std::time::SystemTime;

/// An in-memory handle to one stored (or about-to-be-stored) paste.
///
/// A `Paste` combines identity, language tag and encryption state. It holds
/// no reference to the store that produced it; operations that touch
/// persistent state are delegated by passing the handle back to the store
/// (`store.persist(&paste)`, `store.destroy(&paste)`), which keeps entity
/// and store free of ownership cycles.
///
/// Construction goes through [`PasteStore::create`] or
/// [`PasteStore::fetch`]; a freshly created paste exists only in memory
/// until its write stream is finished.
///
/// [`PasteStore::create`]: crate::store::PasteStore::create
/// [`PasteStore::fetch`]: crate::store::PasteStore::fetch
#[derive(Debug, Clone)]
pub struct Paste {
    id: PasteId,
    language: String,
    key: Option<EncryptionKey>,
    last_modified: Option<SystemTime>,
}

impl Paste {
    /// Creates a fresh in-memory paste. Used by store `create`.
    pub(crate) fn new(id: PasteId, key: Option<EncryptionKey>) -> Self {
        Self {
            id,
            language: DEFAULT_LANGUAGE.to_string(),
            key,
            last_modified: None,
        }
    }

    /// Rebuilds a paste from persisted state. Used by store `fetch`.
    pub(crate) fn fetched(
        id: PasteId,
        language: String,
        key: Option<EncryptionKey>,
        last_modified: SystemTime,
    ) -> Self {
        Self {
            id,
            language,
            key,
            last_modified: Some(last_modified),
        }
    }

    /// The paste's identifier. Immutable for the lifetime of the handle.
    #[must_use]
    pub fn id(&self) -> &PasteId {
        &self.id
    }

    /// The language tag. Defaults to `"text"` when none was stored.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Sets the language tag. Takes effect on the next `persist`.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    /// Whether this paste is encrypted.
    ///
    /// Derived from key presence: a handle is encrypted exactly when it
    /// holds key material, so the in-memory flag cannot drift from the
    /// persisted verification tag.
    #[must_use]
    pub fn encrypted(&self) -> bool {
        self.key.is_some()
    }

    /// The in-memory encryption key, if any. Never serialized.
    pub(crate) fn key(&self) -> Option<&EncryptionKey> {
        self.key.as_ref()
    }

    /// When the persisted unit was last modified.
    ///
    /// Populated on fetch; `None` on a freshly created handle.
    #[must_use]
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_SIZE;

    #[test]
    fn fresh_paste_defaults() {
        let paste = Paste::new(PasteId::from("abcde"), None);
        assert_eq!(paste.language(), "text");
        assert!(!paste.encrypted());
        assert!(paste.last_modified().is_none());
    }

    #[test]
    fn encrypted_iff_key_present() {
        let key = EncryptionKey::from_bytes(&[0u8; KEY_SIZE]).unwrap();
        let paste = Paste::new(PasteId::from("abcde"), Some(key));
        assert!(paste.encrypted());
    }

    #[test]
    fn language_is_mutable() {
        let mut paste = Paste::new(PasteId::from("abcde"), None);
        paste.set_language("python");
        assert_eq!(paste.language(), "python");
    }

    #[test]
    fn debug_never_exposes_key_material() {
        let key = EncryptionKey::from_bytes(&[0x5Au8; KEY_SIZE]).unwrap();
        let paste = Paste::new(PasteId::from("abcde"), Some(key));
        let rendered = format!("{paste:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("5A"));
        assert!(!rendered.contains("90"));
    }
}
