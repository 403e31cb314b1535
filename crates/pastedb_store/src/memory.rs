//! In-memory paste store for testing and ephemeral use.

use crate::crypto::{self, EncryptionKey, ENCRYPTION_VERSION, IV_SIZE};
use crate::error::{StoreError, StoreResult};
use crate::id::PasteId;
use crate::meta::{
    AttrMap, ATTR_ENCRYPTION_VERSION, ATTR_HMAC, ATTR_IV, ATTR_LANGUAGE, DEFAULT_LANGUAGE,
};
use crate::paste::Paste;
use crate::store::{noop_callback, PasteCallback, PasteStore};
use crate::stream::{PasteReader, PasteWriter, RawSink};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::{self, Cursor, Write};
use std::mem;
use std::sync::Arc;
use std::time::SystemTime;

/// One stored unit: content bytes plus side-channel attributes.
#[derive(Debug, Clone)]
struct MemoryUnit {
    content: Vec<u8>,
    attrs: AttrMap,
    mtime: SystemTime,
}

impl Default for MemoryUnit {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            attrs: AttrMap::new(),
            mtime: SystemTime::now(),
        }
    }
}

type SharedUnits = Arc<RwLock<HashMap<String, MemoryUnit>>>;

/// A paste store holding all units in memory.
///
/// Same contract as the filesystem store, including the cipher layer and
/// key verification, which makes it suitable for exercising the
/// [`PasteStore`] trait in tests without touching disk.
pub struct InMemoryPasteStore {
    units: SharedUnits,
    update_callback: PasteCallback,
    destroy_callback: PasteCallback,
}

impl InMemoryPasteStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: Arc::new(RwLock::new(HashMap::new())),
            update_callback: noop_callback(),
            destroy_callback: noop_callback(),
        }
    }

    /// Sets the callback invoked after successful fetch and persist.
    #[must_use]
    pub fn with_update_callback(
        mut self,
        callback: impl Fn(&Paste) + Send + Sync + 'static,
    ) -> Self {
        self.update_callback = Box::new(callback);
        self
    }

    /// Sets the callback invoked after successful destroy.
    #[must_use]
    pub fn with_destroy_callback(
        mut self,
        callback: impl Fn(&Paste) + Send + Sync + 'static,
    ) -> Self {
        self.destroy_callback = Box::new(callback);
        self
    }

    /// Returns the raw stored bytes for an identifier, if present.
    ///
    /// Useful for asserting that encrypted content differs from plaintext.
    #[must_use]
    pub fn raw_content(&self, id: &PasteId) -> Option<Vec<u8>> {
        self.units.read().get(id.as_str()).map(|u| u.content.clone())
    }
}

impl Default for InMemoryPasteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PasteStore for InMemoryPasteStore {
    fn fetch(&self, id: PasteId, key: Option<EncryptionKey>) -> StoreResult<Paste> {
        let (attrs, mtime) = {
            let units = self.units.read();
            let Some(unit) = units.get(id.as_str()) else {
                return Err(StoreError::NotFound { id });
            };
            (unit.attrs.clone(), unit.mtime)
        };

        let verified_key = match attrs.get(ATTR_HMAC) {
            Some(stored_tag) => {
                let Some(key) = key else {
                    return Err(StoreError::EncryptionRequired { id });
                };
                crypto::check_tag(&id, stored_tag, &key)?;
                Some(key)
            }
            None => None,
        };

        let language = attrs
            .get(ATTR_LANGUAGE)
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string();

        let paste = Paste::fetched(id, language, verified_key, mtime);
        (self.update_callback)(&paste);
        Ok(paste)
    }

    fn persist(&self, paste: &Paste) -> StoreResult<()> {
        {
            let mut units = self.units.write();
            let Some(unit) = units.get_mut(paste.id().as_str()) else {
                return Err(StoreError::NotFound {
                    id: paste.id().clone(),
                });
            };
            unit.attrs.set(ATTR_LANGUAGE, paste.language());
            if let Some(key) = paste.key() {
                unit.attrs.set(ATTR_HMAC, crypto::encoded_tag(paste.id(), key));
                unit.attrs.set(ATTR_ENCRYPTION_VERSION, ENCRYPTION_VERSION);
            }
        }
        (self.update_callback)(paste);
        Ok(())
    }

    fn destroy(&self, paste: &Paste) -> StoreResult<()> {
        if self.units.write().remove(paste.id().as_str()).is_none() {
            return Err(StoreError::NotFound {
                id: paste.id().clone(),
            });
        }
        (self.destroy_callback)(paste);
        Ok(())
    }

    fn open_read_stream(&self, paste: &Paste) -> StoreResult<PasteReader> {
        let (content, attrs) = {
            let units = self.units.read();
            let Some(unit) = units.get(paste.id().as_str()) else {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such unit").into());
            };
            (unit.content.clone(), unit.attrs.clone())
        };

        let cipher = match paste.key() {
            Some(key) => {
                let iv = match attrs.get(ATTR_IV) {
                    Some(encoded) => crypto::decode_iv(encoded)?,
                    None => {
                        return Err(StoreError::malformed_metadata(
                            "encrypted paste has no stored iv",
                        ));
                    }
                };
                Some(crypto::content_cipher(key, &iv))
            }
            None => None,
        };

        Ok(PasteReader::new(Box::new(Cursor::new(content)), cipher))
    }

    fn open_write_stream(&self, paste: &Paste) -> StoreResult<PasteWriter<'_>> {
        let (cipher, iv) = match paste.key() {
            Some(key) => {
                let iv = crypto::generate_iv();
                (Some(crypto::content_cipher(key, &iv)), Some(iv))
            }
            None => (None, None),
        };

        let sink = MemorySink {
            units: Arc::clone(&self.units),
            id: paste.id().clone(),
            buf: Vec::new(),
            iv,
        };
        Ok(PasteWriter::new(Box::new(sink), cipher, self, paste.clone()))
    }
}

impl std::fmt::Debug for InMemoryPasteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPasteStore")
            .field("units", &self.units.read().len())
            .finish_non_exhaustive()
    }
}

/// Content sink buffering into the shared unit map.
struct MemorySink {
    units: SharedUnits,
    id: PasteId,
    buf: Vec<u8>,
    iv: Option<[u8; IV_SIZE]>,
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl RawSink for MemorySink {
    fn commit(&mut self) -> StoreResult<()> {
        let mut units = self.units.write();
        let unit = units.entry(self.id.as_str().to_string()).or_default();
        unit.content = mem::take(&mut self.buf);
        unit.mtime = SystemTime::now();
        if let Some(iv) = self.iv.take() {
            unit.attrs.set(ATTR_IV, crypto::encode_iv(&iv));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn write_paste(store: &InMemoryPasteStore, paste: &Paste, content: &[u8]) {
        let mut writer = store.open_write_stream(paste).unwrap();
        writer.write_all(content).unwrap();
        writer.finish().unwrap();
    }

    fn read_paste(store: &InMemoryPasteStore, paste: &Paste) -> Vec<u8> {
        let mut reader = store.open_read_stream(paste).unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn plain_roundtrip() {
        let store = InMemoryPasteStore::new();
        let paste = store.create(PasteId::from("abcde"), None);
        write_paste(&store, &paste, b"hello");

        let fetched = store.fetch(PasteId::from("abcde"), None).unwrap();
        assert_eq!(read_paste(&store, &fetched), b"hello");
    }

    #[test]
    fn encrypted_roundtrip_and_raw_content_differs() {
        let store = InMemoryPasteStore::new();
        let key = EncryptionKey::generate();
        let paste = store.create(PasteId::from("abcde"), Some(key.clone()));
        write_paste(&store, &paste, b"secret");

        assert_ne!(
            store.raw_content(&PasteId::from("abcde")).unwrap(),
            b"secret"
        );

        let fetched = store.fetch(PasteId::from("abcde"), Some(key)).unwrap();
        assert_eq!(read_paste(&store, &fetched), b"secret");
    }

    #[test]
    fn fetch_unknown_id_is_not_found() {
        let store = InMemoryPasteStore::new();
        assert!(matches!(
            store.fetch(PasteId::from("zzzzz"), None),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn wrong_key_fails_before_content_access() {
        let store = InMemoryPasteStore::new();
        let key = EncryptionKey::from_bytes(&[1u8; 32]).unwrap();
        let paste = store.create(PasteId::from("abcde"), Some(key));
        write_paste(&store, &paste, b"secret");

        let wrong = EncryptionKey::from_bytes(&[2u8; 32]).unwrap();
        assert!(matches!(
            store.fetch(PasteId::from("abcde"), Some(wrong)),
            Err(StoreError::InvalidKey { .. })
        ));
        assert!(matches!(
            store.fetch(PasteId::from("abcde"), None),
            Err(StoreError::EncryptionRequired { .. })
        ));
    }

    #[test]
    fn destroy_then_fetch_is_not_found() {
        let store = InMemoryPasteStore::new();
        let paste = store.create(PasteId::from("abcde"), None);
        write_paste(&store, &paste, b"gone soon");

        store.destroy(&paste).unwrap();
        assert!(matches!(
            store.fetch(PasteId::from("abcde"), None),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.destroy(&paste),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn language_survives_persist() {
        let store = InMemoryPasteStore::new();
        let mut paste = store.create(PasteId::from("abcde"), None);
        write_paste(&store, &paste, b"print(1)");

        paste.set_language("python");
        store.persist(&paste).unwrap();

        let fetched = store.fetch(PasteId::from("abcde"), None).unwrap();
        assert_eq!(fetched.language(), "python");
    }

    #[test]
    fn works_through_trait_object() {
        let store: Box<dyn PasteStore> = Box::new(InMemoryPasteStore::new());
        let paste = store.create(PasteId::from("abcde"), None);
        let mut writer = store.open_write_stream(&paste).unwrap();
        writer.write_all(b"dyn dispatch").unwrap();
        writer.finish().unwrap();

        let fetched = store.fetch(PasteId::from("abcde"), None).unwrap();
        let mut buf = Vec::new();
        store
            .open_read_stream(&fetched)
            .unwrap()
            .read_to_end(&mut buf)
            .unwrap();
        assert_eq!(buf, b"dyn dispatch");
    }
}
