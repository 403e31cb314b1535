//! Metadata side-channel.
//!
//! Structured metadata (language tag, verification tag, encryption scheme
//! version, IV) is attached to a content unit through a generic key/value
//! record, never embedded in the content stream itself. That keeps the
//! content bytes exactly the plaintext or ciphertext of the payload, so the
//! cipher layer stays byte-transparent.
//!
//! The record lives in a sidecar file (`<id>.attrs`) beside the content
//! file. Extended attributes would avoid the second file, but they are not
//! portable; the sidecar preserves the same contract. A content file with a
//! missing or stale sidecar is the expected partial-failure state after a
//! crash between content commit and metadata persist - fetch treats it as an
//! unencrypted paste with default language.

use crate::error::{StoreError, StoreResult};
use crate::id::PasteId;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Metadata key for the language tag.
pub const ATTR_LANGUAGE: &str = "paste.language";
/// Metadata key for the text-encoded key verification tag.
pub const ATTR_HMAC: &str = "paste.hmac";
/// Metadata key for the encryption scheme version marker.
pub const ATTR_ENCRYPTION_VERSION: &str = "paste.encryption_version";
/// Metadata key for the text-encoded content IV.
pub const ATTR_IV: &str = "paste.iv";

/// Language tag used when none is stored.
pub const DEFAULT_LANGUAGE: &str = "text";

/// Magic bytes for sidecar records.
const ATTR_MAGIC: [u8; 4] = *b"PATR";
/// Current sidecar record version.
const ATTR_VERSION: u16 = 1;

/// File extension of sidecar records. Identifiers never contain a dot, so
/// a sidecar name cannot collide with a content file name.
const ATTR_EXT: &str = "attrs";

/// A decoded set of metadata attributes for one content unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrMap {
    entries: BTreeMap<String, String>,
}

impl AttrMap {
    /// Creates an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Sets `name` to `value`, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Returns true if no attributes are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encodes the map to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&ATTR_MAGIC);
        buf.extend_from_slice(&ATTR_VERSION.to_le_bytes());

        let count = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        buf.extend_from_slice(&count.to_le_bytes());

        for (name, value) in &self.entries {
            let name_bytes = name.as_bytes();
            let name_len = u16::try_from(name_bytes.len()).unwrap_or(u16::MAX);
            buf.extend_from_slice(&name_len.to_le_bytes());
            buf.extend_from_slice(name_bytes);

            let value_bytes = value.as_bytes();
            let value_len = u32::try_from(value_bytes.len()).unwrap_or(u32::MAX);
            buf.extend_from_slice(&value_len.to_le_bytes());
            buf.extend_from_slice(value_bytes);
        }

        buf
    }

    /// Decodes a map from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MalformedMetadata`] if the record cannot be
    /// decoded.
    pub fn decode(data: &[u8]) -> StoreResult<Self> {
        let mut cursor = 0;

        if data.len() < 4 || data[0..4] != ATTR_MAGIC {
            return Err(StoreError::malformed_metadata("invalid sidecar magic"));
        }
        cursor += 4;

        let version = read_u16(data, &mut cursor)?;
        if version > ATTR_VERSION {
            return Err(StoreError::malformed_metadata(format!(
                "unsupported sidecar version: {version}"
            )));
        }

        let count = read_u32(data, &mut cursor)?;
        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let name_len = read_u16(data, &mut cursor)? as usize;
            let name = read_string(data, &mut cursor, name_len)?;
            let value_len = read_u32(data, &mut cursor)? as usize;
            let value = read_string(data, &mut cursor, value_len)?;
            entries.insert(name, value);
        }

        Ok(Self { entries })
    }
}

fn read_u16(data: &[u8], cursor: &mut usize) -> StoreResult<u16> {
    let end = *cursor + 2;
    if end > data.len() {
        return Err(StoreError::malformed_metadata("sidecar record too short"));
    }
    let value = u16::from_le_bytes([data[*cursor], data[*cursor + 1]]);
    *cursor = end;
    Ok(value)
}

fn read_u32(data: &[u8], cursor: &mut usize) -> StoreResult<u32> {
    let end = *cursor + 4;
    if end > data.len() {
        return Err(StoreError::malformed_metadata("sidecar record too short"));
    }
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[*cursor..end]);
    *cursor = end;
    Ok(u32::from_le_bytes(bytes))
}

fn read_string(data: &[u8], cursor: &mut usize, len: usize) -> StoreResult<String> {
    let end = cursor.checked_add(len).filter(|&e| e <= data.len());
    let Some(end) = end else {
        return Err(StoreError::malformed_metadata("sidecar record too short"));
    };
    let s = String::from_utf8(data[*cursor..end].to_vec())
        .map_err(|_| StoreError::malformed_metadata("sidecar entry is not utf-8"))?;
    *cursor = end;
    Ok(s)
}

/// Sidecar-backed metadata store addressed by content-unit identity.
///
/// Each write loads the current record, applies the change, and replaces
/// the sidecar with a write-then-rename so a crash never leaves a torn
/// record on disk. Writes to different keys remain independent operations
/// with no transactional boundary across them.
#[derive(Debug, Clone)]
pub struct SidecarStore {
    root: PathBuf,
}

impl SidecarStore {
    /// Creates a sidecar store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn sidecar_path(&self, id: &PasteId) -> PathBuf {
        self.root.join(format!("{}.{ATTR_EXT}", id.as_str()))
    }

    /// Loads the full attribute map for a unit.
    ///
    /// A missing sidecar yields an empty map.
    pub fn load(&self, id: &PasteId) -> StoreResult<AttrMap> {
        match fs::read(self.sidecar_path(id)) {
            Ok(data) => AttrMap::decode(&data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(AttrMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the attribute map for a unit atomically.
    pub fn store(&self, id: &PasteId, attrs: &AttrMap) -> StoreResult<()> {
        let path = self.sidecar_path(id);
        let temp = temp_path(&path);
        fs::write(&temp, attrs.encode())?;
        fs::rename(&temp, &path)?;
        Ok(())
    }

    /// Returns the value stored under `name` for a unit.
    pub fn get(&self, id: &PasteId, name: &str) -> StoreResult<Option<String>> {
        Ok(self.load(id)?.get(name).map(str::to_string))
    }

    /// Sets one attribute for a unit.
    pub fn put(&self, id: &PasteId, name: &str, value: &str) -> StoreResult<()> {
        let mut attrs = self.load(id)?;
        attrs.set(name, value);
        self.store(id, &attrs)
    }

    /// Removes the sidecar for a unit. Missing sidecars are not an error.
    pub fn remove(&self, id: &PasteId) -> StoreResult<()> {
        match fs::remove_file(self.sidecar_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn encode_decode_roundtrip() {
        let mut attrs = AttrMap::new();
        attrs.set(ATTR_LANGUAGE, "python");
        attrs.set(ATTR_HMAC, "abcdef234567");
        let decoded = AttrMap::decode(&attrs.encode()).unwrap();
        assert_eq!(decoded, attrs);
    }

    #[test]
    fn empty_map_roundtrip() {
        let attrs = AttrMap::new();
        let decoded = AttrMap::decode(&attrs.encode()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let result = AttrMap::decode(b"XXXX\x01\x00\x00\x00\x00\x00");
        assert!(matches!(result, Err(StoreError::MalformedMetadata { .. })));
    }

    #[test]
    fn decode_rejects_truncated_record() {
        let mut attrs = AttrMap::new();
        attrs.set(ATTR_LANGUAGE, "text");
        let encoded = attrs.encode();
        let result = AttrMap::decode(&encoded[..encoded.len() - 2]);
        assert!(matches!(result, Err(StoreError::MalformedMetadata { .. })));
    }

    #[test]
    fn decode_rejects_future_version() {
        let mut data = ATTR_MAGIC.to_vec();
        data.extend_from_slice(&99u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            AttrMap::decode(&data),
            Err(StoreError::MalformedMetadata { .. })
        ));
    }

    #[test]
    fn missing_sidecar_loads_empty() {
        let dir = tempdir().unwrap();
        let store = SidecarStore::new(dir.path());
        let attrs = store.load(&PasteId::from("abcde")).unwrap();
        assert!(attrs.is_empty());
    }

    #[test]
    fn put_then_get() {
        let dir = tempdir().unwrap();
        let store = SidecarStore::new(dir.path());
        let id = PasteId::from("abcde");

        store.put(&id, ATTR_LANGUAGE, "rust").unwrap();
        store.put(&id, ATTR_HMAC, "tag").unwrap();

        assert_eq!(store.get(&id, ATTR_LANGUAGE).unwrap().as_deref(), Some("rust"));
        assert_eq!(store.get(&id, ATTR_HMAC).unwrap().as_deref(), Some("tag"));
        assert_eq!(store.get(&id, ATTR_IV).unwrap(), None);
    }

    #[test]
    fn put_overwrites_previous_value() {
        let dir = tempdir().unwrap();
        let store = SidecarStore::new(dir.path());
        let id = PasteId::from("abcde");

        store.put(&id, ATTR_LANGUAGE, "text").unwrap();
        store.put(&id, ATTR_LANGUAGE, "go").unwrap();
        assert_eq!(store.get(&id, ATTR_LANGUAGE).unwrap().as_deref(), Some("go"));
    }

    #[test]
    fn survives_independent_store_instances() {
        let dir = tempdir().unwrap();
        let id = PasteId::from("abcde");

        SidecarStore::new(dir.path())
            .put(&id, ATTR_LANGUAGE, "python")
            .unwrap();

        let second = SidecarStore::new(dir.path());
        assert_eq!(
            second.get(&id, ATTR_LANGUAGE).unwrap().as_deref(),
            Some("python")
        );
    }

    proptest! {
        #[test]
        fn arbitrary_maps_roundtrip(
            entries in prop::collection::btree_map(".{0,20}", ".{0,40}", 0..8)
        ) {
            let mut attrs = AttrMap::new();
            for (name, value) in &entries {
                attrs.set(name.clone(), value.clone());
            }
            let decoded = AttrMap::decode(&attrs.encode()).unwrap();
            prop_assert_eq!(decoded, attrs);
        }
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = SidecarStore::new(dir.path());
        let id = PasteId::from("abcde");

        store.put(&id, ATTR_LANGUAGE, "text").unwrap();
        store.remove(&id).unwrap();
        store.remove(&id).unwrap();
        assert!(store.load(&id).unwrap().is_empty());
    }
}
