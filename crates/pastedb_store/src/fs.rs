//! Filesystem-backed paste store.

use crate::crypto::{self, EncryptionKey, ENCRYPTION_VERSION, IV_SIZE};
use crate::error::{StoreError, StoreResult};
use crate::id::PasteId;
use crate::meta::{
    SidecarStore, ATTR_ENCRYPTION_VERSION, ATTR_HMAC, ATTR_IV, ATTR_LANGUAGE, DEFAULT_LANGUAGE,
};
use crate::paste::Paste;
use crate::store::{noop_callback, PasteCallback, PasteStore};
use crate::stream::{PasteReader, PasteWriter, RawSink};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A paste store keeping one content file per identifier under a root
/// directory, with structured metadata in a sidecar record per unit.
///
/// Content bytes on disk are exactly the plaintext or ciphertext of the
/// payload - no header, no framing. All operations are synchronous,
/// blocking filesystem calls; concurrent access to the same identifier is
/// last-writer-wins.
///
/// # Example
///
/// ```no_run
/// use pastedb_store::{FilesystemPasteStore, PasteId, PasteStore};
/// use std::io::Write;
///
/// let store = FilesystemPasteStore::new("/var/lib/pastes").unwrap();
/// let id = PasteId::generate().unwrap();
/// let paste = store.create(id, None);
/// let mut writer = store.open_write_stream(&paste).unwrap();
/// writer.write_all(b"hello").unwrap();
/// writer.finish().unwrap();
/// ```
pub struct FilesystemPasteStore {
    root: PathBuf,
    attrs: SidecarStore,
    update_callback: PasteCallback,
    destroy_callback: PasteCallback,
}

impl FilesystemPasteStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            attrs: SidecarStore::new(&root),
            root,
            update_callback: noop_callback(),
            destroy_callback: noop_callback(),
        })
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

    /// Returns the store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the content file for an identifier.
    ///
    /// Identifiers arrive from the outside (URL paths), so anything that
    /// could escape the root directory is rejected before touching the
    /// filesystem.
    fn unit_path(&self, id: &PasteId) -> StoreResult<PathBuf> {
        let safe = !id.as_str().is_empty()
            && id.as_str().bytes().all(|b| b.is_ascii_alphanumeric());
        if !safe {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("identifier {id:?} is not a valid unit name"),
            )
            .into());
        }
        Ok(self.root.join(id.as_str()))
    }
}

impl PasteStore for FilesystemPasteStore {
    fn fetch(&self, id: PasteId, key: Option<EncryptionKey>) -> StoreResult<Paste> {
        let path = self.unit_path(&id)?;
        let stat = match fs::metadata(&path) {
            Ok(stat) => stat,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { id });
            }
            Err(e) => return Err(e.into()),
        };
        let mtime = stat.modified()?;

        let verified_key = match self.attrs.get(&id, ATTR_HMAC)? {
            Some(stored_tag) => {
                let Some(key) = key else {
                    return Err(StoreError::EncryptionRequired { id });
                };
                crypto::check_tag(&id, &stored_tag, &key)?;
                Some(key)
            }
            // No verification tag means the unit is not encrypted; a key
            // supplied anyway is ignored.
            None => None,
        };

        let language = self
            .attrs
            .get(&id, ATTR_LANGUAGE)?
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let paste = Paste::fetched(id, language, verified_key, mtime);
        debug!(id = %paste.id(), encrypted = paste.encrypted(), "fetched paste");
        (self.update_callback)(&paste);
        Ok(paste)
    }

    fn persist(&self, paste: &Paste) -> StoreResult<()> {
        let path = self.unit_path(paste.id())?;
        if !path.exists() {
            return Err(StoreError::NotFound {
                id: paste.id().clone(),
            });
        }

        self.attrs.put(paste.id(), ATTR_LANGUAGE, paste.language())?;
        if let Some(key) = paste.key() {
            let tag = crypto::encoded_tag(paste.id(), key);
            self.attrs.put(paste.id(), ATTR_HMAC, &tag)?;
            self.attrs
                .put(paste.id(), ATTR_ENCRYPTION_VERSION, ENCRYPTION_VERSION)?;
        }

        debug!(id = %paste.id(), "persisted paste metadata");
        (self.update_callback)(paste);
        Ok(())
    }

    fn destroy(&self, paste: &Paste) -> StoreResult<()> {
        let path = self.unit_path(paste.id())?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    id: paste.id().clone(),
                });
            }
            Err(e) => return Err(e.into()),
        }
        self.attrs.remove(paste.id())?;

        debug!(id = %paste.id(), "destroyed paste");
        (self.destroy_callback)(paste);
        Ok(())
    }

    fn open_read_stream(&self, paste: &Paste) -> StoreResult<PasteReader> {
        let path = self.unit_path(paste.id())?;
        let file = File::open(&path)?;

        let cipher = match paste.key() {
            Some(key) => {
                let iv = match self.attrs.get(paste.id(), ATTR_IV)? {
                    Some(encoded) => crypto::decode_iv(&encoded)?,
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

        Ok(PasteReader::new(Box::new(file), cipher))
    }

    fn open_write_stream(&self, paste: &Paste) -> StoreResult<PasteWriter<'_>> {
        let path = self.unit_path(paste.id())?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        let (cipher, iv) = match paste.key() {
            Some(key) => {
                let iv = crypto::generate_iv();
                (Some(crypto::content_cipher(key, &iv)), Some(iv))
            }
            None => (None, None),
        };

        let sink = FileSink {
            file,
            attrs: self.attrs.clone(),
            id: paste.id().clone(),
            iv,
        };
        Ok(PasteWriter::new(Box::new(sink), cipher, self, paste.clone()))
    }
}

impl std::fmt::Debug for FilesystemPasteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemPasteStore")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Content sink writing to the unit's file.
struct FileSink {
    file: File,
    attrs: SidecarStore,
    id: PasteId,
    iv: Option<[u8; IV_SIZE]>,
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl RawSink for FileSink {
    fn commit(&mut self) -> StoreResult<()> {
        self.file.sync_all()?;
        if let Some(iv) = self.iv.take() {
            self.attrs.put(&self.id, ATTR_IV, &crypto::encode_iv(&iv))?;
        }
        Ok(())
    }
}
