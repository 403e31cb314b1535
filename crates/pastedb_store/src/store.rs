//! Paste store contract.

use crate::crypto::EncryptionKey;
use crate::error::StoreResult;
use crate::id::PasteId;
use crate::paste::Paste;
use crate::stream::{PasteReader, PasteWriter};

/// Lifecycle callback invoked with the affected paste.
///
/// Stores call the update callback after a successful `fetch` or `persist`
/// and the destroy callback after a successful `destroy`, for use by
/// external indexing or caching collaborators. Defaults are no-ops.
pub type PasteCallback = Box<dyn Fn(&Paste) + Send + Sync>;

pub(crate) fn noop_callback() -> PasteCallback {
    Box::new(|_| {})
}

/// The polymorphic paste storage contract.
///
/// One unit of storage per identifier. Implementations are synchronous and
/// blocking; concurrent operations against distinct identifiers get
/// whatever consistency the backing medium provides, while races on the
/// same identifier are last-writer-wins with no arbitration.
///
/// # Implementors
///
/// - [`FilesystemPasteStore`](crate::fs::FilesystemPasteStore) - persistent
/// - [`InMemoryPasteStore`](crate::memory::InMemoryPasteStore) - tests and
///   ephemeral use
pub trait PasteStore: Send + Sync {
    /// Constructs a paste in memory. Never touches persistent storage.
    ///
    /// The paste is encrypted exactly when `key` is supplied. It becomes
    /// durable the first time a write stream for it is finished.
    fn create(&self, id: PasteId, key: Option<EncryptionKey>) -> Paste {
        Paste::new(id, key)
    }

    /// Fetches the paste stored under `id`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no unit exists for `id`
    /// - [`StoreError::EncryptionRequired`] if the unit carries a
    ///   verification tag and no key was supplied
    /// - [`StoreError::MalformedMetadata`] if the stored tag cannot be
    ///   decoded
    /// - [`StoreError::InvalidKey`] if the supplied key fails verification
    ///
    /// On success the returned paste carries language tag, modification
    /// time and - only if verified - the key, and the update callback has
    /// been invoked.
    ///
    /// [`StoreError::NotFound`]: crate::error::StoreError::NotFound
    /// [`StoreError::EncryptionRequired`]: crate::error::StoreError::EncryptionRequired
    /// [`StoreError::MalformedMetadata`]: crate::error::StoreError::MalformedMetadata
    /// [`StoreError::InvalidKey`]: crate::error::StoreError::InvalidKey
    fn fetch(&self, id: PasteId, key: Option<EncryptionKey>) -> StoreResult<Paste>;

    /// Writes the paste's metadata: the language tag and, for encrypted
    /// pastes, the recomputed verification tag and scheme version marker.
    ///
    /// Persisting unchanged fields twice yields identical metadata.
    /// Invokes the update callback on success.
    fn persist(&self, paste: &Paste) -> StoreResult<()>;

    /// Removes the storage unit for the paste, content and metadata.
    ///
    /// Propagates removal failure; a later fetch of the same identifier
    /// fails `NotFound`. Invokes the destroy callback on success.
    fn destroy(&self, paste: &Paste) -> StoreResult<()>;

    /// Opens the content stream for reading, cipher-unwrapped when the
    /// paste is encrypted.
    fn open_read_stream(&self, paste: &Paste) -> StoreResult<PasteReader>;

    /// Opens the content stream for writing, cipher-wrapped when the paste
    /// is encrypted. Any previous content is truncated.
    ///
    /// The returned writer must be [`finish`](PasteWriter::finish)ed:
    /// finishing commits the content and then persists metadata, in that
    /// order, so a crash in between leaves content without metadata rather
    /// than metadata pointing at missing content.
    fn open_write_stream(&self, paste: &Paste) -> StoreResult<PasteWriter<'_>>;
}
