//! Store fixtures and helpers.
//!
//! Provides convenience functions for setting up temporary stores and
//! streaming whole payloads in tests.

use pastedb_store::{FilesystemPasteStore, Paste, PasteStore};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::TempDir;

/// A filesystem store rooted in a temporary directory with automatic
/// cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: FilesystemPasteStore,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestStore {
    /// Creates a store in a fresh temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store =
            FilesystemPasteStore::new(temp_dir.path()).expect("Failed to open paste store");
        Self { store, temp_dir }
    }

    /// Returns the store's root directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Opens a second, independent store over the same root directory.
    ///
    /// Useful for durability tests: state persisted through one instance
    /// must be visible through a freshly constructed one.
    pub fn reopen(&self) -> FilesystemPasteStore {
        FilesystemPasteStore::new(self.temp_dir.path()).expect("Failed to reopen paste store")
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = FilesystemPasteStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a store in a temporary directory.
///
/// # Example
///
/// ```rust
/// use pastedb_testkit::with_temp_store;
/// use pastedb_store::PasteStore;
///
/// with_temp_store(|store| {
///     let paste = store.create("abcde".into(), None);
///     assert!(!paste.encrypted());
/// });
/// ```
pub fn with_temp_store<F>(f: F)
where
    F: FnOnce(&FilesystemPasteStore),
{
    let test_store = TestStore::new();
    f(&test_store.store);
}

/// Writes a whole payload through a paste's write stream and finishes it.
pub fn write_content(store: &dyn PasteStore, paste: &Paste, content: &[u8]) {
    let mut writer = store
        .open_write_stream(paste)
        .expect("Failed to open write stream");
    writer.write_all(content).expect("Failed to write content");
    writer.finish().expect("Failed to finish write stream");
}

/// Reads a paste's whole content through its read stream.
pub fn read_content(store: &dyn PasteStore, paste: &Paste) -> Vec<u8> {
    let mut reader = store
        .open_read_stream(paste)
        .expect("Failed to open read stream");
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).expect("Failed to read content");
    buf
}
