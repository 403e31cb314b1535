//! # PasteDB Store
//!
//! Persistence abstraction for short, identifiable text blobs ("pastes"),
//! each optionally protected by a caller-supplied symmetric key. This crate
//! is the storage backend for a pastebin-style service: callers create a
//! paste, stream content into or out of it, tag it with a language label,
//! and later destroy it.
//!
//! ## Design
//!
//! - [`PasteId`] - short opaque identifiers from a restricted base32
//!   alphabet
//! - [`PasteStore`] - the polymorphic contract: create, fetch, persist,
//!   destroy, and content streams
//! - [`FilesystemPasteStore`] - one content file per paste plus a sidecar
//!   metadata record; content bytes carry no framing
//! - [`InMemoryPasteStore`] - same contract without a filesystem, for tests
//! - [`EncryptionKey`] - per-paste AES-256 key, held only in memory; the
//!   store persists an HMAC over the identifier so a key can be verified
//!   without decrypting content and without ever storing the key
//!
//! HTTP routing, rendering and request validation live outside this crate;
//! the front-end collaborates purely through the [`PasteStore`] contract.
//!
//! ## Example
//!
//! ```no_run
//! use pastedb_store::{EncryptionKey, FilesystemPasteStore, PasteId, PasteStore};
//! use std::io::{Read, Write};
//!
//! # fn main() -> pastedb_store::StoreResult<()> {
//! let store = FilesystemPasteStore::new("/var/lib/pastes")?;
//!
//! let id = PasteId::generate()?;
//! let key = EncryptionKey::generate();
//! let paste = store.create(id.clone(), Some(key.clone()));
//!
//! let mut writer = store.open_write_stream(&paste)?;
//! writer.write_all(b"fn main() {}")?;
//! writer.finish()?;
//!
//! let fetched = store.fetch(id, Some(key))?;
//! let mut content = String::new();
//! store.open_read_stream(&fetched)?.read_to_string(&mut content)?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod crypto;
mod error;
mod fs;
mod id;
mod memory;
mod meta;
mod paste;
mod store;
mod stream;

pub use crypto::{EncryptionKey, ENCRYPTION_VERSION, IV_SIZE, KEY_SIZE, TAG_SIZE};
pub use error::{StoreError, StoreResult};
pub use fs::FilesystemPasteStore;
pub use id::{PasteId, ID_ALPHABET, ID_LENGTH};
pub use memory::InMemoryPasteStore;
pub use meta::{
    AttrMap, SidecarStore, ATTR_ENCRYPTION_VERSION, ATTR_HMAC, ATTR_IV, ATTR_LANGUAGE,
    DEFAULT_LANGUAGE,
};
pub use paste::Paste;
pub use store::{PasteCallback, PasteStore};
pub use stream::{PasteReader, PasteWriter};
