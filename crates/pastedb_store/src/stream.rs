//! Content stream wrappers.
//!
//! Readers and writers compose the raw content stream with an optional
//! cipher layer. Resource release is RAII: dropping a stream closes the
//! underlying handle on every exit path, including error paths.

use crate::crypto::Aes256Ofb;
use crate::error::StoreResult;
use crate::paste::Paste;
use crate::store::PasteStore;
use ofb::cipher::StreamCipher;
use std::io::{self, Read, Write};
use tracing::warn;

/// Raw destination for content bytes, supplied by a store.
///
/// `commit` makes the written content durable (fsync for files, buffer
/// publish for the in-memory store) and records the write's IV in the
/// metadata side-channel when one was generated.
pub(crate) trait RawSink: Write + Send {
    fn commit(&mut self) -> StoreResult<()>;
}

/// Read stream over a paste's content.
///
/// When the paste is encrypted, bytes are deciphered transparently as they
/// are read; partial reads of arbitrary length are supported.
pub struct PasteReader {
    inner: Box<dyn Read + Send>,
    cipher: Option<Aes256Ofb>,
}

impl PasteReader {
    pub(crate) fn new(inner: Box<dyn Read + Send>, cipher: Option<Aes256Ofb>) -> Self {
        Self { inner, cipher }
    }
}

impl Read for PasteReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if let Some(cipher) = &mut self.cipher {
            cipher.apply_keystream(&mut buf[..n]);
        }
        Ok(n)
    }
}

/// Write stream over a paste's content.
///
/// When the paste is encrypted, bytes are enciphered transparently as they
/// are written. The writer borrows its store so that [`finish`] can commit
/// the content and then persist the paste's metadata - content becomes
/// durable before metadata, so a crash between the two steps leaves an
/// orphaned content unit rather than metadata pointing at missing content.
///
/// [`finish`]: PasteWriter::finish
pub struct PasteWriter<'s> {
    sink: Box<dyn RawSink>,
    cipher: Option<Aes256Ofb>,
    store: &'s dyn PasteStore,
    paste: Paste,
    finished: bool,
}

impl<'s> PasteWriter<'s> {
    pub(crate) fn new(
        sink: Box<dyn RawSink>,
        cipher: Option<Aes256Ofb>,
        store: &'s dyn PasteStore,
        paste: Paste,
    ) -> Self {
        Self {
            sink,
            cipher,
            store,
            paste,
            finished: false,
        }
    }

    /// The paste this writer belongs to.
    #[must_use]
    pub fn paste(&self) -> &Paste {
        &self.paste
    }

    /// Completes the write: flushes and commits the raw stream, then
    /// persists the paste's metadata.
    ///
    /// Dropping a writer without finishing releases the file handle but
    /// persists nothing, leaving the unit in the same state a crash
    /// mid-write would.
    pub fn finish(mut self) -> StoreResult<()> {
        self.sink.flush()?;
        self.sink.commit()?;
        self.finished = true;
        self.store.persist(&self.paste)
    }
}

impl Write for PasteWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.cipher {
            Some(cipher) => {
                let mut chunk = buf.to_vec();
                cipher.apply_keystream(&mut chunk);
                self.sink.write_all(&chunk)?;
            }
            None => self.sink.write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

impl Drop for PasteWriter<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(id = %self.paste.id(), "paste writer dropped without finish; metadata not persisted");
        }
    }
}
