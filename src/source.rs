//! Byte-source abstraction consumed by the reader
//!
//! The reader pulls input one byte at a time: the format interleaves
//! variably-sized records that must be parsed without lookahead, so nothing
//! wider than a single byte is ever requested. End of input is an ordinary
//! outcome at a chunk boundary and a fatal one mid-field; that distinction
//! is made by the reader, not here.

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

/// A pull-based stream of bytes feeding a read pass
pub trait ByteSource {
    /// Produces the next byte, `Ok(None)` once the input is exhausted, or
    /// an I/O error if the underlying transport failed
    fn next_byte(&mut self) -> io::Result<Option<u8>>;
}

impl<ITER: Iterator<Item = u8>> ByteSource for ITER {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.next())
    }
}

/// Adapter exposing any [`Read`] implementor as a [`ByteSource`],
/// propagating I/O failures instead of flattening them into end-of-input
pub struct IoSource<READ> {
    /// The wrapped reader
    inner: READ,
}

impl<READ: Read> IoSource<READ> {
    /// Wraps a reader. Wrap a [`BufReader`] around raw files first; every
    /// byte is fetched with a separate `read` call.
    pub fn new(inner: READ) -> Self {
        Self { inner }
    }

    /// Returns the wrapped reader
    pub fn into_inner(self) -> READ {
        self.inner
    }
}

impl IoSource<BufReader<File>> {
    /// Opens a file on disk as a buffered byte source
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<READ: Read> ByteSource for IoSource<READ> {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            return match self.inner.read(&mut buf) {
                Ok(0) => Ok(None),
                Ok(_) => Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => Err(e),
            };
        }
    }
}
