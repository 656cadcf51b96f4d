//! Byte-sink abstraction consumed by the writer
//!
//! A track chunk's length is unknown until its content has been emitted, so
//! the writer needs more than append: it records the position of the length
//! field, emits the content, then seeks back and patches the field. A sink
//! that can only append cannot host a write pass; buffer into a
//! [`std::io::Cursor`] and flush afterwards if the destination is
//! append-only.

use std::io::{self, Seek, SeekFrom, Write};

/// A positioned, rewritable stream of bytes receiving a write pass
pub trait ByteSink {
    /// Appends one byte at the current position
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    /// The current position, in bytes from the start of the stream
    fn position(&mut self) -> io::Result<u64>;

    /// Moves the write position, measured from the start of the stream
    fn seek_to(&mut self, position: u64) -> io::Result<()>;
}

impl<SINK: Write + Seek> ByteSink for SINK {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.write_all(&[byte])
    }

    fn position(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    fn seek_to(&mut self, position: u64) -> io::Result<()> {
        self.seek(SeekFrom::Start(position)).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::ByteSink;
    use std::io::Cursor;

    #[test]
    fn cursor_supports_rewrite() {
        let mut sink = Cursor::new(Vec::new());
        for byte in [1u8, 2, 3, 4] {
            sink.write_byte(byte).unwrap();
        }
        // call through the trait; `Cursor` has an inherent `position` too
        assert_eq!(ByteSink::position(&mut sink).unwrap(), 4);

        sink.seek_to(1).unwrap();
        sink.write_byte(9).unwrap();
        sink.seek_to(4).unwrap();

        assert_eq!(sink.into_inner(), vec![1, 9, 3, 4]);
    }
}
