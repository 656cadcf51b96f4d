//! Error types shared by the reader and writer
//!
//! Every failure is terminal to the current read or write pass. The first
//! error encountered stops all further processing and is reported once,
//! carrying the byte offset into the stream so the offending record can be
//! located with a hex dump.

use thiserror::Error;

use crate::handler::HandlerError;

/// An error raised during a read or write pass, located by byte offset.
#[derive(Debug, Error)]
#[error("{kind} at byte offset {offset}")]
pub struct CodecError {
    /// Offset in bytes from the start of the source or sink stream
    offset: u64,
    /// What went wrong
    kind: ErrorKind,
}

impl CodecError {
    /// Attaches a stream offset to an error kind
    pub(crate) fn new(offset: u64, kind: ErrorKind) -> Self {
        Self { offset, kind }
    }

    /// Byte offset at which the error was raised
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The kind of failure
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

/// The kinds of failure a codec pass can report
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The byte source was exhausted in the middle of a field
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    /// A chunk began with something other than the expected 4-byte tag
    #[error("expected `{expected}` chunk tag")]
    MalformedChunkTag {
        /// The tag that should have been present
        expected: &'static str,
    },
    /// The stream violated a stateful rule of the format, such as running
    /// status before any status byte or a missing sysex continuation
    #[error("{0}")]
    ProtocolViolation(&'static str),
    /// An opcode byte outside the recognized ranges
    #[error("unexpected byte {0:#04x}")]
    UnexpectedByte(u8),
    /// A caller-supplied value does not fit its wire field
    #[error("value out of range: {0}")]
    ValueOutOfRange(&'static str),
    /// The byte source reported an I/O failure
    #[error("byte source failure")]
    Source(#[source] std::io::Error),
    /// The byte sink reported an I/O failure
    #[error("byte sink failure")]
    Sink(#[source] std::io::Error),
    /// An event handler signalled a fatal error, aborting the pass
    #[error("event handler failure")]
    Handler(#[source] HandlerError),
}
