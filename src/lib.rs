//! # smfio
//!
//! A streaming codec for the Standard MIDI File (SMF) binary format,
//! built around the two halves of the wire protocol that carry real state:
//!
//! - **[`Reader`]** consumes a byte source with no lookahead, undoing the
//!   format's stateful compression schemes (running status, variable
//!   length quantities, continued sysex fragments) and dispatches each
//!   decoded event to an [`EventHandler`].
//! - **[`Writer`]** is driven one event at a time, applies running-status
//!   suppression, and backpatches each track chunk's length field once the
//!   content of unknown size has been emitted.
//!
//! Neither half touches files directly: the reader consumes any
//! [`ByteSource`] (any `Iterator<Item = u8>`, or [`IoSource`] around a
//! [`std::io::Read`]) and the writer drives any [`ByteSink`] (anything
//! `Write + Seek`, such as a [`std::io::Cursor`] or a `File`). Lexing,
//! CLI handling and playback timing belong to callers.
//!
//! ## Example
//!
//! ```rust
//! use std::io::Cursor;
//! use smfio::{read_file, ChannelKind, CodecError, Division, EventHandler, Format, Writer};
//!
//! # fn main() -> Result<(), CodecError> {
//! // write a one-track file into memory
//! let mut writer = Writer::new(Cursor::new(Vec::new()));
//! writer.write_file(Format::Zero, 1, Division::Metrical(96), |track, _| {
//!     track.channel_event(0, ChannelKind::NoteOn, 0, &[60, 100])?;
//!     track.channel_event(96, ChannelKind::NoteOff, 0, &[60, 0])
//! })?;
//! let bytes = writer.into_inner().into_inner();
//!
//! // read it back, counting the notes
//! #[derive(Default)]
//! struct NoteCounter(u32);
//! impl EventHandler for NoteCounter {
//!     fn note_on(&mut self, _: u32, _: u8, _: u8, _: u8) -> Result<(), smfio::HandlerError> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//!
//! let mut counter = NoteCounter::default();
//! read_file(bytes.into_iter(), &mut counter)?;
//! assert_eq!(counter.0, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Library structure
//!
//! - **[`reader`]** and **[`writer`]**: the two stateful passes.
//! - **[`handler`]**: the observer surface the reader dispatches into;
//!   every method defaults to a no-op, and an unimplemented event is still
//!   parsed byte-exactly before being discarded.
//! - **[`source`]** and **[`sink`]**: the byte-stream abstractions the
//!   passes consume.
//! - **[`vlq`]**, **[`chunk`]**, **[`meta`]**, **[`header`]**: the shared
//!   wire alphabet of variable-length quantities, chunk tags, meta type
//!   bytes and the header field types.
//! - **[`error`]**: the single error channel; every failure is terminal to
//!   its pass and carries the byte offset where it was raised.

pub mod chunk;
pub mod error;
pub mod handler;
pub mod header;
pub mod meta;
pub mod reader;
pub mod sink;
pub mod source;
pub mod vlq;
pub mod writer;

pub use error::{CodecError, ErrorKind};
pub use handler::{EventHandler, HandlerError};
pub use header::{Division, Format, InvalidFormat};
pub use reader::{read_file, Reader};
pub use sink::ByteSink;
pub use source::{ByteSource, IoSource};
pub use writer::{ChannelKind, Writer};
