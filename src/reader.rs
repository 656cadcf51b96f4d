//! The event-dispatching MIDI file reader
//!
//! [`Reader`] consumes a [`ByteSource`] one byte at a time, reconstructs the
//! chunk and event structure, and invokes an [`EventHandler`] once per
//! decoded event. The protocol-level state (running status, the remaining
//! byte count of the current chunk, sysex continuation) lives in the
//! reader value itself, so independent passes never share anything.
//!
//! The failure policy is fail-fast: the first malformed byte, premature end
//! of input or handler error aborts the whole pass. No resynchronization on
//! bad bytes is attempted; retrying with a fresh source is the caller's
//! decision.

use crate::{
    chunk,
    error::{CodecError, ErrorKind},
    handler::{EventHandler, HandlerError},
    header::{Division, Format},
    meta,
    source::ByteSource,
};

/// Data bytes required by a channel message, indexed by the high nibble of
/// its status byte. Zero marks the nibbles that are not channel messages.
const CHANNEL_DATA_LEN: [u8; 16] = [
    0, 0, 0, 0, 0, 0, 0, 0, // 0x0x through 0x7x are data bytes, not statuses
    2, 2, 2, 2, 1, 1, 2, 0, // 0x8x through 0xFx
];

/// Reads one MIDI file from `source`, dispatching every event to `handler`.
///
/// An empty source is not an error; end of input at any later chunk
/// boundary simply ends the file.
pub fn read_file<SOURCE, HANDLER>(source: SOURCE, handler: &mut HANDLER) -> Result<(), CodecError>
where
    SOURCE: ByteSource,
    HANDLER: EventHandler,
{
    Reader::new(source).read(handler)
}

/// A single read pass over one byte source
pub struct Reader<SOURCE> {
    /// Where bytes come from
    source: SOURCE,
    /// Bytes consumed so far, reported in errors
    offset: u64,
    /// Declared bytes of the current chunk not yet consumed
    to_be_read: u32,
    /// Ticks elapsed since the start of the current track
    current_time: u32,
    /// Scratch buffer for sysex and meta payloads, cleared between events
    /// but never shrunk, so collection stops allocating once the largest
    /// payload of the pass has been seen
    scratch: Vec<u8>,
    /// Whether continued sysex fragments are collapsed into one dispatch
    merge_sysex: bool,
}

impl<SOURCE: ByteSource> Reader<SOURCE> {
    /// Creates a reader over a byte source. Sysex continuation merging is
    /// enabled by default.
    pub fn new(source: SOURCE) -> Self {
        Self {
            source,
            offset: 0,
            to_be_read: 0,
            current_time: 0,
            scratch: Vec::new(),
            merge_sysex: true,
        }
    }

    /// Chooses whether a sysex message split across `0xF0`/`0xF7` fragments
    /// is dispatched once with the concatenated payload (`true`) or once
    /// per fragment exactly as framed (`false`)
    pub fn merge_sysex(mut self, merge: bool) -> Self {
        self.merge_sysex = merge;
        self
    }

    /// Ticks since the start of the most recent track: the running sum of
    /// every delta time read so far
    pub fn current_time(&self) -> u32 {
        self.current_time
    }

    /// Runs the pass to completion: header chunk, then track chunks until
    /// the source is exhausted
    pub fn read<HANDLER: EventHandler>(&mut self, handler: &mut HANDLER) -> Result<(), CodecError> {
        if !self.read_header(handler)? {
            return Ok(());
        }
        while self.read_track(handler)? {}
        Ok(())
    }

    /// Stamps an error kind with the current stream offset
    fn fail(&self, kind: ErrorKind) -> CodecError {
        CodecError::new(self.offset, kind)
    }

    /// Converts a handler refusal into the pass-aborting error
    fn dispatched(&self, result: Result<(), HandlerError>) -> Result<(), CodecError> {
        result.map_err(|e| self.fail(ErrorKind::Handler(e)))
    }

    /// Pulls one byte; `None` is a clean end of input
    fn next_byte(&mut self) -> Result<Option<u8>, CodecError> {
        match self.source.next_byte() {
            Ok(Some(byte)) => {
                self.offset += 1;
                Ok(Some(byte))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(self.fail(ErrorKind::Source(e))),
        }
    }

    /// Pulls one byte, failing if the source is exhausted mid-field
    fn require_byte(&mut self) -> Result<u8, CodecError> {
        self.next_byte()?
            .ok_or_else(|| self.fail(ErrorKind::UnexpectedEndOfInput))
    }

    /// Pulls one byte of chunk content, deducting it from the declared
    /// chunk length
    fn chunk_byte(&mut self) -> Result<u8, CodecError> {
        let byte = self.require_byte()?;
        self.to_be_read = self.to_be_read.saturating_sub(1);
        Ok(byte)
    }

    /// Two chunk bytes, big-endian
    fn read_u16(&mut self) -> Result<u16, CodecError> {
        let high = self.chunk_byte()?;
        let low = self.chunk_byte()?;
        Ok(u16::from_be_bytes([high, low]))
    }

    /// Four chunk bytes, big-endian
    fn read_u32(&mut self) -> Result<u32, CodecError> {
        let mut value = 0u32;
        for _ in 0..4 {
            value = (value << 8) | self.chunk_byte()? as u32;
        }
        Ok(value)
    }

    /// One variable-length quantity from the chunk content
    fn read_varint(&mut self) -> Result<u32, CodecError> {
        let mut byte = self.chunk_byte()?;
        let mut value = (byte & 0x7F) as u32;
        while byte & 0x80 != 0 {
            byte = self.chunk_byte()?;
            value = (value << 7) | (byte & 0x7F) as u32;
        }
        Ok(value)
    }

    /// Matches a 4-byte chunk tag. `Ok(false)` means the source ended
    /// cleanly before the tag began, so there are no more chunks. A partial
    /// tag is a premature end of input; four bytes that are not the tag are
    /// a malformed chunk.
    fn expect_tag(&mut self, tag: &[u8; 4], expected: &'static str) -> Result<bool, CodecError> {
        for (index, &want) in tag.iter().enumerate() {
            match self.next_byte()? {
                None if index == 0 => return Ok(false),
                None => return Err(self.fail(ErrorKind::UnexpectedEndOfInput)),
                Some(got) if got == want => {}
                Some(_) => return Err(self.fail(ErrorKind::MalformedChunkTag { expected })),
            }
        }
        Ok(true)
    }

    /// Reads the header chunk and dispatches it. `Ok(false)` on an empty
    /// source. Headers declaring more than the six known bytes have the
    /// surplus skipped for forward compatibility.
    fn read_header<HANDLER: EventHandler>(
        &mut self,
        handler: &mut HANDLER,
    ) -> Result<bool, CodecError> {
        if !self.expect_tag(&chunk::HEADER_TAG, "MThd")? {
            return Ok(false);
        }

        self.to_be_read = self.read_u32()?;
        let format = self.read_u16()?;
        let track_count = self.read_u16()?;
        let division = Division::from_raw(self.read_u16()?);

        let format = Format::try_from(format)
            .map_err(|_| self.fail(ErrorKind::ValueOutOfRange("header format must be 0, 1 or 2")))?;

        self.dispatched(handler.header(format, track_count, division))?;

        while self.to_be_read > 0 {
            self.chunk_byte()?;
        }
        Ok(true)
    }

    /// Reads one track chunk and dispatches its events. `Ok(false)` once
    /// the source ends instead of producing another track.
    fn read_track<HANDLER: EventHandler>(
        &mut self,
        handler: &mut HANDLER,
    ) -> Result<bool, CodecError> {
        if !self.expect_tag(&chunk::TRACK_TAG, "MTrk")? {
            return Ok(false);
        }

        self.to_be_read = self.read_u32()?;
        self.current_time = 0;

        // running status never carries across track boundaries
        let mut running_status: Option<u8> = None;
        let mut sysex_pending = false;
        let mut pending_delta = 0u32;

        self.dispatched(handler.track_start())?;

        while self.to_be_read > 0 {
            let delta = self.read_varint()?;
            self.current_time = self.current_time.wrapping_add(delta);

            let byte = self.chunk_byte()?;

            if sysex_pending && byte != 0xF7 {
                return Err(self.fail(ErrorKind::ProtocolViolation(
                    "expected the continuation of an unterminated sysex",
                )));
            }

            // a clear high bit is a data byte reusing the running status
            let (status, first_data) = if byte & 0x80 == 0 {
                match running_status {
                    Some(status) => (status, Some(byte)),
                    None => {
                        return Err(self.fail(ErrorKind::ProtocolViolation(
                            "running status used before any status byte",
                        )))
                    }
                }
            } else {
                if byte < 0xF0 {
                    running_status = Some(byte);
                }
                (byte, None)
            };

            let needed = CHANNEL_DATA_LEN[(status >> 4) as usize];
            if needed > 0 {
                let first = match first_data {
                    Some(byte) => byte,
                    None => self.chunk_byte()?,
                };
                let second = if needed > 1 { self.chunk_byte()? } else { 0 };
                self.channel_message(handler, delta, status, first, second)?;
                continue;
            }

            match status {
                0xFF => {
                    let kind = self.chunk_byte()?;
                    let length = self.read_varint()?;
                    self.scratch.clear();
                    for _ in 0..length {
                        let byte = self.chunk_byte()?;
                        self.scratch.push(byte);
                    }
                    self.meta_event(handler, delta, kind)?;
                }

                0xF0 => {
                    let length = self.read_varint()?;
                    self.scratch.clear();
                    self.scratch.push(0xF0);
                    let mut last = 0xF0;
                    for _ in 0..length {
                        last = self.chunk_byte()?;
                        self.scratch.push(last);
                    }
                    if last == 0xF7 || !self.merge_sysex {
                        self.dispatched(handler.sysex(delta, &self.scratch))?;
                    } else {
                        sysex_pending = true;
                        pending_delta = delta;
                    }
                }

                0xF7 => {
                    let length = self.read_varint()?;
                    if !sysex_pending {
                        self.scratch.clear();
                    }
                    let mut last = 0xF7;
                    for _ in 0..length {
                        last = self.chunk_byte()?;
                        self.scratch.push(last);
                    }
                    if !sysex_pending {
                        self.dispatched(handler.arbitrary(delta, &self.scratch))?;
                    } else {
                        pending_delta = pending_delta.wrapping_add(delta);
                        if last == 0xF7 {
                            self.dispatched(handler.sysex(pending_delta, &self.scratch))?;
                            sysex_pending = false;
                        }
                    }
                }

                other => return Err(self.fail(ErrorKind::UnexpectedByte(other))),
            }
        }

        self.dispatched(handler.track_end())?;
        Ok(true)
    }

    /// Dispatches a channel message to the handler method matching its
    /// status nibble
    fn channel_message<HANDLER: EventHandler>(
        &mut self,
        handler: &mut HANDLER,
        delta: u32,
        status: u8,
        data1: u8,
        data2: u8,
    ) -> Result<(), CodecError> {
        let channel = status & 0x0F;
        let result = match status & 0xF0 {
            0x80 => handler.note_off(delta, channel, data1, data2),
            0x90 => handler.note_on(delta, channel, data1, data2),
            0xA0 => handler.poly_pressure(delta, channel, data1, data2),
            0xB0 => handler.control_change(delta, channel, data1, data2),
            0xC0 => handler.program_change(delta, channel, data1),
            0xD0 => handler.channel_pressure(delta, channel, data1),
            0xE0 => handler.pitch_bend(delta, channel, data1, data2),
            _ => Ok(()),
        };
        self.dispatched(result)
    }

    /// Dispatches the meta event whose payload sits in the scratch buffer
    fn meta_event<HANDLER: EventHandler>(
        &mut self,
        handler: &mut HANDLER,
        delta: u32,
        kind: u8,
    ) -> Result<(), CodecError> {
        let data = &self.scratch;

        // fixed-size metas must actually carry their fixed fields; indexing
        // a shorter payload would fabricate values the file never contained
        let result = match kind {
            meta::SEQUENCE_NUMBER => {
                if data.len() < 2 {
                    return Err(self.fail(ErrorKind::ProtocolViolation(
                        "sequence number meta event shorter than 2 bytes",
                    )));
                }
                handler.sequence_number(delta, u16::from_be_bytes([data[0], data[1]]))
            }

            meta::TEXT..=meta::TEXT_FAMILY_END => handler.text(delta, kind, data),

            meta::END_OF_TRACK => handler.end_of_track(delta),

            meta::SET_TEMPO => {
                if data.len() < 3 {
                    return Err(self.fail(ErrorKind::ProtocolViolation(
                        "tempo meta event shorter than 3 bytes",
                    )));
                }
                let micros = ((data[0] as u32) << 16) | ((data[1] as u32) << 8) | data[2] as u32;
                handler.tempo(delta, micros)
            }

            meta::SMPTE_OFFSET => {
                if data.len() < 5 {
                    return Err(self.fail(ErrorKind::ProtocolViolation(
                        "SMPTE offset meta event shorter than 5 bytes",
                    )));
                }
                handler.smpte_offset(delta, data[0], data[1], data[2], data[3], data[4])
            }

            meta::TIME_SIGNATURE => {
                if data.len() < 4 {
                    return Err(self.fail(ErrorKind::ProtocolViolation(
                        "time signature meta event shorter than 4 bytes",
                    )));
                }
                handler.time_signature(delta, data[0], data[1], data[2], data[3])
            }

            meta::KEY_SIGNATURE => {
                if data.len() < 2 {
                    return Err(self.fail(ErrorKind::ProtocolViolation(
                        "key signature meta event shorter than 2 bytes",
                    )));
                }
                handler.key_signature(delta, data[0] as i8, data[1] != 0)
            }

            meta::SEQUENCER_SPECIFIC => handler.sequencer_specific(delta, data),

            _ => handler.meta_misc(delta, kind, data),
        };

        result.map_err(|e| self.fail(ErrorKind::Handler(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::{read_file, Reader};
    use crate::{
        error::ErrorKind,
        handler::{EventHandler, HandlerError},
        header::{Division, Format},
    };

    /// Minimal file builder for handcrafted track content
    fn file_with_track(events: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"MThd");
        bytes.extend_from_slice(&6u32.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&96u16.to_be_bytes());
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(events.len() as u32).to_be_bytes());
        bytes.extend_from_slice(events);
        bytes
    }

    #[test]
    fn empty_input_is_a_clean_read() {
        assert!(read_file(Vec::new().into_iter(), &mut ()).is_ok());
    }

    #[test]
    fn garbage_tag_is_malformed() {
        let err = read_file(b"RIFF".to_vec().into_iter(), &mut ()).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::MalformedChunkTag { expected: "MThd" }
        ));
    }

    #[test]
    fn truncated_tag_is_premature_end() {
        let err = read_file(b"MT".to_vec().into_iter(), &mut ()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedEndOfInput));
    }

    #[test]
    fn header_is_dispatched_and_surplus_bytes_skipped() {
        struct Headers(Vec<(Format, u16, Division)>);
        impl EventHandler for Headers {
            fn header(
                &mut self,
                format: Format,
                track_count: u16,
                division: Division,
            ) -> Result<(), HandlerError> {
                self.0.push((format, track_count, division));
                Ok(())
            }
        }

        // header declaring 8 bytes: the two surplus bytes must be skipped
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"MThd");
        bytes.extend_from_slice(&8u32.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&2u16.to_be_bytes());
        bytes.extend_from_slice(&384u16.to_be_bytes());
        bytes.extend_from_slice(&[0xAA, 0xBB]);

        let mut handler = Headers(Vec::new());
        read_file(bytes.into_iter(), &mut handler).unwrap();
        assert_eq!(handler.0, vec![(Format::One, 2, Division::Metrical(384))]);
    }

    #[test]
    fn running_status_without_status_byte_fails() {
        // delta 0, then a data byte with no status ever established
        let bytes = file_with_track(&[0x00, 0x3C, 0x64]);
        let err = read_file(bytes.into_iter(), &mut ()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ProtocolViolation(_)));
    }

    #[test]
    fn unknown_opcode_is_reported_with_its_value() {
        let bytes = file_with_track(&[0x00, 0xF4]);
        let err = read_file(bytes.into_iter(), &mut ()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedByte(0xF4)));
    }

    #[test]
    fn truncated_meta_payload_is_premature_end() {
        // tempo meta declares 3 payload bytes but the source ends after 1
        let bytes = file_with_track(&[0x00, 0xFF, 0x51, 0x03, 0x07]);
        let err = read_file(bytes.into_iter(), &mut ()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedEndOfInput));
    }

    #[test]
    fn short_fixed_size_meta_is_a_protocol_violation() {
        // key signature with a declared length of 1
        let bytes = file_with_track(&[0x00, 0xFF, 0x59, 0x01, 0x02, 0x00, 0xFF, 0x2F, 0x00]);
        let err = read_file(bytes.into_iter(), &mut ()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ProtocolViolation(_)));
    }

    #[test]
    fn current_time_accumulates_deltas_per_track() {
        let bytes = file_with_track(&[
            0x60, 0x90, 0x3C, 0x64, // delta 96, note on
            0x81, 0x40, 0x80, 0x3C, 0x00, // delta 192, note off
            0x00, 0xFF, 0x2F, 0x00, // end of track
        ]);
        let mut reader = Reader::new(bytes.into_iter());
        reader.read(&mut ()).unwrap();
        assert_eq!(reader.current_time(), 288);
    }

    #[test]
    fn handler_errors_abort_the_pass() {
        struct FailOnNote;
        impl EventHandler for FailOnNote {
            fn note_on(&mut self, _: u32, _: u8, _: u8, _: u8) -> Result<(), HandlerError> {
                Err("saw a note".into())
            }
        }

        let bytes = file_with_track(&[0x00, 0x90, 0x3C, 0x64, 0x00, 0xFF, 0x2F, 0x00]);
        let err = read_file(bytes.into_iter(), &mut FailOnNote).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Handler(_)));
    }
}
