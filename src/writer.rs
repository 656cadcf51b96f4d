//! The event-encoding MIDI file writer
//!
//! The caller drives a [`Writer`] with one call per event; the writer never
//! looks ahead. A track's length is unknown until its content closure has
//! run, so [`Writer::track`] emits a placeholder `MTrk` header and patches
//! the length field through the sink's seek support once the content is
//! done. That patch is why [`ByteSink`] requires more than append.
//!
//! Any sink failure or out-of-range value aborts the write; bytes already
//! flushed to the sink are then unreliable. Callers needing atomicity
//! should write to a temporary destination and rename on success.

use crate::{
    chunk,
    error::{CodecError, ErrorKind},
    header::{Division, Format},
    meta,
    sink::ByteSink,
    vlq,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The seven channel-message kinds, each pairing a status nibble with its
/// fixed data-byte count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChannelKind {
    /// Note off, two data bytes: key, release velocity
    NoteOff,
    /// Note on, two data bytes: key, velocity
    NoteOn,
    /// Polyphonic key pressure, two data bytes: key, pressure
    PolyPressure,
    /// Control change, two data bytes: controller, value
    ControlChange,
    /// Program change, one data byte
    ProgramChange,
    /// Channel pressure, one data byte
    ChannelPressure,
    /// Pitch bend, two data bytes: lsb, msb
    PitchBend,
}

impl ChannelKind {
    /// The status byte's high nibble, channel bits zero
    pub fn status_nibble(self) -> u8 {
        match self {
            ChannelKind::NoteOff => 0x80,
            ChannelKind::NoteOn => 0x90,
            ChannelKind::PolyPressure => 0xA0,
            ChannelKind::ControlChange => 0xB0,
            ChannelKind::ProgramChange => 0xC0,
            ChannelKind::ChannelPressure => 0xD0,
            ChannelKind::PitchBend => 0xE0,
        }
    }

    /// How many data bytes follow the status byte
    pub fn data_len(self) -> usize {
        match self {
            ChannelKind::ProgramChange | ChannelKind::ChannelPressure => 1,
            _ => 2,
        }
    }
}

/// A single write pass over one byte sink
pub struct Writer<SINK> {
    /// Where bytes go
    sink: SINK,
    /// Bytes pushed through the sink so far, reported in errors
    offset: u64,
    /// Bytes emitted since the current track's header, the value patched
    /// into its length field
    track_bytes: u32,
    /// The last status byte written, for running-status suppression;
    /// `None` after a meta or sysex event and at track start
    running_status: Option<u8>,
    /// Type of the last meta event written, if the last event was one;
    /// lets track finalization see whether end-of-track is already present
    last_meta: Option<u8>,
    /// Whether repeated status bytes are suppressed
    use_running_status: bool,
}

impl<SINK: ByteSink> Writer<SINK> {
    /// Creates a writer over a byte sink. Running-status suppression is
    /// off by default; every channel event carries its status byte.
    pub fn new(sink: SINK) -> Self {
        Self {
            sink,
            offset: 0,
            track_bytes: 0,
            running_status: None,
            last_meta: None,
            use_running_status: false,
        }
    }

    /// Enables or disables running-status suppression for channel events
    pub fn running_status(mut self, enabled: bool) -> Self {
        self.use_running_status = enabled;
        self
    }

    /// Returns the underlying sink
    pub fn into_inner(self) -> SINK {
        self.sink
    }

    /// Stamps an error kind with the current stream offset
    fn fail(&self, kind: ErrorKind) -> CodecError {
        CodecError::new(self.offset, kind)
    }

    /// Pushes one byte through the sink, counting it against the current
    /// track's length
    fn put(&mut self, byte: u8) -> Result<(), CodecError> {
        self.sink
            .write_byte(byte)
            .map_err(|e| CodecError::new(self.offset, ErrorKind::Sink(e)))?;
        self.offset += 1;
        self.track_bytes = self.track_bytes.wrapping_add(1);
        Ok(())
    }

    /// Two bytes, big-endian
    fn put_u16(&mut self, value: u16) -> Result<(), CodecError> {
        for byte in value.to_be_bytes() {
            self.put(byte)?;
        }
        Ok(())
    }

    /// Four bytes, big-endian
    fn put_u32(&mut self, value: u32) -> Result<(), CodecError> {
        for byte in value.to_be_bytes() {
            self.put(byte)?;
        }
        Ok(())
    }

    /// One variable-length quantity in canonical minimal form
    fn put_varint(&mut self, value: u32) -> Result<(), CodecError> {
        for byte in vlq::encode(value) {
            self.put(byte)?;
        }
        Ok(())
    }

    /// Emits the `MThd` chunk: every MIDI file starts with one
    pub fn header(
        &mut self,
        format: Format,
        track_count: u16,
        division: Division,
    ) -> Result<(), CodecError> {
        for byte in chunk::HEADER_TAG {
            self.put(byte)?;
        }
        self.put_u32(chunk::HEADER_LENGTH)?;
        self.put_u16(format.raw())?;
        self.put_u16(track_count)?;
        self.put_u16(division.raw())
    }

    /// Emits one channel event. When running-status suppression is on and
    /// the status byte equals the previous one, the status byte is
    /// omitted. `data` must hold exactly [`ChannelKind::data_len`] bytes.
    pub fn channel_event(
        &mut self,
        delta: u32,
        kind: ChannelKind,
        channel: u8,
        data: &[u8],
    ) -> Result<(), CodecError> {
        if channel > 15 {
            return Err(self.fail(ErrorKind::ValueOutOfRange("channel greater than 15")));
        }
        if data.len() != kind.data_len() {
            return Err(self.fail(ErrorKind::ValueOutOfRange(
                "wrong number of data bytes for this channel message",
            )));
        }

        self.put_varint(delta)?;

        let status = kind.status_nibble() | channel;
        if !self.use_running_status || self.running_status != Some(status) {
            self.put(status)?;
        }
        self.running_status = Some(status);
        self.last_meta = None;

        for &byte in data {
            self.put(byte)?;
        }
        Ok(())
    }

    /// Emits one meta event: `0xFF <kind> <varint length> <payload>`. Meta
    /// events are never status-suppressed, and writing one forces the next
    /// channel event to re-emit its status byte.
    pub fn meta_event(&mut self, delta: u32, kind: u8, payload: &[u8]) -> Result<(), CodecError> {
        let length = u32::try_from(payload.len())
            .map_err(|_| self.fail(ErrorKind::ValueOutOfRange("meta payload longer than 2^32")))?;

        self.put_varint(delta)?;
        self.put(0xFF)?;
        self.put(kind)?;
        self.running_status = None;
        self.last_meta = Some(kind);

        self.put_varint(length)?;
        for &byte in payload {
            self.put(byte)?;
        }
        Ok(())
    }

    /// Emits one sysex (or arbitrary-data) event. `message[0]` must be the
    /// `0xF0` or `0xF7` marker; the varint length covers the bytes after
    /// it. Invalidates running status.
    pub fn sysex_event(&mut self, delta: u32, message: &[u8]) -> Result<(), CodecError> {
        match message.first() {
            Some(0xF0) | Some(0xF7) => {}
            _ => {
                return Err(self.fail(ErrorKind::ValueOutOfRange(
                    "sysex message must begin with 0xF0 or 0xF7",
                )))
            }
        }
        let length = u32::try_from(message.len() - 1)
            .map_err(|_| self.fail(ErrorKind::ValueOutOfRange("sysex payload longer than 2^32")))?;

        self.put_varint(delta)?;
        self.put(message[0])?;
        self.running_status = None;
        self.last_meta = None;

        self.put_varint(length)?;
        for &byte in &message[1..] {
            self.put(byte)?;
        }
        Ok(())
    }

    /// Emits a set-tempo meta event, the value packed into exactly three
    /// big-endian bytes. Tempos above 2^24 - 1 microseconds per quarter
    /// note do not fit the field and fail rather than truncate.
    pub fn tempo(&mut self, delta: u32, micros_per_quarter: u32) -> Result<(), CodecError> {
        if micros_per_quarter > 0x00FF_FFFF {
            return Err(self.fail(ErrorKind::ValueOutOfRange("tempo exceeds 24 bits")));
        }

        self.put_varint(delta)?;
        self.put(0xFF)?;
        self.put(meta::SET_TEMPO)?;
        self.running_status = None;
        self.last_meta = Some(meta::SET_TEMPO);

        self.put(3)?;
        self.put((micros_per_quarter >> 16) as u8)?;
        self.put((micros_per_quarter >> 8) as u8)?;
        self.put(micros_per_quarter as u8)
    }

    /// Writes one track chunk: placeholder header, the caller's content,
    /// an end-of-track meta event if the content did not finish with one,
    /// then the backpatched true length.
    pub fn track<CONTENT>(&mut self, content: CONTENT) -> Result<(), CodecError>
    where
        CONTENT: FnOnce(&mut Self) -> Result<(), CodecError>,
    {
        // remember where the header went; the length is not known yet
        let header_at = self
            .sink
            .position()
            .map_err(|e| self.fail(ErrorKind::Sink(e)))?;

        for byte in chunk::TRACK_TAG {
            self.put(byte)?;
        }
        self.put_u32(0)?;

        // the header's 8 bytes do not count toward the track length
        self.track_bytes = 0;
        self.running_status = None;
        self.last_meta = None;

        content(self)?;

        if self.last_meta != Some(meta::END_OF_TRACK) {
            self.meta_event(0, meta::END_OF_TRACK, &[])?;
        }

        let end = self
            .sink
            .position()
            .map_err(|e| self.fail(ErrorKind::Sink(e)))?;
        let length = self.track_bytes;

        // patch the length field, then restore the append position
        self.sink
            .seek_to(header_at + 4)
            .map_err(|e| self.fail(ErrorKind::Sink(e)))?;
        for byte in length.to_be_bytes() {
            self.sink
                .write_byte(byte)
                .map_err(|e| self.fail(ErrorKind::Sink(e)))?;
        }
        self.sink
            .seek_to(end)
            .map_err(|e| self.fail(ErrorKind::Sink(e)))?;

        self.running_status = None;
        Ok(())
    }

    /// Writes a complete file: the header chunk, then `track_count` tracks
    /// whose content comes from `track_content`, called with each track's
    /// zero-based index
    pub fn write_file<CONTENT>(
        &mut self,
        format: Format,
        track_count: u16,
        division: Division,
        mut track_content: CONTENT,
    ) -> Result<(), CodecError>
    where
        CONTENT: FnMut(&mut Self, u16) -> Result<(), CodecError>,
    {
        self.header(format, track_count, division)?;
        for index in 0..track_count {
            self.track(|writer| track_content(writer, index))?;
        }
        Ok(())
    }

    /// Like [`Writer::write_file`], but for format 1 files the first track
    /// is a distinguished tempo map written from `tempo_track` and deducted
    /// from `track_count`; the remaining tracks come from `track_content`.
    /// For other formats the tempo closure is not used, matching the
    /// convention that only format 1 carries a tempo map.
    pub fn write_file_with_tempo_track<TEMPO, CONTENT>(
        &mut self,
        format: Format,
        track_count: u16,
        division: Division,
        tempo_track: TEMPO,
        mut track_content: CONTENT,
    ) -> Result<(), CodecError>
    where
        TEMPO: FnOnce(&mut Self) -> Result<(), CodecError>,
        CONTENT: FnMut(&mut Self, u16) -> Result<(), CodecError>,
    {
        self.header(format, track_count, division)?;

        let mut remaining = track_count;
        if format == Format::One {
            self.track(tempo_track)?;
            remaining = remaining.saturating_sub(1);
        }

        for index in 0..remaining {
            self.track(|writer| track_content(writer, index))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelKind, Writer};
    use crate::{
        error::ErrorKind,
        header::{Division, Format},
        meta,
    };
    use std::io::Cursor;

    fn writer() -> Writer<Cursor<Vec<u8>>> {
        Writer::new(Cursor::new(Vec::new()))
    }

    #[test]
    fn header_chunk_saves_as_proper_bytes() {
        let mut writer = writer();
        writer
            .header(Format::One, 10, Division::Metrical(384))
            .unwrap();

        assert_eq!(
            writer.into_inner().into_inner(),
            vec![b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 10, 0x01, 0x80]
        );
    }

    #[test]
    fn channel_above_fifteen_is_rejected() {
        let mut writer = writer();
        let err = writer
            .channel_event(0, ChannelKind::NoteOn, 16, &[60, 100])
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ValueOutOfRange(_)));
    }

    #[test]
    fn wrong_data_byte_count_is_rejected() {
        let mut writer = writer();
        let err = writer
            .channel_event(0, ChannelKind::ProgramChange, 0, &[1, 2])
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ValueOutOfRange(_)));
    }

    #[test]
    fn tempo_above_24_bits_fails_instead_of_truncating() {
        let mut writer = writer();
        let err = writer.tempo(0, 0x0100_0000).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ValueOutOfRange(_)));

        let mut writer = self::writer();
        writer.tempo(0, 500_000).unwrap();
        assert_eq!(
            writer.into_inner().into_inner(),
            vec![0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]
        );
    }

    #[test]
    fn sysex_requires_a_marker_byte() {
        let mut writer = writer();
        let err = writer.sysex_event(0, &[0x01, 0x02]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ValueOutOfRange(_)));

        let mut writer = self::writer();
        writer.sysex_event(0, &[0xF0, 0x43, 0x12, 0xF7]).unwrap();
        assert_eq!(
            writer.into_inner().into_inner(),
            vec![0x00, 0xF0, 0x03, 0x43, 0x12, 0xF7]
        );
    }

    #[test]
    fn track_length_is_backpatched() {
        let mut writer = writer();
        writer
            .track(|track| track.channel_event(0, ChannelKind::NoteOn, 0, &[60, 100]))
            .unwrap();

        let bytes = writer.into_inner().into_inner();
        assert_eq!(&bytes[0..4], b"MTrk");

        let declared = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        assert_eq!(declared as usize, bytes.len() - 8);
        // note on plus auto-inserted end of track
        assert_eq!(declared, 8);
    }

    #[test]
    fn explicit_end_of_track_is_not_duplicated() {
        let mut writer = writer();
        writer
            .track(|track| track.meta_event(0, meta::END_OF_TRACK, &[]))
            .unwrap();

        let bytes = writer.into_inner().into_inner();
        assert_eq!(&bytes[8..], &[0x00, 0xFF, 0x2F, 0x00]);
    }

    #[test]
    fn running_status_suppresses_repeated_status_bytes() {
        let mut writer = writer().running_status(true);
        writer
            .track(|track| {
                track.channel_event(0, ChannelKind::NoteOn, 3, &[60, 100])?;
                track.channel_event(8, ChannelKind::NoteOn, 3, &[64, 100])?;
                track.channel_event(8, ChannelKind::NoteOff, 3, &[60, 0])
            })
            .unwrap();

        let bytes = writer.into_inner().into_inner();
        assert_eq!(
            &bytes[8..],
            &[
                0x00, 0x93, 60, 100, // status emitted once
                0x08, 64, 100, // suppressed: same status
                0x08, 0x83, 60, 0, // different status, emitted
                0x00, 0xFF, 0x2F, 0x00,
            ]
        );
    }

    #[test]
    fn meta_event_interrupts_running_status() {
        let mut writer = writer().running_status(true);
        writer
            .track(|track| {
                track.channel_event(0, ChannelKind::NoteOn, 0, &[60, 100])?;
                track.meta_event(0, meta::MARKER, b"A")?;
                track.channel_event(0, ChannelKind::NoteOn, 0, &[62, 100])
            })
            .unwrap();

        let bytes = writer.into_inner().into_inner();
        assert_eq!(
            &bytes[8..],
            &[
                0x00, 0x90, 60, 100, //
                0x00, 0xFF, 0x06, 0x01, b'A', //
                0x00, 0x90, 62, 100, // status re-emitted after the meta
                0x00, 0xFF, 0x2F, 0x00,
            ]
        );
    }

    #[test]
    fn format_one_tempo_map_comes_first_and_is_deducted() {
        let mut writer = writer();
        writer
            .write_file_with_tempo_track(
                Format::One,
                2,
                Division::Metrical(96),
                |tempo_track| tempo_track.tempo(0, 500_000),
                |track, index| {
                    assert_eq!(index, 0); // only one ordinary track remains
                    track.channel_event(0, ChannelKind::NoteOn, 0, &[60, 100])
                },
            )
            .unwrap();

        let bytes = writer.into_inner().into_inner();
        // header + two MTrk chunks in total
        let tracks = bytes.windows(4).filter(|w| *w == b"MTrk").count();
        assert_eq!(tracks, 2);
        // the first track is the tempo map
        assert_eq!(&bytes[22..29], &[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
    }
}
