//! The event handler surface invoked by the reader
//!
//! A read pass decodes every event it encounters and forwards each one to
//! the matching method of an [`EventHandler`]. Every method has a default
//! no-op body, so a handler implements only the events it cares about;
//! events without an override are still parsed byte-exactly and then
//! silently discarded.
//!
//! Handlers observe the stream, they do not steer it: return values never
//! feed back into parsing. The one exception is the error channel: any
//! method may return an error, which aborts the remaining pass and is
//! reported as [`crate::ErrorKind::Handler`].

use crate::header::{Division, Format};

/// Opaque error a handler may raise to abort the read pass
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// One method per decoded event kind, each defaulting to a no-op.
///
/// `delta` is always the event's delta time in ticks since the previous
/// event of the same track. A sysex message merged from several
/// continuation fragments carries the sum of the fragments' delta times.
#[allow(unused_variables)]
pub trait EventHandler {
    /// The file header: format, declared track count and time division
    fn header(
        &mut self,
        format: Format,
        track_count: u16,
        division: Division,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A track chunk begins
    fn track_start(&mut self) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A track chunk's declared bytes are exhausted
    fn track_end(&mut self) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Note off (status `0x8n`)
    fn note_off(
        &mut self,
        delta: u32,
        channel: u8,
        key: u8,
        velocity: u8,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Note on (status `0x9n`)
    fn note_on(
        &mut self,
        delta: u32,
        channel: u8,
        key: u8,
        velocity: u8,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Polyphonic key pressure (status `0xAn`)
    fn poly_pressure(
        &mut self,
        delta: u32,
        channel: u8,
        key: u8,
        pressure: u8,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Control change (status `0xBn`)
    fn control_change(
        &mut self,
        delta: u32,
        channel: u8,
        controller: u8,
        value: u8,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Program change (status `0xCn`, single data byte)
    fn program_change(&mut self, delta: u32, channel: u8, program: u8) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Channel pressure (status `0xDn`, single data byte)
    fn channel_pressure(
        &mut self,
        delta: u32,
        channel: u8,
        pressure: u8,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Pitch bend (status `0xEn`), least significant byte first as on the
    /// wire
    fn pitch_bend(&mut self, delta: u32, channel: u8, lsb: u8, msb: u8) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A system-exclusive message, `message[0]` being the `0xF0` marker
    fn sysex(&mut self, delta: u32, message: &[u8]) -> Result<(), HandlerError> {
        Ok(())
    }

    /// An `0xF7` block that does not continue a pending sysex: arbitrary
    /// escaped bytes the file wants sent verbatim
    fn arbitrary(&mut self, delta: u32, data: &[u8]) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A meta event of a type without a dedicated method
    fn meta_misc(&mut self, delta: u32, kind: u8, data: &[u8]) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Sequencer-specific meta event (type `0x7F`)
    fn sequencer_specific(&mut self, delta: u32, data: &[u8]) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Sequence number meta event (type `0x00`)
    fn sequence_number(&mut self, delta: u32, number: u16) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Any text-family meta event (types `0x01..=0x0F`): text, copyright,
    /// track name, instrument name, lyric, marker, cue point and the
    /// reserved codes
    fn text(&mut self, delta: u32, kind: u8, text: &[u8]) -> Result<(), HandlerError> {
        Ok(())
    }

    /// End of track meta event (type `0x2F`)
    fn end_of_track(&mut self, delta: u32) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Time signature meta event (type `0x58`). The denominator arrives as
    /// its base-2 logarithm, exactly as stored on the wire.
    fn time_signature(
        &mut self,
        delta: u32,
        numerator: u8,
        denominator_log2: u8,
        clocks_per_click: u8,
        thirty_seconds_per_quarter: u8,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// SMPTE offset meta event (type `0x54`)
    fn smpte_offset(
        &mut self,
        delta: u32,
        hour: u8,
        minute: u8,
        second: u8,
        frame: u8,
        fractional_frame: u8,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Set tempo meta event (type `0x51`), microseconds per quarter note
    fn tempo(&mut self, delta: u32, micros_per_quarter: u32) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Key signature meta event (type `0x59`): sharps (positive) or flats
    /// (negative), and whether the key is minor
    fn key_signature(&mut self, delta: u32, sharps_flats: i8, minor: bool) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// The empty handler set: every event is parsed and dropped. Useful for
/// validating that a file decodes cleanly.
impl EventHandler for () {}
