//! Meta event type bytes defined by the Standard MIDI Files specification
//!
//! A meta event is framed as `0xFF <type> <varint length> <payload>`. The
//! constants here name the `type` byte; anything else is dispatched to the
//! miscellaneous meta handler on read and may be written freely with
//! [`crate::Writer::meta_event`].

/// Sequence number, 16-bit payload
pub const SEQUENCE_NUMBER: u8 = 0x00;

/// Generic text
pub const TEXT: u8 = 0x01;

/// Copyright notice
pub const COPYRIGHT: u8 = 0x02;

/// Sequence or track name
pub const TRACK_NAME: u8 = 0x03;

/// Instrument name
pub const INSTRUMENT_NAME: u8 = 0x04;

/// Lyric
pub const LYRIC: u8 = 0x05;

/// Marker
pub const MARKER: u8 = 0x06;

/// Cue point
pub const CUE_POINT: u8 = 0x07;

/// MIDI channel prefix
pub const CHANNEL_PREFIX: u8 = 0x20;

/// End of track, must be the last event of every track
pub const END_OF_TRACK: u8 = 0x2F;

/// Set tempo, 24-bit microseconds per quarter note
pub const SET_TEMPO: u8 = 0x51;

/// SMPTE offset, 5 payload bytes
pub const SMPTE_OFFSET: u8 = 0x54;

/// Time signature, 4 payload bytes
pub const TIME_SIGNATURE: u8 = 0x58;

/// Key signature, 2 payload bytes
pub const KEY_SIGNATURE: u8 = 0x59;

/// Sequencer specific, opaque payload
pub const SEQUENCER_SPECIFIC: u8 = 0x7F;

/// Last type byte of the text-family range (`0x01..=0x0F`); the reader
/// dispatches the whole range, reserved codes included, as text events
pub const TEXT_FAMILY_END: u8 = 0x0F;
