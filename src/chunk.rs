//! Chunk tag constants for the two recognized MIDI chunk kinds

/// 4 character ASCII tag of the header chunk
pub const HEADER_TAG: [u8; 4] = *b"MThd";

/// 4 character ASCII tag of a track chunk
pub const TRACK_TAG: [u8; 4] = *b"MTrk";

/// Payload length of a header chunk. Readers must tolerate longer headers
/// and skip the surplus bytes; writers always emit exactly this many.
pub const HEADER_LENGTH: u32 = 6;
