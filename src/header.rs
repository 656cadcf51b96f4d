//! Header field types: file format and time division

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The overall organization of the MIDI file. Only three values are valid,
/// making most of the 16 wire bits irrelevant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Format {
    /// The file contains a single multi-channel track
    Zero,
    /// The file contains one or more simultaneous tracks of a sequence;
    /// by convention the first track is a tempo map
    One,
    /// The file contains one or more sequentially independent single-track
    /// patterns
    Two,
}

/// Error struct representing an invalid format specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid header format {0}, expected 0, 1 or 2")]
pub struct InvalidFormat(pub u16);

impl TryFrom<u16> for Format {
    type Error = InvalidFormat;
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Format::Zero),
            1 => Ok(Format::One),
            2 => Ok(Format::Two),
            _ => Err(InvalidFormat(value)),
        }
    }
}

impl Format {
    /// The 16-bit wire value of this format
    pub fn raw(self) -> u16 {
        match self {
            Format::Zero => 0,
            Format::One => 1,
            Format::Two => 2,
        }
    }
}

/// The meaning of delta times in the file, from the third header field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Division {
    /// When bit 15 is 0, bits 14-0 are ticks per quarter note
    Metrical(u16),
    /// When bit 15 is 1, the high byte is a negative SMPTE frame-rate code
    /// and the low byte is the tick resolution within one frame
    TimeCode {
        /// One of the SMPTE frame rates, stored negated: -24, -25, -29
        /// (30 drop frame) or -30
        frame_rate: i8,
        /// Delta-time ticks per frame
        ticks_per_frame: u8,
    },
}

impl Division {
    /// Reconstructs a division from its 16-bit wire value, sign-extending
    /// the SMPTE frame-rate byte
    pub fn from_raw(raw: u16) -> Self {
        if raw & 0x8000 == 0 {
            Division::Metrical(raw)
        } else {
            Division::TimeCode {
                frame_rate: (raw >> 8) as u8 as i8,
                ticks_per_frame: raw as u8,
            }
        }
    }

    /// The 16-bit wire value of this division
    pub fn raw(self) -> u16 {
        match self {
            Division::Metrical(ticks) => ticks & 0x7FFF,
            Division::TimeCode {
                frame_rate,
                ticks_per_frame,
            } => ((frame_rate as u8 as u16) << 8) | ticks_per_frame as u16,
        }
    }

    /// Converts a tick count into seconds under this division. `tempo` is
    /// the current tempo in microseconds per quarter note and only matters
    /// for metrical time; SMPTE ticks already denote wall-clock time.
    pub fn ticks_to_seconds(self, ticks: u32, tempo: u32) -> f32 {
        match self {
            Division::Metrical(ticks_per_quarter) => {
                (ticks as f32 * tempo as f32) / (ticks_per_quarter as f32 * 1_000_000.0)
            }
            Division::TimeCode {
                frame_rate,
                ticks_per_frame,
            } => {
                let frames_per_second = -(frame_rate as f32);
                ticks as f32 / (frames_per_second * ticks_per_frame as f32)
            }
        }
    }

    /// The inverse of [`Division::ticks_to_seconds`], rounding toward zero
    pub fn seconds_to_ticks(self, seconds: f32, tempo: u32) -> u32 {
        match self {
            Division::Metrical(ticks_per_quarter) => {
                ((seconds * 1_000_000.0 * ticks_per_quarter as f32) / tempo as f32) as u32
            }
            Division::TimeCode {
                frame_rate,
                ticks_per_frame,
            } => {
                let frames_per_second = -(frame_rate as f32);
                (seconds * frames_per_second * ticks_per_frame as f32) as u32
            }
        }
    }
}
