//! Example program that writes a short MIDI file into memory, then reads it
//! back and prints every decoded event

use smfio::{
    read_file, ChannelKind, Division, EventHandler, Format, HandlerError, Writer,
};
use std::io::Cursor;

/// Handler that prints each event as the reader dispatches it
struct Printer;

impl EventHandler for Printer {
    fn header(
        &mut self,
        format: Format,
        track_count: u16,
        division: Division,
    ) -> Result<(), HandlerError> {
        println!("header: {format:?}, {track_count} track(s), {division:?}");
        Ok(())
    }

    fn track_start(&mut self) -> Result<(), HandlerError> {
        println!("track start");
        Ok(())
    }

    fn track_end(&mut self) -> Result<(), HandlerError> {
        println!("track end");
        Ok(())
    }

    fn note_on(&mut self, delta: u32, channel: u8, key: u8, velocity: u8) -> Result<(), HandlerError> {
        println!("  +{delta:>4} note on  ch{channel} key {key} vel {velocity}");
        Ok(())
    }

    fn note_off(&mut self, delta: u32, channel: u8, key: u8, velocity: u8) -> Result<(), HandlerError> {
        println!("  +{delta:>4} note off ch{channel} key {key} vel {velocity}");
        Ok(())
    }

    fn tempo(&mut self, delta: u32, micros_per_quarter: u32) -> Result<(), HandlerError> {
        println!("  +{delta:>4} tempo {micros_per_quarter} us/quarter");
        Ok(())
    }

    fn end_of_track(&mut self, delta: u32) -> Result<(), HandlerError> {
        println!("  +{delta:>4} end of track");
        Ok(())
    }
}

fn main() {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer
        .write_file_with_tempo_track(
            Format::One,
            2,
            Division::Metrical(96),
            |tempo_track| tempo_track.tempo(0, 500_000),
            |track, _| {
                // a C major arpeggio, one quarter note each
                for (at, key) in [60u8, 64, 67].iter().enumerate() {
                    let delta = if at == 0 { 0 } else { 96 };
                    track.channel_event(delta, ChannelKind::NoteOn, 0, &[*key, 100])?;
                    track.channel_event(96, ChannelKind::NoteOff, 0, &[*key, 0])?;
                }
                Ok(())
            },
        )
        .expect("Write the file into memory");

    let bytes = writer.into_inner().into_inner();
    println!("wrote {} bytes\n", bytes.len());

    read_file(bytes.into_iter(), &mut Printer).expect("Read back the file just written");
}
