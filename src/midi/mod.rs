//! Standard MIDI File (SMF) parsing.
//!
//! A file is read in one forward pass: the `MThd` header, then as many `MTrk`
//! chunks as the header declares. While tracks are read, tempo and time
//! signature meta events are pulled out into file-wide lists; only note and
//! controller events stay in the tracks.
//!
//! # Limitations
//!
//! - Format 2 (several songs in one file) is rejected
//! - SMPTE time division is rejected; only ticks per quarter note is supported
//! - System exclusive events abort the parse
//! - Running status is not supported

pub mod event;
pub mod header;
pub mod meta;
mod summary;
pub mod track;

pub use event::{ControllerEvent, EventHeader, EventKind, NoteEvent, TrackEvent};
pub use header::{HeaderChunk, MidiFormat};
pub use meta::{MetaEvent, TempoEvent, TimeSignatureEvent};
pub use summary::{MidiSummary, TrackSummary};
pub use track::TrackChunk;

use crate::codec::ChunkStream;
use crate::error::Result;
use std::io::{Read, Seek};
use std::path::Path;
use track::GlobalChanges;
use tracing::{info, info_span};

/// Standard MIDI note names for display purposes.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Converts a MIDI note number to a note name with octave, e.g. 60 to "C4".
pub fn note_to_name(note: u8) -> String {
    let octave = (note / 12) as i8 - 1; // MIDI octave convention
    let note_index = (note % 12) as usize;
    format!("{}{}", NOTE_NAMES[note_index], octave)
}

/// A parsed MIDI file.
///
/// Only exists when parsing succeeded; a failed parse returns the error and
/// drops everything read so far.
#[derive(Debug, Clone, PartialEq)]
pub struct Midi {
    pub header: HeaderChunk,
    /// Tracks with at least one playable event, in file order.
    pub tracks: Vec<TrackChunk>,
    /// Tempo changes of all tracks, ordered by absolute tick.
    pub tempo_changes: Vec<TempoEvent>,
    /// Time signature changes of all tracks, ordered by absolute tick.
    pub time_signature_changes: Vec<TimeSignatureEvent>,
}

impl Midi {
    /// Loads a MIDI file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`](crate::Error::FileNotFound) for a
    /// missing path, or any parse error with the offending byte offset.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let _span = info_span!("midi", path = %path.display()).entered();
        let mut stream = ChunkStream::open(path)?;
        Self::read(&mut stream)
    }

    /// Parses a MIDI file held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read(&mut ChunkStream::from_bytes(bytes))
    }

    /// Parses a MIDI file from the current position of `stream`.
    pub fn read<R: Read + Seek>(stream: &mut ChunkStream<R>) -> Result<Self> {
        let header = HeaderChunk::read(stream)?;

        let mut changes = GlobalChanges::default();
        let mut tracks = Vec::with_capacity(header.track_count() as usize);
        for index in 0..header.track_count() {
            let _span = info_span!("track", index).entered();
            tracks.push(TrackChunk::read(stream, &mut changes)?);
        }

        let GlobalChanges {
            mut tempo,
            mut time_signature,
        } = changes;
        tempo.sort_by_key(TempoEvent::absolute_tick);
        time_signature.sort_by_key(TimeSignatureEvent::absolute_tick);

        // Drop tracks with nothing to play
        tracks.retain(|t| !t.events.is_empty());
        for track in &mut tracks {
            track.sort_events();
        }

        info!(
            declared_tracks = header.track_count(),
            playable_tracks = tracks.len(),
            tempo_changes = tempo.len(),
            division = header.division(),
            "loaded midi file"
        );

        Ok(Self {
            header,
            tracks,
            tempo_changes: tempo,
            time_signature_changes: time_signature,
        })
    }

    /// Ticks per quarter note.
    pub fn division(&self) -> u16 {
        self.header.division()
    }

    /// SMF format declared in the header.
    pub fn format(&self) -> MidiFormat {
        self.header.format()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, UnsupportedFeature};

    fn file(format: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
        let mut out = b"MThd".to_vec();
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&format.to_be_bytes());
        out.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
        out.extend_from_slice(&96u16.to_be_bytes());
        for body in tracks {
            out.extend_from_slice(b"MTrk");
            out.extend_from_slice(&(body.len() as u32).to_be_bytes());
            out.extend_from_slice(body);
        }
        out
    }

    #[test]
    fn test_note_to_name() {
        assert_eq!(note_to_name(60), "C4");
        assert_eq!(note_to_name(69), "A4");
        assert_eq!(note_to_name(0), "C-1");
        assert_eq!(note_to_name(127), "G9");
    }

    #[test]
    fn test_tempo_track_is_dropped_and_changes_sorted() {
        let tempo_track = vec![
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // 120 BPM at 0
            0x60, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40, // 60 BPM at 96
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let music_track = vec![
            0x00, 0xFF, 0x51, 0x03, 0x03, 0xD0, 0x90, // 240 BPM at 0
            0x00, 0x90, 60, 100, //
            0x30, 0x80, 60, 0, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let midi = Midi::from_bytes(&file(1, &[tempo_track, music_track])).unwrap();

        assert_eq!(midi.tracks.len(), 1);
        assert_eq!(midi.tracks[0].events.len(), 2);
        assert_eq!(midi.tracks[0].tick_size, 0x30);
        let ticks: Vec<u32> = midi.tempo_changes.iter().map(|t| t.absolute_tick()).collect();
        assert_eq!(ticks, vec![0, 0, 96]);
        assert_eq!(midi.tempo_changes[0].micros_per_quarter(), 500_000);
        assert_eq!(midi.tempo_changes[1].micros_per_quarter(), 250_000);
        assert_eq!(midi.tempo_changes[2].micros_per_quarter(), 1_000_000);
        assert_eq!(midi.division(), 96);
    }

    #[test]
    fn test_multi_song_aborts_before_tracks() {
        // The track body is garbage; the header check must fail first
        let err = Midi::from_bytes(&file(2, &[vec![0xF0]])).unwrap_err();
        assert!(matches!(
            err,
            Error::Unsupported {
                feature: UnsupportedFeature::MultiSong,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_event_fails_whole_file() {
        let err = Midi::from_bytes(&file(0, &[vec![0x00, 0x90, 60, 100, 0x00, 0x45, 0x00]]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownEventType {
                status: 0x45,
                offset: 27
            }
        ));
    }

    #[test]
    fn test_missing_track_is_truncation() {
        let mut bytes = file(0, &[vec![0x00, 0xFF, 0x2F, 0x00]]);
        bytes[11] = 2; // declare two tracks, provide one
        assert!(matches!(
            Midi::from_bytes(&bytes),
            Err(Error::TruncatedStream { .. })
        ));
    }
}
