//! `MTrk` chunks.
//!
//! A track chunk declares the byte length of its event stream; events are
//! decoded until that many bytes have been consumed.

use super::event::{read_event, ParsedEvent, TrackEvent};
use super::meta::{TempoEvent, TimeSignatureEvent};
use crate::codec::{ChunkStream, Endian, FieldKind};
use crate::error::{Error, Result};
use crate::impl_record;
use std::io::{Read, Seek};
use tracing::debug;

/// Tag every track chunk starts with.
pub const TRACK_TAG: &[u8; 4] = b"MTrk";

/// Track chunk that always starts with `MTrk`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackChunk {
    pub prefix: [u8; 4],
    /// Byte length of the event stream that follows.
    pub size: i32,
    /// Sum of all delta times in the track.
    pub tick_size: u32,
    /// Playable events, ordered by absolute tick.
    pub events: Vec<TrackEvent>,
}

impl_record!(TrackChunk, Endian::Big, {
    "Prefix" => prefix: FieldKind::Fixed(4),
    "Size" => size: FieldKind::Int32,
});

/// Tempo and time signature changes gathered while reading tracks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalChanges {
    pub tempo: Vec<TempoEvent>,
    pub time_signature: Vec<TimeSignatureEvent>,
}

impl TrackChunk {
    /// Reads one track, moving tempo and time signature events into `changes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedHeader`] if the chunk does not start with
    /// `MTrk`, or any error raised while decoding its events.
    pub fn read<R: Read + Seek>(
        stream: &mut ChunkStream<R>,
        changes: &mut GlobalChanges,
    ) -> Result<Self> {
        let start = stream.position();
        let mut track = Self::default();
        stream.read_record(&mut track, &[])?;
        if &track.prefix != TRACK_TAG {
            return Err(Error::tag(start, "MTrk", &track.prefix));
        }

        let declared = usize::try_from(track.size).unwrap_or(0);
        let mut consumed = 0;
        let mut discarded = 0;
        while consumed < declared {
            let (parsed, read) = read_event(stream, &mut track.tick_size)?;
            consumed += read;
            match parsed {
                ParsedEvent::Retained(event) => track.events.push(event),
                ParsedEvent::Tempo(tempo) => changes.tempo.push(tempo),
                ParsedEvent::TimeSignature(sig) => changes.time_signature.push(sig),
                ParsedEvent::Discarded(_) => discarded += 1,
            }
        }

        debug!(
            offset = start,
            bytes = consumed,
            ticks = track.tick_size,
            events = track.events.len(),
            discarded,
            "read midi track"
        );
        Ok(track)
    }

    /// Orders events by absolute tick, keeping file order within a tick.
    pub fn sort_events(&mut self) {
        self.events.sort_by_key(TrackEvent::absolute_tick);
    }

    /// Number of note-on and note-off events.
    pub fn note_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_note()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::write_vlv;
    use crate::midi::event::EventKind;

    fn track_bytes(body: &[u8]) -> Vec<u8> {
        let mut out = TRACK_TAG.to_vec();
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_tick_accumulation() {
        let mut body = Vec::new();
        for (delta, pitch) in [(0u32, 60u8), (4, 62), (0, 64), (96, 65)] {
            write_vlv(delta, &mut body);
            body.extend_from_slice(&[0x90, pitch, 100]);
        }
        body.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        let bytes = track_bytes(&body);
        let mut changes = GlobalChanges::default();
        let track = TrackChunk::read(&mut ChunkStream::from_bytes(&bytes), &mut changes).unwrap();

        let ticks: Vec<u32> = track.events.iter().map(|e| e.absolute_tick()).collect();
        assert_eq!(ticks, vec![0, 4, 4, 100]);
        assert_eq!(track.tick_size, 100);
        assert_eq!(track.note_count(), 4);
    }

    #[test]
    fn test_meta_events_leave_the_track() {
        let body = [
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // tempo
            0x00, 0xFF, 0x58, 0x04, 4, 2, 24, 8, // time signature
            0x10, 0xC0, 0x05, // program change
            0x00, 0xB0, 0x07, 0x64, // volume
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let bytes = track_bytes(&body);
        let mut changes = GlobalChanges::default();
        let track = TrackChunk::read(&mut ChunkStream::from_bytes(&bytes), &mut changes).unwrap();

        assert_eq!(changes.tempo.len(), 1);
        assert_eq!(changes.time_signature.len(), 1);
        assert_eq!(track.events.len(), 1);
        assert!(matches!(track.events[0].kind, EventKind::Controller(_)));
        assert_eq!(track.events[0].absolute_tick(), 16);
    }

    #[test]
    fn test_wrong_prefix() {
        let mut bytes = track_bytes(&[0x00, 0xFF, 0x2F, 0x00]);
        bytes[..4].copy_from_slice(b"MTrX");
        let err = TrackChunk::read(&mut ChunkStream::from_bytes(&bytes), &mut GlobalChanges::default())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { offset: 0, .. }));
    }

    #[test]
    fn test_truncated_event_stream() {
        let mut bytes = track_bytes(&[0x00, 0x90, 60, 100]);
        bytes.truncate(bytes.len() - 1);
        let err = TrackChunk::read(&mut ChunkStream::from_bytes(&bytes), &mut GlobalChanges::default())
            .unwrap_err();
        assert!(matches!(err, Error::TruncatedStream { .. }));
    }
}
