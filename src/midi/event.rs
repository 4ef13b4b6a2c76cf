//! Track events and their dispatch on the status byte.
//!
//! Every event shares a delta time, a status byte and the absolute tick
//! derived from the running sum of delta times. Only note and controller
//! events stay in a track; tempo and time signature meta events are handed
//! back separately, and everything else is skipped.

use super::meta::{self, TempoEvent, TimeSignatureEvent};
use crate::codec::{ChunkStream, Endian, FieldKind, Vlv};
use crate::error::{Error, Result, UnsupportedFeature};
use crate::impl_record;
use std::io::{Read, Seek};
use tracing::trace;

/// Status byte of a meta event.
pub const META: u8 = 0xFF;
/// Status bytes of system exclusive events.
pub const SYSEX: u8 = 0xF0;
pub const SYSEX_ESCAPE: u8 = 0xF7;

/// High nibbles of channel-voice status bytes.
pub mod kind {
    pub const NOTE_OFF: u8 = 0x8;
    pub const NOTE_ON: u8 = 0x9;
    pub const POLYPHONIC_AFTERTOUCH: u8 = 0xA;
    pub const CONTROLLER: u8 = 0xB;
    pub const INSTRUMENT: u8 = 0xC;
    pub const CHANNEL_AFTERTOUCH: u8 = 0xD;
    pub const PITCH_BEND: u8 = 0xE;
}

/// Controller numbers this crate gives meaning to.
pub mod controller {
    pub const VOLUME: u8 = 0x07;
    pub const PAN: u8 = 0x0A;
    pub const ALL_CONTROLLERS_OFF: u8 = 0x79;
    pub const ALL_NOTES_OFF: u8 = 0x7B;
}

/// Fields every track event starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventHeader {
    /// Ticks since the previous event in the track.
    pub delta: Vlv,
    pub status: u8,
    /// Running sum of delta times, computed once while parsing.
    pub absolute_tick: u32,
}

impl_record!(EventHeader, Endian::Big, {
    "Timing" => delta: FieldKind::Vlv,
    "Prefix" => status: FieldKind::Byte,
});

impl EventHeader {
    /// Creates a header for an event `delta` ticks after the previous one.
    ///
    /// # Arguments
    ///
    /// * `delta` - Ticks since the previous event in the track
    /// * `status` - Status byte, event kind in the high nibble and channel in the low
    /// * `absolute_tick` - Ticks since the start of the track
    pub fn new(delta: u32, status: u8, absolute_tick: u32) -> Self {
        Self {
            delta: Vlv::new(delta),
            status,
            absolute_tick,
        }
    }

    /// High nibble of the status byte.
    pub fn kind(&self) -> u8 {
        self.status >> 4
    }

    /// Low nibble of the status byte.
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }
}

/// Note on and note off share a layout; only the status differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoteEvent {
    pub pitch: u8,
    pub velocity: u8,
}

impl_record!(NoteEvent, Endian::Big, {
    "Pitch" => pitch: FieldKind::Byte,
    "Velocity" => velocity: FieldKind::Byte,
});

/// Controller events for volume, panning, all-notes-off and the like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerEvent {
    pub controller: u8,
    pub value: u8,
}

impl_record!(ControllerEvent, Endian::Big, {
    "Controller" => controller: FieldKind::Byte,
    "Value" => value: FieldKind::Byte,
});

/// Payload of an event kept in a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Note(NoteEvent),
    Controller(ControllerEvent),
}

/// A playable event retained in a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackEvent {
    pub header: EventHeader,
    pub kind: EventKind,
}

impl TrackEvent {
    /// Ticks since the previous event, as stored in the file.
    pub fn delta(&self) -> u32 {
        self.header.delta.value()
    }

    pub fn status(&self) -> u8 {
        self.header.status
    }

    /// Ticks since the start of the track.
    pub fn absolute_tick(&self) -> u32 {
        self.header.absolute_tick
    }

    pub fn channel(&self) -> u8 {
        self.header.channel()
    }

    /// True for note-on and note-off events.
    pub fn is_note(&self) -> bool {
        matches!(self.header.kind(), kind::NOTE_ON | kind::NOTE_OFF)
    }
}

/// Outcome of decoding one event from a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedEvent {
    /// A note or controller event that stays in the track.
    Retained(TrackEvent),
    /// A tempo change, collected across all tracks.
    Tempo(TempoEvent),
    /// A time signature change, collected across all tracks.
    TimeSignature(TimeSignatureEvent),
    /// An event that was read and thrown away.
    Discarded(EventHeader),
}

/// Decodes one event and advances `running_tick` by its delta time.
///
/// Returns the event and the number of bytes it occupied.
///
/// # Errors
///
/// - [`Error::Unsupported`] for system exclusive events
/// - [`Error::UnknownEventType`] for a status whose high nibble is not a
///   channel-voice category (this includes running status)
pub fn read_event<R: Read + Seek>(
    stream: &mut ChunkStream<R>,
    running_tick: &mut u32,
) -> Result<(ParsedEvent, usize)> {
    let mut header = EventHeader::default();
    let mut consumed = stream.read_record(&mut header, &[])?;
    let status_offset = stream.position() - 1;

    *running_tick = running_tick.saturating_add(header.delta.value());
    header.absolute_tick = *running_tick;

    let parsed = match header.status {
        META => {
            let (parsed, read) = meta::read_meta(stream, header)?;
            consumed += read;
            parsed
        }
        SYSEX | SYSEX_ESCAPE => {
            return Err(Error::unsupported(
                status_offset,
                UnsupportedFeature::SysEx(header.status),
            ));
        }
        _ => {
            let (parsed, read) = read_channel_event(stream, header, status_offset)?;
            consumed += read;
            parsed
        }
    };
    trace!(
        tick = header.absolute_tick,
        status = header.status,
        bytes = consumed,
        "read track event"
    );
    Ok((parsed, consumed))
}

fn read_channel_event<R: Read + Seek>(
    stream: &mut ChunkStream<R>,
    header: EventHeader,
    status_offset: u64,
) -> Result<(ParsedEvent, usize)> {
    match header.kind() {
        kind::NOTE_ON | kind::NOTE_OFF => {
            let mut note = NoteEvent::default();
            let read = stream.read_record(&mut note, &[])?;
            let event = TrackEvent {
                header,
                kind: EventKind::Note(note),
            };
            Ok((ParsedEvent::Retained(event), read))
        }
        kind::CONTROLLER => {
            let mut controller = ControllerEvent::default();
            let read = stream.read_record(&mut controller, &[])?;
            let event = TrackEvent {
                header,
                kind: EventKind::Controller(controller),
            };
            Ok((ParsedEvent::Retained(event), read))
        }
        kind::INSTRUMENT | kind::CHANNEL_AFTERTOUCH => {
            stream.skip(1)?;
            Ok((ParsedEvent::Discarded(header), 1))
        }
        kind::POLYPHONIC_AFTERTOUCH | kind::PITCH_BEND => {
            stream.skip(2)?;
            Ok((ParsedEvent::Discarded(header), 2))
        }
        _ => Err(Error::UnknownEventType {
            offset: status_offset,
            status: header.status,
        }),
    }
}
