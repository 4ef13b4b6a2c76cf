//! Meta events: tempo and time signature changes, everything else skipped.

use super::event::{EventHeader, ParsedEvent};
use crate::codec::{bytes_to_int, ChunkStream, Endian, FieldKind, Record, Vlv};
use crate::error::Result;
use crate::impl_record;
use std::io::{Read, Seek};
use tracing::{trace, warn};

/// Meta event types that are kept.
pub mod meta_type {
    pub const TEMPO: u8 = 0x51;
    pub const TIME_SIGNATURE: u8 = 0x58;
}

/// Default tempo: 500000 microseconds per quarter note (120 BPM).
pub const DEFAULT_MICROS_PER_QUARTER: [u8; 3] = [0x07, 0xA1, 0x20];

/// Fields shared by meta events before the payload.
///
/// The delta time and status byte belong to [`EventHeader`], which the event
/// reader has already consumed.
const META_FIELDS: [&str; 2] = ["Type", "Size"];

/// A meta event with its type and declared payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetaEvent {
    pub header: EventHeader,
    pub meta_type: u8,
    pub size: Vlv,
}

impl_record!(MetaEvent, Endian::Big, {
    "Type" => meta_type: FieldKind::Byte,
    "Size" => size: FieldKind::Vlv,
});

impl MetaEvent {
    /// Starts a meta event from an already-read event header.
    pub fn from_header(header: EventHeader) -> Self {
        Self {
            header,
            ..Self::default()
        }
    }
}

/// Tempo change in microseconds per quarter note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoEvent {
    pub meta: MetaEvent,
    pub micros_per_quarter: [u8; 3],
}

impl_record!(TempoEvent, Endian::Big, {
    "Type" => meta.meta_type: FieldKind::Byte,
    "Size" => meta.size: FieldKind::Vlv,
    "MSPerQN" => micros_per_quarter: FieldKind::Fixed(3),
});

impl Default for TempoEvent {
    fn default() -> Self {
        Self {
            meta: MetaEvent::default(),
            micros_per_quarter: DEFAULT_MICROS_PER_QUARTER,
        }
    }
}

impl TempoEvent {
    /// Starts a tempo event from its meta fields, with the default tempo until the payload is read.
    pub fn from_meta(meta: MetaEvent) -> Self {
        Self {
            meta,
            ..Self::default()
        }
    }

    /// A tempo change at `absolute_tick`, mostly useful for building timelines by hand.
    pub fn at(absolute_tick: u32, micros_per_quarter: u32) -> Self {
        let bytes = micros_per_quarter.to_be_bytes();
        Self {
            meta: MetaEvent {
                header: EventHeader::new(0, super::event::META, absolute_tick),
                meta_type: meta_type::TEMPO,
                size: Vlv::new(3),
            },
            micros_per_quarter: [bytes[1], bytes[2], bytes[3]],
        }
    }

    pub fn absolute_tick(&self) -> u32 {
        self.meta.header.absolute_tick
    }

    /// Tempo in microseconds per quarter note.
    pub fn micros_per_quarter(&self) -> u32 {
        // Three bytes always convert
        bytes_to_int(&self.micros_per_quarter, Endian::Big).unwrap_or(500_000) as u32
    }

    pub fn millis_per_quarter(&self) -> f64 {
        f64::from(self.micros_per_quarter()) / 1_000.0
    }

    pub fn seconds_per_quarter(&self) -> f64 {
        f64::from(self.micros_per_quarter()) / 1_000_000.0
    }

    /// Length of one tick in seconds.
    ///
    /// # Arguments
    ///
    /// * `division` - Ticks per quarter note from the file header
    pub fn seconds_per_tick(&self, division: u16) -> f64 {
        self.seconds_per_quarter() / f64::from(division)
    }

    pub fn millis_per_tick(&self, division: u16) -> f64 {
        self.millis_per_quarter() / f64::from(division)
    }

    /// Output samples covered by one tick at `sample_rate`.
    pub fn samples_per_tick(&self, division: u16, sample_rate: u32) -> u32 {
        crate::render::samples_per_tick(division, self.micros_per_quarter(), sample_rate)
    }

    /// Tempo in quarter notes per minute.
    pub fn bpm(&self) -> f64 {
        60_000_000.0 / f64::from(self.micros_per_quarter().max(1))
    }
}

/// Time signature change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeSignatureEvent {
    pub meta: MetaEvent,
    pub numerator: u8,
    /// Power-of-two exponent of the denominator.
    pub denominator: u8,
    /// MIDI clocks per metronome click.
    pub clocks_per_click: u8,
    /// Notated 32nd notes per quarter note.
    pub thirty_seconds_per_quarter: u8,
}

impl_record!(TimeSignatureEvent, Endian::Big, {
    "Type" => meta.meta_type: FieldKind::Byte,
    "Size" => meta.size: FieldKind::Vlv,
    "Numerator" => numerator: FieldKind::Byte,
    "Denominator" => denominator: FieldKind::Byte,
    "TicksPerClick" => clocks_per_click: FieldKind::Byte,
    "QN32" => thirty_seconds_per_quarter: FieldKind::Byte,
});

impl TimeSignatureEvent {
    /// Starts a time signature event from its meta fields.
    pub fn from_meta(meta: MetaEvent) -> Self {
        Self {
            meta,
            ..Self::default()
        }
    }

    pub fn absolute_tick(&self) -> u32 {
        self.meta.header.absolute_tick
    }

    /// The denominator as a note value (4 for quarter notes).
    pub fn denominator_value(&self) -> u32 {
        1u32.checked_shl(u32::from(self.denominator)).unwrap_or(0)
    }
}

/// Payload bytes a record reads after the shared meta fields.
fn payload_len<T: Record>() -> usize {
    T::SCHEMA
        .fields()
        .iter()
        .filter(|f| !META_FIELDS.contains(&f.name))
        .map(|f| match f.kind {
            FieldKind::Fixed(n) => n,
            _ => 1,
        })
        .sum()
}

/// Reads the rest of a meta event whose event header is already consumed.
///
/// Tempo and time signature payloads become their own events; any other
/// meta type is skipped by its declared length and discarded.
pub(crate) fn read_meta<R: Read + Seek>(
    stream: &mut ChunkStream<R>,
    header: EventHeader,
) -> Result<(ParsedEvent, usize)> {
    let mut meta = MetaEvent::from_header(header);
    let mut consumed = stream.read_record(&mut meta, &[])?;
    let declared = meta.size.value() as usize;

    let parsed = match meta.meta_type {
        meta_type::TEMPO if declared >= payload_len::<TempoEvent>() => {
            let mut tempo = TempoEvent::from_meta(meta);
            consumed += stream.read_record(&mut tempo, &META_FIELDS)?;
            trace!(
                tick = tempo.absolute_tick(),
                micros = tempo.micros_per_quarter(),
                "tempo change"
            );
            ParsedEvent::Tempo(tempo)
        }
        meta_type::TIME_SIGNATURE if declared >= payload_len::<TimeSignatureEvent>() => {
            let mut signature = TimeSignatureEvent::from_meta(meta);
            consumed += stream.read_record(&mut signature, &META_FIELDS)?;
            trace!(
                tick = signature.absolute_tick(),
                numerator = signature.numerator,
                denominator = signature.denominator_value(),
                "time signature change"
            );
            ParsedEvent::TimeSignature(signature)
        }
        meta_type::TEMPO | meta_type::TIME_SIGNATURE => {
            warn!(
                meta_type = meta.meta_type,
                declared, "meta payload shorter than expected, skipping"
            );
            ParsedEvent::Discarded(header)
        }
        _ => ParsedEvent::Discarded(header),
    };

    // Skip whatever the declared length still covers
    let payload_read = consumed - (meta.size.encoded_len() + 1);
    let rest = declared.saturating_sub(payload_read);
    stream.skip(rest as u64)?;
    Ok((parsed, consumed + rest))
}
