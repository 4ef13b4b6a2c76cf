//! The `MThd` header chunk.

use crate::codec::{ChunkStream, Endian, FieldKind};
use crate::error::{Error, HeaderProblem, Result, UnsupportedFeature};
use crate::impl_record;
use std::io::{Read, Seek};
use tracing::debug;

/// Tag every standard MIDI file starts with.
pub const HEADER_TAG: &[u8; 4] = b"MThd";

/// Payload size the header chunk must declare.
pub const HEADER_SIZE: u32 = 6;

/// High bit of the division field selects SMPTE timing.
const SMPTE_FLAG: u16 = 0x8000;

/// SMF format of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiFormat {
    /// A single multi-channel track.
    SingleTrack,
    /// Several simultaneous tracks of one song.
    Parallel,
    /// Several independent songs.
    Sequential,
    /// Any other value found in the file.
    Other(u16),
}

impl From<u16> for MidiFormat {
    fn from(raw: u16) -> Self {
        match raw {
            0 => MidiFormat::SingleTrack,
            1 => MidiFormat::Parallel,
            2 => MidiFormat::Sequential,
            other => MidiFormat::Other(other),
        }
    }
}

/// Header chunk, stored as the raw big-endian bytes of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderChunk {
    pub prefix: [u8; 4],
    pub size: [u8; 4],
    pub format: [u8; 2],
    pub tracks: [u8; 2],
    pub division: [u8; 2],
}

impl_record!(HeaderChunk, Endian::Big, {
    "Prefix" => prefix: FieldKind::Fixed(4),
    "Size" => size: FieldKind::Fixed(4),
    "Format" => format: FieldKind::Fixed(2),
    "Tracks" => tracks: FieldKind::Fixed(2),
    "Division" => division: FieldKind::Fixed(2),
});

impl HeaderChunk {
    /// Builds a header for a ticks-per-quarter-note file.
    pub fn new(format: u16, tracks: u16, division: u16) -> Self {
        Self {
            prefix: *HEADER_TAG,
            size: HEADER_SIZE.to_be_bytes(),
            format: format.to_be_bytes(),
            tracks: tracks.to_be_bytes(),
            division: division.to_be_bytes(),
        }
    }

    /// Reads and validates the header at the start of `stream`.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedHeader`] for a wrong tag or declared size
    /// - [`Error::Unsupported`] for format 2, SMPTE timing or a zero division
    pub fn read<R: Read + Seek>(stream: &mut ChunkStream<R>) -> Result<Self> {
        let start = stream.position();
        let mut header = Self::default();
        stream.read_record(&mut header, &[])?;
        debug!(
            format = header.format_raw(),
            tracks = header.track_count(),
            division = u16::from_be_bytes(header.division),
            "read midi header"
        );
        header.validate(start)?;
        Ok(header)
    }

    fn validate(&self, start: u64) -> Result<()> {
        if &self.prefix != HEADER_TAG {
            return Err(Error::tag(start, "MThd", &self.prefix));
        }
        let size = i32::from_be_bytes(self.size);
        if size != HEADER_SIZE as i32 {
            return Err(Error::MalformedHeader {
                offset: start + 4,
                problem: HeaderProblem::MidiHeaderSize(size),
            });
        }
        if self.format() == MidiFormat::Sequential {
            return Err(Error::unsupported(start + 8, UnsupportedFeature::MultiSong));
        }
        let division = u16::from_be_bytes(self.division);
        if division & SMPTE_FLAG != 0 {
            return Err(Error::unsupported(
                start + 12,
                UnsupportedFeature::SmpteDivision(division),
            ));
        }
        if division == 0 {
            return Err(Error::unsupported(start + 12, UnsupportedFeature::ZeroDivision));
        }
        Ok(())
    }

    /// The format field as stored in the file.
    pub fn format_raw(&self) -> u16 {
        u16::from_be_bytes(self.format)
    }

    /// The SMF format: single track, parallel tracks, or independent songs.
    pub fn format(&self) -> MidiFormat {
        MidiFormat::from(self.format_raw())
    }

    /// Number of `MTrk` chunks the file declares.
    pub fn track_count(&self) -> u16 {
        u16::from_be_bytes(self.tracks)
    }

    /// Ticks per quarter note.
    pub fn division(&self) -> u16 {
        u16::from_be_bytes(self.division)
    }
}
