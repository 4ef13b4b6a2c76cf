//! The 12-byte RIFF header.

use super::MIN_SIZE;
use crate::codec::{ChunkStream, Endian, FieldKind};
use crate::error::{Error, Result};
use crate::impl_record;
use std::io::{Read, Seek};
use tracing::debug;

pub const RIFF_TAG: &[u8; 4] = b"RIFF";
pub const WAVE_TAG: &[u8; 4] = b"WAVE";

/// `RIFF` tag, little-endian file size, `WAVE` form type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiffHeader {
    pub prefix: [u8; 4],
    /// Written as `MIN_SIZE + data size` on output.
    pub file_size: i32,
    pub format: [u8; 4],
}

impl_record!(RiffHeader, Endian::Little, {
    "Prefix" => prefix: FieldKind::Fixed(4),
    "FileSize" => file_size: FieldKind::Int32,
    "Format" => format: FieldKind::Fixed(4),
});

impl Default for RiffHeader {
    fn default() -> Self {
        Self {
            prefix: *RIFF_TAG,
            file_size: MIN_SIZE as i32,
            format: *WAVE_TAG,
        }
    }
}

impl RiffHeader {
    /// Reads and validates the header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedHeader`] if either tag is wrong.
    pub fn read<R: Read + Seek>(stream: &mut ChunkStream<R>) -> Result<Self> {
        let start = stream.position();
        let mut header = Self::default();
        stream.read_record(&mut header, &[])?;

        if &header.prefix != RIFF_TAG {
            return Err(Error::tag(start, "RIFF", &header.prefix));
        }
        if &header.format != WAVE_TAG {
            return Err(Error::tag(start + 8, "WAVE", &header.format));
        }

        debug!(file_size = header.file_size, "read riff header");
        Ok(header)
    }
}
