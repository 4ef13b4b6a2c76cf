//! The `data` chunk and its frames.

use super::format::FormatChunk;
use super::sample::{Sample, MAX_CHANNEL_BYTES};
use crate::codec::{ChunkStream, Endian, FieldKind};
use crate::error::{Error, Result};
use crate::impl_record;
use std::io::{Read, Seek};
use tracing::{debug, trace, warn};

pub const DATA_TAG: &[u8; 4] = b"data";

/// Bytes per frame once samples are 16-bit stereo.
pub const TARGET_FRAME_WIDTH: i32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunk {
    pub prefix: [u8; 4],
    /// Byte size of the sample data.
    pub size: i32,
    pub samples: Vec<Sample>,
}

impl_record!(DataChunk, Endian::Little, {
    "Prefix" => prefix: FieldKind::Fixed(4),
    "Size" => size: FieldKind::Int32,
});

impl Default for DataChunk {
    fn default() -> Self {
        Self {
            prefix: *DATA_TAG,
            size: 0,
            samples: Vec::new(),
        }
    }
}

impl DataChunk {
    /// A chunk holding 16-bit stereo `samples`.
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self {
            size: frames_to_size(samples.len()),
            samples,
            ..Self::default()
        }
    }

    /// Reads the chunk header and `size / frame width` frames laid out as
    /// described by `format`.
    ///
    /// Mono frames are duplicated into both channels. Trailing bytes that do
    /// not fill a whole frame are skipped and dropped from `size`.
    pub fn read<R: Read + Seek>(stream: &mut ChunkStream<R>, format: &FormatChunk) -> Result<Self> {
        let start = stream.position();
        let mut chunk = Self::default();
        stream.read_record(&mut chunk, &[])?;
        if &chunk.prefix != DATA_TAG {
            return Err(Error::tag(start, "data", &chunk.prefix));
        }

        let channel_bytes = format.channel_bytes();
        let frame_width = format.frame_width();
        if frame_width == 0 || channel_bytes > MAX_CHANNEL_BYTES {
            // Format validation rules this out
            return Ok(chunk);
        }
        if usize::from(format.block_align()) != frame_width {
            warn!(
                block_align = format.block_align(),
                frame_width, "block align disagrees with channels and bit depth"
            );
        }

        let declared = u64::try_from(chunk.size).unwrap_or(0);
        let frames = declared / frame_width as u64;
        let leftover = declared % frame_width as u64;
        trace!(frames, frame_width, "reading samples");

        // Cap the up-front allocation by what the stream can actually hold
        let capacity = frames.min(stream.remaining() / frame_width as u64);
        chunk.samples.reserve(usize::try_from(capacity).unwrap_or(0));

        let mut frame = [0u8; 2 * MAX_CHANNEL_BYTES];
        for _ in 0..frames {
            let frame = &mut frame[..frame_width];
            stream.read_exact(frame)?;
            let left = &frame[..channel_bytes];
            let right = if format.channels() == 2 {
                &frame[channel_bytes..]
            } else {
                left
            };
            chunk.samples.push(Sample::from_channels(left, right));
        }
        if leftover > 0 {
            warn!(leftover, "data size is not a whole number of frames");
            stream.skip(leftover)?;
            chunk.size = i32::try_from(frames * frame_width as u64).unwrap_or(i32::MAX);
        }

        debug!(
            offset = start,
            size = chunk.size,
            frames = chunk.samples.len(),
            "read data chunk"
        );
        Ok(chunk)
    }

    /// Number of stereo frames held.
    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }

    /// Removes silent frames from both ends, shrinking `size` by 4 bytes per frame.
    ///
    /// Assumes 16-bit stereo frames. Returns the number of frames removed.
    pub fn trim(&mut self) -> usize {
        let leading = self.samples.iter().take_while(|s| s.is_silent()).count();
        self.samples.drain(..leading);
        let trailing = self.samples.iter().rev().take_while(|s| s.is_silent()).count();
        self.samples.truncate(self.samples.len() - trailing);

        let removed = leading + trailing;
        self.size -= frames_to_size(removed);
        removed
    }
}

/// Byte size of `frames` 16-bit stereo frames.
pub fn frames_to_size(frames: usize) -> i32 {
    i32::try_from(frames)
        .unwrap_or(i32::MAX)
        .saturating_mul(TARGET_FRAME_WIDTH)
}
