//! The `fmt ` chunk.
//!
//! Fields are kept as the raw little-endian bytes found in the file so that
//! validation compares against [`FormatChunk::TARGET`] field by field, and the
//! chunk writes back out unchanged when nothing was converted.

use super::{TARGET_BITS, TARGET_CHANNELS, TARGET_SAMPLE_RATE};
use crate::codec::{bytes_to_int, ChunkStream, Endian, FieldKind};
use crate::error::{Error, HeaderProblem, Result, UnsupportedFeature};
use crate::impl_record;
use std::io::{Read, Seek};
use tracing::debug;

pub const FORMAT_TAG: &[u8; 4] = b"fmt ";

/// Format tag of uncompressed PCM.
pub const PCM: u16 = 1;

/// Payload size of a plain PCM `fmt ` chunk.
pub const PCM_FORMAT_SIZE: u32 = 16;

/// Bit depths that can be converted to 16 bits.
pub const SUPPORTED_BITS: [u16; 4] = [8, 16, 24, 32];

// Offsets of each field relative to the start of the chunk
const SIZE_OFFSET: u64 = 4;
const FORMAT_OFFSET: u64 = 8;
const CHANNELS_OFFSET: u64 = 10;
const RATE_OFFSET: u64 = 12;
const BITS_OFFSET: u64 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatChunk {
    pub prefix: [u8; 4],
    pub size: [u8; 4],
    pub format: [u8; 2],
    pub channels: [u8; 2],
    pub sample_rate: [u8; 4],
    /// `sample_rate * block_align`
    pub byte_rate: [u8; 4],
    /// Bytes per frame across all channels.
    pub block_align: [u8; 2],
    pub bits_per_channel: [u8; 2],
}

impl_record!(FormatChunk, Endian::Little, {
    "Prefix" => prefix: FieldKind::Fixed(4),
    "Size" => size: FieldKind::Fixed(4),
    "Format" => format: FieldKind::Fixed(2),
    "NumChannels" => channels: FieldKind::Fixed(2),
    "SampleRate" => sample_rate: FieldKind::Fixed(4),
    "ByteRate" => byte_rate: FieldKind::Fixed(4),
    "BlockAlign" => block_align: FieldKind::Fixed(2),
    "BitsPerChannel" => bits_per_channel: FieldKind::Fixed(2),
});

const fn le16(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

const fn le32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

impl FormatChunk {
    /// 16-bit stereo PCM at 44100 Hz, the layout every output uses.
    pub const TARGET: FormatChunk = FormatChunk {
        prefix: *FORMAT_TAG,
        size: le32(PCM_FORMAT_SIZE),
        format: le16(PCM),
        channels: le16(TARGET_CHANNELS),
        sample_rate: le32(TARGET_SAMPLE_RATE),
        byte_rate: le32(TARGET_SAMPLE_RATE * TARGET_CHANNELS as u32 * TARGET_BITS as u32 / 8),
        block_align: le16(TARGET_CHANNELS * TARGET_BITS / 8),
        bits_per_channel: le16(TARGET_BITS),
    };

    /// Reads the chunk and checks, in order: tag, size, PCM, channel count,
    /// sample rate and bit depth.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedHeader`] for a wrong tag or size, [`Error::Unsupported`]
    /// for any format this crate cannot use. The offset points at the field
    /// that failed.
    pub fn read<R: Read + Seek>(stream: &mut ChunkStream<R>) -> Result<Self> {
        let start = stream.position();
        let mut chunk = Self::TARGET;
        stream.read_record(&mut chunk, &[])?;

        if chunk.prefix != Self::TARGET.prefix {
            return Err(Error::tag(start, "fmt ", &chunk.prefix));
        }
        if chunk.size != Self::TARGET.size {
            return Err(Error::MalformedHeader {
                offset: start + SIZE_OFFSET,
                problem: HeaderProblem::FormatChunkSize(le_int(&chunk.size)),
            });
        }
        if chunk.format != Self::TARGET.format {
            return Err(Error::unsupported(
                start + FORMAT_OFFSET,
                UnsupportedFeature::NonPcm(le_int(&chunk.format)),
            ));
        }
        if !matches!(chunk.channels(), 1 | 2) {
            return Err(Error::unsupported(
                start + CHANNELS_OFFSET,
                UnsupportedFeature::ChannelCount(le_int(&chunk.channels)),
            ));
        }
        if chunk.sample_rate != Self::TARGET.sample_rate {
            return Err(Error::unsupported(
                start + RATE_OFFSET,
                UnsupportedFeature::SampleRate {
                    found: le_int(&chunk.sample_rate),
                    expected: TARGET_SAMPLE_RATE,
                },
            ));
        }
        if !SUPPORTED_BITS.contains(&chunk.bits_per_channel()) {
            return Err(Error::unsupported(
                start + BITS_OFFSET,
                UnsupportedFeature::BitDepth(le_int(&chunk.bits_per_channel)),
            ));
        }

        debug!(
            channels = chunk.channels(),
            sample_rate = chunk.sample_rate(),
            bits = chunk.bits_per_channel(),
            block_align = chunk.block_align(),
            "read format chunk"
        );
        Ok(chunk)
    }

    /// Channel count (1 or 2 once validated).
    pub fn channels(&self) -> u16 {
        u16::from_le_bytes(self.channels)
    }

    /// Frames per second.
    pub fn sample_rate(&self) -> u32 {
        u32::from_le_bytes(self.sample_rate)
    }

    /// Bytes per second, as declared.
    pub fn byte_rate(&self) -> u32 {
        u32::from_le_bytes(self.byte_rate)
    }

    /// Bytes per frame, as declared. Reading does not trust it.
    pub fn block_align(&self) -> u16 {
        u16::from_le_bytes(self.block_align)
    }

    /// Bit depth of one channel value.
    pub fn bits_per_channel(&self) -> u16 {
        u16::from_le_bytes(self.bits_per_channel)
    }

    /// Bytes of one channel value.
    pub fn channel_bytes(&self) -> usize {
        usize::from(self.bits_per_channel() / 8)
    }

    /// Bytes of one frame, derived from channel count and bit depth.
    pub fn frame_width(&self) -> usize {
        usize::from(self.channels()) * self.channel_bytes()
    }

    /// True when the layout already is 16-bit stereo.
    pub fn is_target_layout(&self) -> bool {
        self.channels == Self::TARGET.channels && self.bits_per_channel == Self::TARGET.bits_per_channel
    }

    /// Publishes the 16-bit stereo layout, keeping tag, size, format and rate.
    pub fn set_target_layout(&mut self) {
        self.channels = Self::TARGET.channels;
        self.byte_rate = Self::TARGET.byte_rate;
        self.block_align = Self::TARGET.block_align;
        self.bits_per_channel = Self::TARGET.bits_per_channel;
    }
}

impl Default for FormatChunk {
    fn default() -> Self {
        Self::TARGET
    }
}

fn le_int(bytes: &[u8]) -> i32 {
    // Widths here are always 2 or 4
    bytes_to_int(bytes, Endian::Little).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::write_record;

    fn chunk_bytes(channels: u16, rate: u32, bits: u16) -> Vec<u8> {
        let align = channels * bits / 8;
        let mut out = FORMAT_TAG.to_vec();
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&(rate * u32::from(align)).to_le_bytes());
        out.extend_from_slice(&align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out
    }

    fn read(bytes: &[u8]) -> Result<FormatChunk> {
        FormatChunk::read(&mut ChunkStream::from_bytes(bytes))
    }

    #[test]
    fn test_target_constants() {
        let target = FormatChunk::TARGET;
        assert_eq!(target.byte_rate(), 176_400);
        assert_eq!(target.block_align(), 4);
        assert_eq!(target.frame_width(), 4);
        assert_eq!(
            target.sample_rate,
            [0x44, 0xAC, 0x00, 0x00],
            "44100 little-endian"
        );
    }

    #[test]
    fn test_reads_mono_24_bit() {
        let chunk = read(&chunk_bytes(1, 44100, 24)).unwrap();
        assert_eq!(chunk.channels(), 1);
        assert_eq!(chunk.channel_bytes(), 3);
        assert_eq!(chunk.frame_width(), 3);
        assert!(!chunk.is_target_layout());
    }

    #[test]
    fn test_target_round_trips_through_writer() {
        let mut out = Vec::new();
        write_record(&mut out, &FormatChunk::TARGET, &[]).unwrap();
        assert_eq!(out, chunk_bytes(2, 44100, 16));
        assert_eq!(read(&out).unwrap(), FormatChunk::TARGET);
    }

    #[test]
    fn test_rejections_point_at_field() {
        let mut bytes = chunk_bytes(2, 44100, 16);
        bytes[4] = 18;
        assert!(matches!(
            read(&bytes),
            Err(Error::MalformedHeader {
                offset: 4,
                problem: HeaderProblem::FormatChunkSize(18)
            })
        ));

        let mut bytes = chunk_bytes(2, 44100, 16);
        bytes[8] = 3; // IEEE float
        assert!(matches!(
            read(&bytes),
            Err(Error::Unsupported {
                offset: 8,
                feature: UnsupportedFeature::NonPcm(3)
            })
        ));

        assert!(matches!(
            read(&chunk_bytes(6, 44100, 16)),
            Err(Error::Unsupported {
                offset: 10,
                feature: UnsupportedFeature::ChannelCount(6)
            })
        ));

        assert!(matches!(
            read(&chunk_bytes(2, 48000, 16)),
            Err(Error::Unsupported {
                offset: 12,
                feature: UnsupportedFeature::SampleRate { found: 48000, .. }
            })
        ));

        assert!(matches!(
            read(&chunk_bytes(2, 44100, 12)),
            Err(Error::Unsupported {
                offset: 22,
                feature: UnsupportedFeature::BitDepth(12)
            })
        ));
    }

    #[test]
    fn test_set_target_layout_keeps_rate() {
        let mut chunk = read(&chunk_bytes(1, 44100, 8)).unwrap();
        chunk.set_target_layout();
        assert_eq!(chunk, FormatChunk::TARGET);
    }
}
