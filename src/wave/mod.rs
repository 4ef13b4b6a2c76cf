//! RIFF/WAVE PCM files.
//!
//! A clip is loaded in one pass (header, format, optional `LIST` chunks, data)
//! and then normalised: samples are converted to 16 bits, mono becomes stereo,
//! and silence is trimmed from both ends. Rendered output always uses the
//! 16-bit stereo 44100 Hz layout of [`FormatChunk::TARGET`].

pub mod data;
pub mod format;
pub mod header;
pub mod list;
pub mod sample;

pub use data::DataChunk;
pub use format::FormatChunk;
pub use header::RiffHeader;
pub use list::ListChunk;
pub use sample::Sample;

use crate::codec::{write_record, ChunkStream};
use crate::error::{Error, HeaderProblem, Result, UnsupportedFeature};
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;
use tracing::{debug, info, info_span};

/// Size of a file with the three chunk headers and no samples.
pub const MIN_SIZE: u32 = 44;

pub const TARGET_SAMPLE_RATE: u32 = 44_100;
pub const TARGET_BITS: u16 = 16;
pub const TARGET_CHANNELS: u16 = 2;

/// Offset of the bit depth field in a file with no chunks before `fmt `.
const BITS_FIELD_OFFSET: u64 = 34;

/// Volume level that leaves samples unchanged.
pub const UNITY_VOLUME: i32 = 64;

/// A loaded or rendered WAVE file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Wave {
    pub header: RiffHeader,
    pub format: FormatChunk,
    pub data: DataChunk,
}

impl Wave {
    /// A 16-bit stereo file holding `samples`.
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        let mut wave = Self {
            data: DataChunk::from_samples(samples),
            ..Self::default()
        };
        wave.update_file_size();
        wave
    }

    /// Loads and normalises a WAVE file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] for a missing path, or the first
    /// validation that failed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let _span = info_span!("wave", path = %path.display()).entered();
        let mut stream = ChunkStream::open(path)?;
        Self::read(&mut stream)
    }

    /// Loads and normalises a WAVE file held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read(&mut ChunkStream::from_bytes(bytes))
    }

    /// Reads header, format, any `LIST` chunks and data, then converts to
    /// 16 bits and trims silence.
    pub fn read<R: Read + Seek>(stream: &mut ChunkStream<R>) -> Result<Self> {
        if stream.remaining() <= u64::from(MIN_SIZE) {
            return Err(Error::MalformedHeader {
                offset: stream.position(),
                problem: HeaderProblem::TooSmall(stream.remaining()),
            });
        }

        let header = RiffHeader::read(stream)?;
        let format = FormatChunk::read(stream)?;
        ListChunk::skip_all(stream)?;
        let data = DataChunk::read(stream, &format)?;

        let mut wave = Self {
            header,
            format,
            data,
        };
        wave.normalize_to_16bit()?;
        let trimmed = wave.trim();

        info!(
            frames = wave.frame_count(),
            trimmed,
            source_bits = format.bits_per_channel(),
            source_channels = format.channels(),
            "loaded wave file"
        );
        Ok(wave)
    }

    /// Converts every frame to 16-bit stereo and publishes that layout in the
    /// format chunk, recomputing the data and file sizes.
    ///
    /// A file that already is 16-bit stereo is left exactly as it is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] for a bit depth other than 8, 16, 24 or 32.
    pub fn normalize_to_16bit(&mut self) -> Result<()> {
        if self.format.is_target_layout() {
            return Ok(());
        }

        let bits = self.format.bits_per_channel();
        match bits {
            16 => {}
            8 | 24 | 32 => {
                debug!(bits, frames = self.frame_count(), "converting samples to 16-bit");
                for sample in &mut self.data.samples {
                    sample.to_16bit();
                }
            }
            other => {
                return Err(Error::unsupported(
                    BITS_FIELD_OFFSET,
                    UnsupportedFeature::BitDepth(i32::from(other)),
                ))
            }
        }

        self.format.set_target_layout();
        self.data.size = data::frames_to_size(self.frame_count());
        self.update_file_size();
        Ok(())
    }

    /// Drops silent frames at both ends and updates the file size.
    ///
    /// Returns the number of frames removed.
    pub fn trim(&mut self) -> usize {
        let removed = self.data.trim();
        self.update_file_size();
        removed
    }

    /// Frames in playback order.
    pub fn samples(&self) -> &[Sample] {
        &self.data.samples
    }

    pub fn frame_count(&self) -> usize {
        self.data.frame_count()
    }

    /// Playing time in seconds at the format's sample rate.
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / f64::from(self.format.sample_rate().max(1))
    }

    /// Scales every sample by `level / 64`, clamping at the 16-bit limits.
    pub fn change_volume(&mut self, level: i32) {
        let modifier = f64::from(level) / f64::from(UNITY_VOLUME);
        for sample in &mut self.data.samples {
            *sample = sample.scale(modifier);
        }
    }

    /// Writes header, format, data header and every frame.
    ///
    /// Returns the number of bytes written.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let mut written = write_record(writer, &self.header, &[])?;
        written += write_record(writer, &self.format, &[])?;
        written += write_record(writer, &self.data, &[])?;
        for sample in self.samples() {
            writer.write_all(sample.left())?;
            writer.write_all(sample.right())?;
            written += 2 * sample.width();
        }
        Ok(written)
    }

    /// Saves the file to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputExists`] if the path exists and `overwrite` is false.
    pub fn save<P: AsRef<Path>>(&self, path: P, overwrite: bool) -> Result<()> {
        let path = path.as_ref();
        if path.exists() && !overwrite {
            return Err(Error::OutputExists {
                path: path.to_path_buf(),
            });
        }

        let mut writer = BufWriter::new(File::create(path)?);
        let bytes = self.write_to(&mut writer)?;
        writer.flush()?;

        info!(path = %path.display(), bytes, frames = self.frame_count(), "saved wave file");
        Ok(())
    }

    fn update_file_size(&mut self) {
        self.header.file_size = (MIN_SIZE as i32).saturating_add(self.data.size);
    }
}
