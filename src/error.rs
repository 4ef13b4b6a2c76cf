//! Error types shared by the codec, MIDI, WAVE and render layers.
//!
//! Every failure that happens while walking a byte stream records the offset
//! of the field that could not be accepted, so callers can point at the exact
//! spot in the input file.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while loading, rendering or saving.
#[derive(Debug, Error)]
pub enum Error {
    /// The input path does not exist.
    #[error("file '{}' does not exist", path.display())]
    FileNotFound { path: PathBuf },

    /// Wrong magic tag, wrong declared chunk size, or an otherwise malformed header.
    #[error("malformed header at byte {offset}: {problem}")]
    MalformedHeader { offset: u64, problem: HeaderProblem },

    /// A well-formed input that uses something this crate does not handle.
    #[error("unsupported input at byte {offset}: {feature}")]
    Unsupported {
        offset: u64,
        feature: UnsupportedFeature,
    },

    /// A channel-voice status byte whose high nibble matches no known event.
    #[error("unknown midi event type 0x{status:02X} at byte {offset}")]
    UnknownEventType { offset: u64, status: u8 },

    /// The stream ended before a field was complete.
    #[error("stream truncated at byte {offset}: needed {needed} more byte(s)")]
    TruncatedStream { offset: u64, needed: usize },

    /// A variable-length quantity that runs past four bytes.
    #[error("variable-length value at byte {offset} is longer than 4 bytes")]
    MalformedVlv { offset: u64 },

    /// Integer conversion was asked for a width other than 1 to 4 bytes.
    #[error("cannot convert {len} byte(s) to an integer (expected 1 to 4)")]
    InvalidIntWidth { len: usize },

    /// A note event addressed a slot outside the 16 x 128 note table.
    #[error("note out of range: channel {channel}, pitch {pitch}")]
    NoteOutOfRange { channel: u8, pitch: u8 },

    /// The requested track does not exist after normalisation.
    #[error("track {index} does not exist (file has {available} playable track(s))")]
    TrackNotFound { index: usize, available: usize },

    /// A record declared a field kind that its storage cannot hold.
    #[error("record field '{field}' at byte {offset} is stored as the wrong type for its {kind} layout")]
    FieldLayout {
        offset: u64,
        field: &'static str,
        kind: &'static str,
    },

    /// Refused to replace an existing output file.
    #[error("'{}' already exists", path.display())]
    OutputExists { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Which header check failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderProblem {
    /// A chunk started with the wrong four-character tag.
    Tag {
        expected: &'static str,
        found: String,
    },
    /// The MIDI header declared a payload size other than 6.
    MidiHeaderSize(i32),
    /// The `fmt ` chunk declared a size other than 16.
    FormatChunkSize(i32),
    /// The WAVE file is not larger than the minimal 44-byte layout.
    TooSmall(u64),
}

impl fmt::Display for HeaderProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderProblem::Tag { expected, found } => {
                write!(f, "expected '{expected}' tag, found '{found}'")
            }
            HeaderProblem::MidiHeaderSize(size) => {
                write!(f, "midi header size is {size}, expected 6")
            }
            HeaderProblem::FormatChunkSize(size) => {
                write!(f, "format chunk size is {size}, not 16; wave file might not be PCM")
            }
            HeaderProblem::TooSmall(len) => write!(f, "wave file too small ({len} bytes)"),
        }
    }
}

/// Features recognised in an input but deliberately not handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedFeature {
    /// SMF format 2 (several independent songs).
    MultiSong,
    /// SMPTE time division instead of ticks per quarter note.
    SmpteDivision(u16),
    /// A division of zero ticks per quarter note.
    ZeroDivision,
    /// System exclusive events (0xF0 / 0xF7).
    SysEx(u8),
    /// A compressed or otherwise non-PCM WAVE format tag.
    NonPcm(i32),
    /// More than two, or zero, audio channels.
    ChannelCount(i32),
    /// A sample rate other than the fixed target.
    SampleRate { found: i32, expected: u32 },
    /// A bit depth that cannot be normalised to 16 bits.
    BitDepth(i32),
}

impl fmt::Display for UnsupportedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedFeature::MultiSong => {
                write!(f, "midi files with multiple songs are not supported")
            }
            UnsupportedFeature::SmpteDivision(raw) => {
                write!(f, "SMPTE time division 0x{raw:04X} is not supported")
            }
            UnsupportedFeature::ZeroDivision => write!(f, "division of 0 ticks per quarter note"),
            UnsupportedFeature::SysEx(status) => {
                write!(f, "system exclusive events (0x{status:02X}) are not supported")
            }
            UnsupportedFeature::NonPcm(tag) => write!(f, "wave format {tag} is not PCM"),
            UnsupportedFeature::ChannelCount(n) => {
                write!(f, "{n} channels in wave file (1 or 2 supported)")
            }
            UnsupportedFeature::SampleRate { found, expected } => {
                write!(f, "sample rate is {found}, not {expected}")
            }
            UnsupportedFeature::BitDepth(bits) => {
                write!(f, "{bits}-bit wave cannot be converted to 16-bit audio")
            }
        }
    }
}

impl Error {
    /// Byte offset in the input stream, when the error came from one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Error::MalformedHeader { offset, .. }
            | Error::Unsupported { offset, .. }
            | Error::UnknownEventType { offset, .. }
            | Error::TruncatedStream { offset, .. }
            | Error::MalformedVlv { offset }
            | Error::FieldLayout { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    pub(crate) fn tag(offset: u64, expected: &'static str, found: &[u8]) -> Self {
        Error::MalformedHeader {
            offset,
            problem: HeaderProblem::Tag {
                expected,
                found: crate::codec::bytes_to_ascii(found),
            },
        }
    }

    pub(crate) fn unsupported(offset: u64, feature: UnsupportedFeature) -> Self {
        Error::Unsupported { offset, feature }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failed_check() {
        let err = Error::tag(0, "MThd", b"RIFF");
        assert_eq!(
            err.to_string(),
            "malformed header at byte 0: expected 'MThd' tag, found 'RIFF'"
        );
        assert_eq!(err.offset(), Some(0));

        let err = Error::unsupported(
            24,
            UnsupportedFeature::SampleRate {
                found: 48000,
                expected: 44100,
            },
        );
        assert!(err.to_string().contains("sample rate is 48000, not 44100"));
        assert_eq!(err.offset(), Some(24));
    }

    #[test]
    fn test_offset_absent_for_path_errors() {
        let err = Error::FileNotFound {
            path: PathBuf::from("missing.mid"),
        };
        assert_eq!(err.offset(), None);
        assert_eq!(err.to_string(), "file 'missing.mid' does not exist");
    }
}
