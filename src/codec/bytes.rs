//! Conversions between byte groups and integers or ASCII text.
//!
//! MIDI stores every number big-endian while RIFF/WAVE stores them
//! little-endian, so each conversion names the byte order explicitly.

use crate::error::{Error, Result};

/// Byte order of an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    /// Most significant byte first (MIDI).
    #[default]
    Big,
    /// Least significant byte first (RIFF/WAVE).
    Little,
}

/// Interprets 1 to 4 bytes as an integer.
///
/// - 1 byte is read unsigned
/// - 2 bytes are read as a signed 16-bit value
/// - 3 bytes are padded with a zero most-significant byte and read as 32 bits
/// - 4 bytes are read as a signed 32-bit value
///
/// # Errors
///
/// Returns [`Error::InvalidIntWidth`] for any other length.
///
/// # Examples
///
/// ```
/// use midify::codec::{bytes_to_int, Endian};
///
/// // Default MIDI tempo: 500000 microseconds per quarter note
/// assert_eq!(bytes_to_int(&[0x07, 0xA1, 0x20], Endian::Big).unwrap(), 500_000);
/// ```
pub fn bytes_to_int(bytes: &[u8], endian: Endian) -> Result<i32> {
    let value = match (bytes, endian) {
        ([b], _) => i32::from(*b),
        ([a, b], Endian::Big) => i32::from(i16::from_be_bytes([*a, *b])),
        ([a, b], Endian::Little) => i32::from(i16::from_le_bytes([*a, *b])),
        ([a, b, c], Endian::Big) => i32::from_be_bytes([0, *a, *b, *c]),
        ([a, b, c], Endian::Little) => i32::from_le_bytes([*a, *b, *c, 0]),
        ([a, b, c, d], Endian::Big) => i32::from_be_bytes([*a, *b, *c, *d]),
        ([a, b, c, d], Endian::Little) => i32::from_le_bytes([*a, *b, *c, *d]),
        _ => return Err(Error::InvalidIntWidth { len: bytes.len() }),
    };
    Ok(value)
}

/// Serializes `value` into `width` bytes; the inverse of [`bytes_to_int`].
///
/// Values wider than the target are truncated to their low bytes.
///
/// # Errors
///
/// Returns [`Error::InvalidIntWidth`] when `width` is not 1 to 4.
pub fn int_to_bytes(value: i32, width: usize, endian: Endian) -> Result<Vec<u8>> {
    let bytes = match (width, endian) {
        (1, _) => vec![value as u8],
        (2, Endian::Big) => (value as i16).to_be_bytes().to_vec(),
        (2, Endian::Little) => (value as i16).to_le_bytes().to_vec(),
        (3, Endian::Big) => value.to_be_bytes()[1..].to_vec(),
        (3, Endian::Little) => value.to_le_bytes()[..3].to_vec(),
        (4, Endian::Big) => value.to_be_bytes().to_vec(),
        (4, Endian::Little) => value.to_le_bytes().to_vec(),
        _ => return Err(Error::InvalidIntWidth { len: width }),
    };
    Ok(bytes)
}

/// Maps each byte to the character with the same code point.
///
/// Used for four-character chunk tags such as `MThd` or `RIFF`.
pub fn bytes_to_ascii(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
