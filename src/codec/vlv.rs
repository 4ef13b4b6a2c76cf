//! MIDI variable-length quantities.
//!
//! Each byte carries 7 data bits in its low bits; a set high bit means
//! another byte follows. Groups are stored most significant first and a
//! valid quantity never uses more than 4 bytes (28 data bits).

use super::bytes::{bytes_to_int, Endian};
use crate::error::{Error, Result};
use std::io::{ErrorKind, Read};

/// Largest number of bytes a MIDI variable-length quantity may occupy.
pub const MAX_VLV_LEN: usize = 4;

/// Largest value that fits in [`MAX_VLV_LEN`] bytes.
pub const MAX_VLV_VALUE: u32 = 0x0FFF_FFFF;

/// A decoded variable-length quantity plus the number of bytes it occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Vlv {
    value: u32,
    len: u8,
}

impl Vlv {
    /// Wraps a value, recording the length of its shortest encoding.
    ///
    /// Values above [`MAX_VLV_VALUE`] are masked to 28 bits.
    pub fn new(value: u32) -> Self {
        let value = value & MAX_VLV_VALUE;
        let mut len = 1;
        let mut rest = value >> 7;
        while rest > 0 {
            len += 1;
            rest >>= 7;
        }
        Self { value, len }
    }

    /// The decoded integer.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Number of bytes the quantity occupied in the stream.
    pub fn encoded_len(&self) -> usize {
        self.len as usize
    }

    /// Decoded value as big-endian bytes, one byte per encoded byte.
    ///
    /// A 3-byte result is what [`bytes_to_int`] pads to 32 bits.
    pub fn raw_bytes(&self) -> Vec<u8> {
        let len = self.encoded_len().max(1);
        self.value.to_be_bytes()[MAX_VLV_LEN - len..].to_vec()
    }

    /// Re-encodes the value with continuation bits.
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(MAX_VLV_LEN);
        write_vlv(self.value, &mut buffer);
        buffer
    }
}

impl From<u32> for Vlv {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// Reads one variable-length quantity starting at stream offset `offset`.
///
/// # Errors
///
/// - [`Error::TruncatedStream`] if the stream ends before the final byte
/// - [`Error::MalformedVlv`] if no terminating byte appears within 4 bytes
pub fn read_vlv<R: Read>(reader: &mut R, offset: u64) -> Result<Vlv> {
    let mut groups = Vec::with_capacity(MAX_VLV_LEN);
    loop {
        if groups.len() == MAX_VLV_LEN {
            return Err(Error::MalformedVlv { offset });
        }
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => Error::TruncatedStream {
                offset: offset + groups.len() as u64,
                needed: 1,
            },
            _ => Error::Io(e),
        })?;
        groups.push(byte[0] & 0x7F);
        if byte[0] & 0x80 == 0 {
            break;
        }
    }

    // Pack the 7-bit groups into bytes, most significant group first
    let value = groups
        .iter()
        .fold(0u32, |acc, &group| (acc << 7) | u32::from(group));
    let vlv = Vlv {
        value,
        len: groups.len() as u8,
    };
    debug_assert_eq!(
        bytes_to_int(&vlv.raw_bytes(), Endian::Big).ok(),
        i32::try_from(value).ok()
    );
    Ok(vlv)
}

/// Writes a variable-length quantity used for delta times and meta lengths.
///
/// # Arguments
///
/// * `value` - The value to encode (max 0x0FFFFFFF for MIDI)
/// * `buffer` - Output buffer to write to
pub fn write_vlv(value: u32, buffer: &mut Vec<u8>) {
    if value == 0 {
        buffer.push(0);
        return;
    }

    let mut temp = value & MAX_VLV_VALUE;
    let mut bytes = Vec::with_capacity(MAX_VLV_LEN);

    while temp > 0 {
        bytes.push((temp & 0x7F) as u8);
        temp >>= 7;
    }

    // Reverse order, continuation bit on all but the last byte
    for (i, &byte) in bytes.iter().rev().enumerate() {
        if i < bytes.len() - 1 {
            buffer.push(byte | 0x80);
        } else {
            buffer.push(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode(bytes: &[u8]) -> Result<Vlv> {
        read_vlv(&mut Cursor::new(bytes), 0)
    }

    #[test]
    fn test_vlv_encoding() {
        let mut buffer = Vec::new();

        write_vlv(0, &mut buffer);
        assert_eq!(buffer, vec![0x00]);
        buffer.clear();

        write_vlv(127, &mut buffer);
        assert_eq!(buffer, vec![0x7F]);
        buffer.clear();

        write_vlv(128, &mut buffer);
        assert_eq!(buffer, vec![0x81, 0x00]);
        buffer.clear();

        write_vlv(0x3FFF, &mut buffer);
        assert_eq!(buffer, vec![0xFF, 0x7F]);
        buffer.clear();

        write_vlv(0x4000, &mut buffer);
        assert_eq!(buffer, vec![0x81, 0x80, 0x00]);
        buffer.clear();

        write_vlv(MAX_VLV_VALUE, &mut buffer);
        assert_eq!(buffer, vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_decode_known_values() {
        let vlv = decode(&[0x81, 0x80, 0x00]).unwrap();
        assert_eq!(vlv.value(), 0x4000);
        assert_eq!(vlv.encoded_len(), 3);

        let vlv = decode(&[0x60, 0xFF]).unwrap();
        assert_eq!(vlv.value(), 0x60);
        assert_eq!(vlv.encoded_len(), 1);
    }

    #[test]
    fn test_round_trip_boundaries() {
        for value in [
            0,
            1,
            0x7F,
            0x80,
            0x2000,
            0x3FFF,
            0x4000,
            0x1F_FFFF,
            0x20_0000,
            MAX_VLV_VALUE,
        ] {
            let encoded = Vlv::new(value).encode();
            let decoded = decode(&encoded).unwrap();
            assert_eq!(decoded.value(), value);
            assert_eq!(decoded.encoded_len(), encoded.len());
            assert_eq!(Vlv::new(value).encoded_len(), encoded.len());
        }
    }

    #[test]
    fn test_three_byte_raw_representation_pads_to_int() {
        let vlv = decode(&[0x9E, 0xC2, 0x20]).unwrap();
        let raw = vlv.raw_bytes();
        assert_eq!(raw.len(), 3);
        assert_eq!(
            bytes_to_int(&raw, Endian::Big).unwrap() as u32,
            vlv.value()
        );
    }

    #[test]
    fn test_too_long_is_rejected() {
        assert!(matches!(
            decode(&[0x81, 0x81, 0x81, 0x81, 0x01]),
            Err(Error::MalformedVlv { offset: 0 })
        ));
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(
            decode(&[0x81, 0x81]),
            Err(Error::TruncatedStream { offset: 2, .. })
        ));
    }
}
