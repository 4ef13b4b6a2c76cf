//! One stereo frame of PCM audio.

use crate::codec::{bytes_to_int, Endian};

/// Widest channel the format layer accepts (32-bit).
pub const MAX_CHANNEL_BYTES: usize = 4;

/// A left/right pair of little-endian channel values, each `width` bytes wide.
///
/// Mono input is duplicated into both channels when read, so every frame in
/// memory is stereo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    width: u8,
    left: [u8; MAX_CHANNEL_BYTES],
    right: [u8; MAX_CHANNEL_BYTES],
}

impl Default for Sample {
    fn default() -> Self {
        Self::from_i16(0, 0)
    }
}

impl Sample {
    /// A 16-bit frame.
    pub fn from_i16(left: i16, right: i16) -> Self {
        let mut sample = Self {
            width: 2,
            left: [0; MAX_CHANNEL_BYTES],
            right: [0; MAX_CHANNEL_BYTES],
        };
        sample.left[..2].copy_from_slice(&left.to_le_bytes());
        sample.right[..2].copy_from_slice(&right.to_le_bytes());
        sample
    }

    /// A frame from raw channel bytes; both slices must have the same 1 to 4 byte width.
    pub fn from_channels(left: &[u8], right: &[u8]) -> Self {
        debug_assert_eq!(left.len(), right.len());
        let width = left.len().min(right.len()).min(MAX_CHANNEL_BYTES);
        let mut sample = Self {
            width: width as u8,
            left: [0; MAX_CHANNEL_BYTES],
            right: [0; MAX_CHANNEL_BYTES],
        };
        sample.left[..width].copy_from_slice(&left[..width]);
        sample.right[..width].copy_from_slice(&right[..width]);
        sample
    }

    /// Bytes per channel.
    pub fn width(&self) -> usize {
        self.width as usize
    }

    /// Little-endian bytes of the left channel.
    pub fn left(&self) -> &[u8] {
        &self.left[..self.width()]
    }

    /// Little-endian bytes of the right channel.
    pub fn right(&self) -> &[u8] {
        &self.right[..self.width()]
    }

    /// Left channel of a 16-bit frame.
    pub fn left_i16(&self) -> i16 {
        i16::from_le_bytes([self.left[0], self.left[1]])
    }

    /// Right channel of a 16-bit frame.
    pub fn right_i16(&self) -> i16 {
        i16::from_le_bytes([self.right[0], self.right[1]])
    }

    /// True when every byte of both channels is zero.
    pub fn is_silent(&self) -> bool {
        self.left().iter().chain(self.right()).all(|&b| b == 0)
    }

    /// Rescales both channels to 16 bits.
    ///
    /// 8-bit values are multiplied by 255, 24-bit values divided by 255 and
    /// 32-bit values divided by 65535, then truncated to 16 bits. 16-bit
    /// frames are left untouched.
    pub fn to_16bit(&mut self) {
        if self.width == 2 {
            return;
        }
        let scale = |bytes: &[u8], width: u8| -> i16 {
            let value = bytes_to_int(bytes, Endian::Little).unwrap_or(0);
            let scaled = match width {
                1 => value.wrapping_mul(i32::from(u8::MAX)),
                3 => value / i32::from(u8::MAX),
                _ => value / i32::from(u16::MAX),
            };
            scaled as i16
        };
        let left = scale(self.left(), self.width);
        let right = scale(self.right(), self.width);
        *self = Self::from_i16(left, right);
    }

    /// Mixes two 16-bit frames by halving each and summing, truncating toward zero.
    pub fn combine(&self, other: &Sample) -> Sample {
        Sample::from_i16(
            self.left_i16() / 2 + other.left_i16() / 2,
            self.right_i16() / 2 + other.right_i16() / 2,
        )
    }

    /// Scales a 16-bit frame by `modifier`, clamped to +-`i16::MAX`.
    pub fn scale(&self, modifier: f64) -> Sample {
        let limit = f64::from(i16::MAX);
        let apply = |v: i16| (f64::from(v) * modifier).clamp(-limit, limit) as i16;
        Sample::from_i16(apply(self.left_i16()), apply(self.right_i16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_truncates_toward_zero() {
        let a = Sample::from_i16(1000, 7);
        let b = Sample::from_i16(-2000, -7);
        let mixed = a.combine(&b);
        assert_eq!(mixed.left_i16(), -500);
        assert_eq!(mixed.right_i16(), 0);
    }

    #[test]
    fn test_eight_bit_scaled_by_255() {
        let mut s = Sample::from_channels(&[0x02], &[0x80]);
        s.to_16bit();
        assert_eq!(s.width(), 2);
        assert_eq!(s.left_i16(), 510);
        // 128 * 255 = 32640 still fits
        assert_eq!(s.right_i16(), 32640);
    }

    #[test]
    fn test_twenty_four_bit_divided_by_255() {
        let mut s = Sample::from_channels(&[0xFF, 0x00, 0x00], &[0x00, 0x10, 0x00]);
        s.to_16bit();
        assert_eq!(s.left_i16(), 1);
        assert_eq!(s.right_i16(), (0x1000 / 255) as i16);
    }

    #[test]
    fn test_thirty_two_bit_divided_by_u16_max() {
        let value: i32 = -(65535 * 300);
        let mut s = Sample::from_channels(&value.to_le_bytes(), &0i32.to_le_bytes());
        s.to_16bit();
        assert_eq!(s.left_i16(), -300);
        assert!(!s.is_silent());
        assert_eq!(s.right_i16(), 0);
    }

    #[test]
    fn test_sixteen_bit_untouched() {
        let mut s = Sample::from_i16(-12345, 321);
        let before = s;
        s.to_16bit();
        assert_eq!(s, before);
    }

    #[test]
    fn test_silence_and_scale() {
        assert!(Sample::default().is_silent());
        assert!(!Sample::from_i16(0, 1).is_silent());

        let loud = Sample::from_i16(20000, -20000).scale(2.0);
        assert_eq!(loud.left_i16(), i16::MAX);
        assert_eq!(loud.right_i16(), -i16::MAX);
        assert_eq!(Sample::from_i16(100, -100).scale(0.5), Sample::from_i16(50, -50));
    }
}
