//! `LIST` metadata chunks, which may sit between `fmt ` and `data`.

use crate::codec::{ChunkStream, Endian, FieldKind};
use crate::error::Result;
use crate::impl_record;
use std::io::{Read, Seek};
use tracing::debug;

pub const LIST_TAG: &[u8; 4] = b"LIST";

/// Tag and size of a candidate chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListChunk {
    pub prefix: [u8; 4],
    pub size: i32,
}

impl_record!(ListChunk, Endian::Little, {
    "Prefix" => prefix: FieldKind::Fixed(4),
    "Size" => size: FieldKind::Int32,
});

const CHUNK_HEADER_LEN: u64 = 8;

impl ListChunk {
    /// Skips every consecutive `LIST` chunk.
    ///
    /// The first chunk header that is not `LIST` is un-read, so the stream is
    /// left at its tag. Returns how many chunks were skipped.
    pub fn skip_all<R: Read + Seek>(stream: &mut ChunkStream<R>) -> Result<usize> {
        let mut skipped = 0;
        loop {
            let start = stream.position();
            let mut chunk = Self::default();
            stream.read_record(&mut chunk, &[])?;
            if &chunk.prefix != LIST_TAG {
                stream.rewind(CHUNK_HEADER_LEN)?;
                return Ok(skipped);
            }
            debug!(offset = start, size = chunk.size, "skipping LIST chunk");
            stream.skip(u64::try_from(chunk.size).unwrap_or(0))?;
            skipped += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_no_list_leaves_stream_in_place() {
        let bytes = b"data\x04\x00\x00\x00\x01\x02\x03\x04";
        let mut stream = ChunkStream::from_bytes(bytes);
        assert_eq!(ListChunk::skip_all(&mut stream).unwrap(), 0);
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn test_skips_consecutive_lists() {
        let mut bytes = Vec::new();
        for payload in [&b"INFOISFT"[..], &b"INFO"[..]] {
            bytes.extend_from_slice(LIST_TAG);
            bytes.extend_from_slice(&(payload.len() as i32).to_le_bytes());
            bytes.extend_from_slice(payload);
        }
        let data_at = bytes.len() as u64;
        bytes.extend_from_slice(b"data\x00\x00\x00\x00");

        let mut stream = ChunkStream::from_bytes(&bytes);
        assert_eq!(ListChunk::skip_all(&mut stream).unwrap(), 2);
        assert_eq!(stream.position(), data_at);
    }

    #[test]
    fn test_list_longer_than_file() {
        let bytes = b"LIST\xFF\x00\x00\x00INFO";
        let err = ListChunk::skip_all(&mut ChunkStream::from_bytes(bytes)).unwrap_err();
        assert!(matches!(err, Error::TruncatedStream { offset: 8, .. }));
    }
}
