//! Schema-driven reading and writing of fixed-layout records.
//!
//! Every chunk header and event payload in this crate is a plain struct whose
//! fields are listed, in stream order, by a [`Schema`]. One generic reader
//! ([`ChunkStream::read_record`]) and one generic writer ([`write_record`])
//! handle all of them, so a new record shape only has to declare its fields.
//!
//! Records implement [`Record`] through the [`impl_record!`](crate::impl_record)
//! macro, which ties each schema entry to the struct field that stores it.

use super::bytes::{bytes_to_int, int_to_bytes, Endian};
use super::vlv::{read_vlv, Vlv};
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Cursor, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// How a field is laid out in the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A block of exactly `n` raw bytes.
    Fixed(usize),
    /// A single raw byte.
    Byte,
    /// A 4-byte integer in the record's byte order.
    Int32,
    /// A MIDI variable-length quantity.
    Vlv,
}

/// One named entry of a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldKind {
    /// Short name used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            FieldKind::Fixed(_) => "fixed-bytes",
            FieldKind::Byte => "byte",
            FieldKind::Int32 => "int32",
            FieldKind::Vlv => "vlv",
        }
    }
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Ordered field list of a record; the order is the byte order in the stream.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    fields: &'static [Field],
}

impl Schema {
    /// Builds a schema, rejecting more than one variable-length field.
    ///
    /// Used in `const` position the check happens at compile time.
    pub const fn new(fields: &'static [Field]) -> Self {
        let mut vlv_fields = 0;
        let mut i = 0;
        while i < fields.len() {
            if matches!(fields[i].kind, FieldKind::Vlv) {
                vlv_fields += 1;
            }
            i += 1;
        }
        assert!(vlv_fields <= 1, "a record may declare at most one VLV field");
        Self { fields }
    }

    /// Fields in stream order.
    pub fn fields(&self) -> &'static [Field] {
        self.fields
    }

    /// Name of the variable-length field, if the record has one.
    pub fn vlv_field(&self) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|f| f.kind == FieldKind::Vlv)
            .map(|f| f.name)
    }
}

/// Mutable storage behind one schema field.
#[derive(Debug)]
pub enum FieldSlot<'a> {
    Bytes(&'a mut [u8]),
    Byte(&'a mut u8),
    Int(&'a mut i32),
    Vlv(&'a mut Vlv),
}

/// Read-only view of one schema field.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Bytes(&'a [u8]),
    Byte(u8),
    Int(i32),
    Vlv(Vlv),
}

impl<'a, const N: usize> From<&'a mut [u8; N]> for FieldSlot<'a> {
    fn from(bytes: &'a mut [u8; N]) -> Self {
        FieldSlot::Bytes(bytes)
    }
}

impl<'a> From<&'a mut u8> for FieldSlot<'a> {
    fn from(byte: &'a mut u8) -> Self {
        FieldSlot::Byte(byte)
    }
}

impl<'a> From<&'a mut i32> for FieldSlot<'a> {
    fn from(value: &'a mut i32) -> Self {
        FieldSlot::Int(value)
    }
}

impl<'a> From<&'a mut Vlv> for FieldSlot<'a> {
    fn from(vlv: &'a mut Vlv) -> Self {
        FieldSlot::Vlv(vlv)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for FieldValue<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        FieldValue::Bytes(bytes)
    }
}

impl<'a> From<&'a u8> for FieldValue<'a> {
    fn from(byte: &'a u8) -> Self {
        FieldValue::Byte(*byte)
    }
}

impl<'a> From<&'a i32> for FieldValue<'a> {
    fn from(value: &'a i32) -> Self {
        FieldValue::Int(*value)
    }
}

impl<'a> From<&'a Vlv> for FieldValue<'a> {
    fn from(vlv: &'a Vlv) -> Self {
        FieldValue::Vlv(*vlv)
    }
}

/// A struct whose fields map onto a [`Schema`].
pub trait Record {
    /// Field layout, in stream order.
    const SCHEMA: Schema;

    /// Byte order of the record's [`FieldKind::Int32`] fields.
    const ENDIAN: Endian = Endian::Big;

    /// Storage for the field at `index` in [`Record::SCHEMA`].
    fn slot_mut(&mut self, index: usize) -> Option<FieldSlot<'_>>;

    /// Current value of the field at `index` in [`Record::SCHEMA`].
    fn value(&self, index: usize) -> Option<FieldValue<'_>>;
}

/// Implements [`Record`] for a struct by listing `"Name" => field: kind` entries.
///
/// Field paths may reach into embedded structs (`header.delta`).
///
/// ```ignore
/// impl_record!(HeaderChunk, Endian::Big, {
///     "Prefix" => prefix: FieldKind::Fixed(4),
///     "Size" => size: FieldKind::Fixed(4),
/// });
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ty, $endian:expr, { $($name:literal => $($field:ident).+ : $kind:expr),+ $(,)? }) => {
        impl $crate::codec::Record for $ty {
            const SCHEMA: $crate::codec::Schema = $crate::codec::Schema::new(&[
                $($crate::codec::Field::new($name, $kind)),+
            ]);
            const ENDIAN: $crate::codec::Endian = $endian;

            fn slot_mut(&mut self, index: usize) -> Option<$crate::codec::FieldSlot<'_>> {
                let slots = [$($crate::codec::FieldSlot::from(&mut self.$($field).+)),+];
                slots.into_iter().nth(index)
            }

            fn value(&self, index: usize) -> Option<$crate::codec::FieldValue<'_>> {
                let values = [$($crate::codec::FieldValue::from(&self.$($field).+)),+];
                values.get(index).copied()
            }
        }
    };
}

/// A byte stream with position tracking, read through [`Record`] schemas.
#[derive(Debug)]
pub struct ChunkStream<R> {
    inner: R,
    position: u64,
    len: u64,
}

impl ChunkStream<BufReader<File>> {
    /// Opens a file for parsing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the path does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<'a> ChunkStream<Cursor<&'a [u8]>> {
    /// Parses from an in-memory buffer.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(bytes),
            position: 0,
            len: bytes.len() as u64,
        }
    }
}

impl<R: Read + Seek> ChunkStream<R> {
    /// Wraps a seekable reader; the current position becomes offset 0 of the walk.
    pub fn new(mut inner: R) -> Result<Self> {
        let start = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(start))?;
        Ok(Self {
            inner,
            position: 0,
            len: end.saturating_sub(start),
        })
    }

    /// Current offset from the start of the walk.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total length of the stream.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True when the stream holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes left after the current position.
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    /// Fills `buf` completely.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncatedStream`] if fewer bytes remain.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let offset = self.position;
        self.inner.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => Error::TruncatedStream {
                offset,
                needed: buf.len(),
            },
            _ => Error::Io(e),
        })?;
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Reads one raw byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncatedStream`] at the end of the stream.
    pub fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    /// Reads a variable-length quantity at the current position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedVlv`] if the value runs past four bytes, or
    /// [`Error::TruncatedStream`] if the stream ends inside it.
    pub fn read_vlv(&mut self) -> Result<Vlv> {
        let vlv = read_vlv(&mut self.inner, self.position)?;
        self.position += vlv.encoded_len() as u64;
        Ok(vlv)
    }

    /// Moves forward `amount` bytes without reading them.
    pub fn skip(&mut self, amount: u64) -> Result<()> {
        if amount > self.remaining() {
            return Err(Error::TruncatedStream {
                offset: self.position,
                needed: usize::try_from(amount).unwrap_or(usize::MAX),
            });
        }
        self.inner.seek(SeekFrom::Current(amount as i64))?;
        self.position += amount;
        Ok(())
    }

    /// Moves back `amount` bytes so they are read again.
    pub fn rewind(&mut self, amount: u64) -> Result<()> {
        let amount = amount.min(self.position);
        self.inner.seek(SeekFrom::Current(-(amount as i64)))?;
        self.position -= amount;
        Ok(())
    }

    /// Reads `record` in its declared byte order, skipping the named fields.
    ///
    /// Returns the number of bytes consumed.
    pub fn read_record<T: Record>(&mut self, record: &mut T, skip: &[&str]) -> Result<usize> {
        self.read_record_with(record, skip, T::ENDIAN)
    }

    /// Reads `record`, converting its 32-bit integers with `endian`.
    ///
    /// Fields named in `skip` keep their current value and consume no bytes.
    pub fn read_record_with<T: Record>(
        &mut self,
        record: &mut T,
        skip: &[&str],
        endian: Endian,
    ) -> Result<usize> {
        let start = self.position;
        for (index, field) in T::SCHEMA.fields().iter().enumerate() {
            if skip.contains(&field.name) {
                continue;
            }
            let Some(slot) = record.slot_mut(index) else {
                continue;
            };
            match (field.kind, slot) {
                (FieldKind::Vlv, FieldSlot::Vlv(target)) => {
                    *target = self.read_vlv()?;
                }
                (FieldKind::Fixed(len), FieldSlot::Bytes(target)) if len == target.len() => {
                    self.read_exact(target)?;
                }
                (FieldKind::Byte, FieldSlot::Byte(target)) => {
                    *target = self.read_byte()?;
                }
                (FieldKind::Int32, FieldSlot::Int(target)) => {
                    let mut raw = [0u8; 4];
                    self.read_exact(&mut raw)?;
                    *target = bytes_to_int(&raw, endian)?;
                }
                (kind, _) => {
                    return Err(Error::FieldLayout {
                        offset: self.position,
                        field: field.name,
                        kind: kind.label(),
                    });
                }
            }
        }
        Ok((self.position - start) as usize)
    }
}

/// Serializes `record` field by field, leaving out the names in `skip`.
///
/// 32-bit integers use the record's declared byte order; a VLV field is
/// re-encoded with continuation bits. Returns the number of bytes written.
pub fn write_record<W: Write, T: Record>(writer: &mut W, record: &T, skip: &[&str]) -> Result<usize> {
    let mut written = 0;
    for (index, field) in T::SCHEMA.fields().iter().enumerate() {
        if skip.contains(&field.name) {
            continue;
        }
        let Some(value) = record.value(index) else {
            continue;
        };
        let bytes = match (field.kind, value) {
            (FieldKind::Fixed(len), FieldValue::Bytes(bytes)) if len == bytes.len() => bytes.to_vec(),
            (FieldKind::Byte, FieldValue::Byte(byte)) => vec![byte],
            (FieldKind::Int32, FieldValue::Int(value)) => int_to_bytes(value, 4, T::ENDIAN)?,
            (FieldKind::Vlv, FieldValue::Vlv(vlv)) => vlv.encode(),
            (kind, _) => {
                return Err(Error::FieldLayout {
                    offset: written as u64,
                    field: field.name,
                    kind: kind.label(),
                });
            }
        };
        writer.write_all(&bytes)?;
        written += bytes.len();
    }
    Ok(written)
}
