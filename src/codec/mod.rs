//! Binary building blocks shared by the MIDI and WAVE parsers.
//!
//! - [`bytes`] converts raw byte groups to integers and text
//! - [`vlv`] reads and writes MIDI variable-length quantities
//! - [`record`] walks a declared field schema against a byte stream

pub mod bytes;
pub mod record;
pub mod vlv;

pub use bytes::{bytes_to_ascii, bytes_to_int, int_to_bytes, Endian};
pub use record::{write_record, ChunkStream, Field, FieldKind, FieldSlot, FieldValue, Record, Schema};
pub use vlv::{read_vlv, write_vlv, Vlv};
