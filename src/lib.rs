//! midify - render a MIDI track into a WAVE file by replaying it against an audio clip.
//!
//! This library provides the parsers for standard MIDI files and PCM WAVE
//! files, and the engine that turns one into the other.

pub mod codec;
pub mod error;
pub mod midi;
pub mod render;
pub mod wave;

// Re-export commonly used types
pub use error::{Error, Result};
pub use midi::{Midi, MidiSummary};
pub use render::render_track;
pub use wave::{Sample, Wave};
