//! Turning a MIDI track into audio.
//!
//! The engine walks the track one tick at a time. Every note-on places a copy
//! of a reference clip at the current sample offset, and every tick appends
//! `samples_per_tick` frames of silence, so the output length follows the
//! tempo map of the file.

pub mod engine;
pub mod mix;
pub mod tempo_map;

pub use engine::{render_track, OpenNotes};
pub use mix::append_or_combine;
pub use tempo_map::TempoMap;

/// Output frames covered by one tick.
///
/// `round(sample_rate * micros_per_quarter / 1e6 / division)`, with halves
/// rounded to even. A division of 0 yields 0.
pub fn samples_per_tick(division: u16, micros_per_quarter: u32, sample_rate: u32) -> u32 {
    if division == 0 {
        return 0;
    }
    let seconds_per_quarter = f64::from(micros_per_quarter) / 1_000_000.0;
    let samples = f64::from(sample_rate) * seconds_per_quarter / f64::from(division);
    samples.round_ties_even() as u32
}
