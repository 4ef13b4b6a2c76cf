//! Builders for synthetic MIDI and WAVE fixtures.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Appends `value` as a MIDI variable-length quantity.
pub fn vlv(mut value: u32, out: &mut Vec<u8>) {
    let mut groups = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        groups.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    out.extend(groups.into_iter().rev());
}

/// Event stream of one track, built from delta-timed raw events.
#[derive(Default)]
pub struct TrackBuilder {
    body: Vec<u8>,
}

impl TrackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(mut self, delta: u32, bytes: &[u8]) -> Self {
        vlv(delta, &mut self.body);
        self.body.extend_from_slice(bytes);
        self
    }

    pub fn note_on(self, delta: u32, channel: u8, pitch: u8) -> Self {
        self.event(delta, &[0x90 | channel, pitch, 100])
    }

    pub fn note_off(self, delta: u32, channel: u8, pitch: u8) -> Self {
        self.event(delta, &[0x80 | channel, pitch, 0])
    }

    pub fn tempo(self, delta: u32, micros: u32) -> Self {
        let b = micros.to_be_bytes();
        self.event(delta, &[0xFF, 0x51, 0x03, b[1], b[2], b[3]])
    }

    /// Closes the track with an end-of-track meta event.
    pub fn finish(self, delta: u32) -> Vec<u8> {
        let mut track = self.event(delta, &[0xFF, 0x2F, 0x00]);
        let mut out = b"MTrk".to_vec();
        out.extend_from_slice(&(track.body.len() as u32).to_be_bytes());
        out.append(&mut track.body);
        out
    }
}

/// A complete SMF with the given format, division and finished tracks.
pub fn midi_file(format: u16, division: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = b"MThd".to_vec();
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&format.to_be_bytes());
    out.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    out.extend_from_slice(&division.to_be_bytes());
    for track in tracks {
        out.extend_from_slice(track);
    }
    out
}

/// Writes a 16-bit mono 44100 Hz clip with hound.
pub fn write_mono_clip(path: &Path, values: &[i16]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &v in values {
        writer.write_sample(v).unwrap();
    }
    writer.finalize().unwrap();
}

/// Writes `bytes` to `name` inside `dir` and returns the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
