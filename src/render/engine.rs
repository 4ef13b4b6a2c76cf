//! Tick-by-tick replay of one track against a reference clip.

use super::mix::append_or_combine;
use super::tempo_map::TempoMap;
use crate::error::{Error, Result};
use crate::midi::event::controller;
use crate::midi::{EventKind, Midi, NoteEvent, TrackChunk};
use crate::wave::{Wave, TARGET_SAMPLE_RATE};
use tracing::{debug, info, info_span, warn};

pub const CHANNELS: usize = 16;
pub const PITCHES: usize = 128;

/// Which (channel, pitch) slots currently hold a sounding note.
#[derive(Debug, Clone)]
pub struct OpenNotes {
    slots: [[Option<NoteEvent>; PITCHES]; CHANNELS],
}

impl Default for OpenNotes {
    fn default() -> Self {
        Self {
            slots: [[None; PITCHES]; CHANNELS],
        }
    }
}

impl OpenNotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the slot if it is free, closes it otherwise.
    ///
    /// Returns `true` when the note was opened. Note-on and note-off events
    /// are treated alike; only the slot state decides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteOutOfRange`] for a channel above 15 or a pitch above 127.
    pub fn toggle(&mut self, channel: u8, note: NoteEvent) -> Result<bool> {
        let slot = self
            .slots
            .get_mut(usize::from(channel))
            .and_then(|pitches| pitches.get_mut(usize::from(note.pitch)))
            .ok_or(Error::NoteOutOfRange {
                channel,
                pitch: note.pitch,
            })?;
        Ok(match slot.take() {
            Some(_) => false,
            None => {
                *slot = Some(note);
                true
            }
        })
    }

    /// Releases every note on every channel.
    pub fn clear(&mut self) {
        self.slots = [[None; PITCHES]; CHANNELS];
    }

    /// Whether a note is currently sounding on `channel` at `pitch`.
    ///
    /// Out-of-range arguments report `false`.
    pub fn is_open(&self, channel: u8, pitch: u8) -> bool {
        self.slots
            .get(usize::from(channel))
            .and_then(|pitches| pitches.get(usize::from(pitch)))
            .is_some_and(Option::is_some)
    }

    /// Number of notes currently sounding.
    pub fn open_count(&self) -> usize {
        self.slots.iter().flatten().filter(|slot| slot.is_some()).count()
    }
}

impl Midi {
    /// Renders the playable track at `index` against `clip`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TrackNotFound`] if there is no such track, or any
    /// error from [`render_track`].
    pub fn render(&self, index: usize, clip: &Wave) -> Result<Wave> {
        let track = self.tracks.get(index).ok_or(Error::TrackNotFound {
            index,
            available: self.tracks.len(),
        })?;
        let _span = info_span!("render", track = index).entered();
        render_track(self, track, clip)
    }
}

/// Replays `track` tick by tick and returns the rendered audio.
///
/// For each tick from 0 up to the track's length: tempo changes at the tick
/// are applied, then the track's events at the tick are handled (a note toggles
/// its slot and, when it opens, mixes `clip` in at the current offset; an
/// all-notes-off controller clears every slot), then one tick of silence is
/// mixed in and the offset advances by the current samples per tick.
///
/// `clip` must already be 16-bit, as every [`Wave`] loaded by this crate is.
///
/// # Errors
///
/// Returns [`Error::NoteOutOfRange`] for a note outside the 16 x 128 table.
pub fn render_track(midi: &Midi, track: &TrackChunk, clip: &Wave) -> Result<Wave> {
    let mut tempo = TempoMap::new(midi.division(), TARGET_SAMPLE_RATE);
    let mut tempo_changes = midi.tempo_changes.iter().peekable();
    let mut events = track.events.iter().peekable();
    let mut open = OpenNotes::new();

    let mut samples = Vec::new();
    let mut offset = 0usize;
    let mut triggered = 0usize;

    for tick in 0..track.tick_size {
        while let Some(change) = tempo_changes.next_if(|t| t.absolute_tick() <= tick) {
            tempo.apply(change);
        }

        while let Some(event) = events.next_if(|e| e.absolute_tick() <= tick) {
            match event.kind {
                EventKind::Note(note) => {
                    if open.toggle(event.channel(), note)? {
                        append_or_combine(&mut samples, clip.samples(), offset);
                        triggered += 1;
                    }
                }
                EventKind::Controller(c) if c.controller == controller::ALL_NOTES_OFF => {
                    debug!(tick, open = open.open_count(), "all notes off");
                    open.clear();
                }
                EventKind::Controller(_) => {}
            }
        }

        append_or_combine(&mut samples, tempo.silent_span(), offset);
        offset += tempo.samples_per_tick();
    }

    if samples.len() > offset {
        warn!(
            overhang = samples.len() - offset,
            "clip rings past the end of the track"
        );
    }
    let unplayed = events.count();
    if unplayed > 0 {
        debug!(unplayed, "events at or after the last tick were not played");
    }

    let wave = Wave::from_samples(samples);
    info!(
        ticks = track.tick_size,
        notes = triggered,
        frames = wave.frame_count(),
        seconds = wave.duration_secs(),
        "rendered track"
    );
    Ok(wave)
}
