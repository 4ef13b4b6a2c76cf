//! Condensed description of a parsed file, used by the `tc` command.

use super::{note_to_name, EventKind, Midi, MidiFormat};
use serde::Serialize;
use std::fmt;

/// Overview of one playable track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub index: usize,
    pub ticks: u32,
    pub events: usize,
    pub notes: usize,
    pub channels: Vec<u8>,
    /// Lowest and highest pitch as note names.
    pub range: Option<(String, String)>,
}

/// Overview of a whole file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MidiSummary {
    pub format: u16,
    pub division: u16,
    pub declared_tracks: u16,
    pub tracks: Vec<TrackSummary>,
    /// (absolute tick, beats per minute)
    pub tempo_changes: Vec<(u32, f64)>,
    /// (absolute tick, numerator, denominator)
    pub time_signatures: Vec<(u32, u8, u32)>,
}

impl Midi {
    /// Collects the overview printed by `midify tc`.
    ///
    /// # Returns
    ///
    /// Per-track statistics plus the file-wide tempo and time signature changes.
    pub fn summary(&self) -> MidiSummary {
        let tracks = self
            .tracks
            .iter()
            .enumerate()
            .map(|(index, track)| {
                let mut channels: Vec<u8> = track.events.iter().map(|e| e.channel()).collect();
                channels.sort_unstable();
                channels.dedup();

                let pitches = track.events.iter().filter_map(|e| match e.kind {
                    EventKind::Note(note) => Some(note.pitch),
                    EventKind::Controller(_) => None,
                });
                let range = pitches
                    .clone()
                    .min()
                    .zip(pitches.max())
                    .map(|(lo, hi)| (note_to_name(lo.min(127)), note_to_name(hi.min(127))));

                TrackSummary {
                    index,
                    ticks: track.tick_size,
                    events: track.events.len(),
                    notes: track.note_count(),
                    channels,
                    range,
                }
            })
            .collect();

        MidiSummary {
            format: self.header.format_raw(),
            division: self.division(),
            declared_tracks: self.header.track_count(),
            tracks,
            tempo_changes: self
                .tempo_changes
                .iter()
                .map(|t| (t.absolute_tick(), t.bpm()))
                .collect(),
            time_signatures: self
                .time_signature_changes
                .iter()
                .map(|s| (s.absolute_tick(), s.numerator, s.denominator_value()))
                .collect(),
        }
    }
}

impl fmt::Display for MidiSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = match MidiFormat::from(self.format) {
            MidiFormat::SingleTrack => "single track".to_string(),
            MidiFormat::Parallel => "parallel tracks".to_string(),
            MidiFormat::Sequential => "sequential songs".to_string(),
            MidiFormat::Other(raw) => format!("unknown ({raw})"),
        };
        writeln!(f, "Format:      {} ({format})", self.format)?;
        writeln!(f, "Division:    {} ticks per quarter note", self.division)?;
        writeln!(
            f,
            "Tracks:      {} declared, {} playable",
            self.declared_tracks,
            self.tracks.len()
        )?;
        for track in &self.tracks {
            write!(
                f,
                "  [{}] {} ticks, {} events, {} notes, channels {:?}",
                track.index, track.ticks, track.events, track.notes, track.channels
            )?;
            match &track.range {
                Some((lo, hi)) => writeln!(f, ", range {lo}-{hi}")?,
                None => writeln!(f)?,
            }
        }
        if self.tempo_changes.is_empty() {
            writeln!(f, "Tempo:       120 BPM (default)")?;
        }
        for (tick, bpm) in &self.tempo_changes {
            writeln!(f, "Tempo:       {bpm:.2} BPM at tick {tick}")?;
        }
        for (tick, num, denom) in &self.time_signatures {
            writeln!(f, "Time sig:    {num}/{denom} at tick {tick}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_small_file() {
        let mut bytes = b"MThd\x00\x00\x00\x06\x00\x00\x00\x01\x01\xE0".to_vec();
        let body = [
            0x00, 0xFF, 0x58, 0x04, 3, 2, 24, 8, //
            0x00, 0x91, 64, 90, //
            0x10, 0x91, 52, 90, //
            0x10, 0xB1, 0x7B, 0x00, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&body);

        let summary = Midi::from_bytes(&bytes).unwrap().summary();
        assert_eq!(summary.division, 480);
        assert_eq!(summary.tracks.len(), 1);
        assert_eq!(summary.tracks[0].notes, 2);
        assert_eq!(summary.tracks[0].events, 3);
        assert_eq!(summary.tracks[0].channels, vec![1]);
        assert_eq!(
            summary.tracks[0].range,
            Some(("E3".to_string(), "E4".to_string()))
        );
        assert_eq!(summary.time_signatures, vec![(0, 3, 4)]);

        let text = summary.to_string();
        assert!(text.contains("120 BPM (default)"));
        assert!(text.contains("3/4 at tick 0"));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["division"], 480);
        assert_eq!(json["tracks"][0]["ticks"], 32);
    }
}
