use crate::midi::TempoEvent;
use crate::wave::Sample;
use tracing::debug;

/// Current tempo of a render and the silent span one tick adds to the output.
#[derive(Debug, Clone)]
pub struct TempoMap {
    division: u16,
    sample_rate: u32,
    tempo: TempoEvent,
    silence: Vec<Sample>,
}

impl TempoMap {
    /// Starts at the default tempo of 120 BPM.
    pub fn new(division: u16, sample_rate: u32) -> Self {
        let mut map = Self {
            division,
            sample_rate,
            tempo: TempoEvent::default(),
            silence: Vec::new(),
        };
        map.resize_silence();
        map
    }

    /// Switches to `tempo` and recomputes the tick length.
    pub fn apply(&mut self, tempo: &TempoEvent) {
        self.tempo = *tempo;
        self.resize_silence();
        debug!(
            tick = tempo.absolute_tick(),
            bpm = tempo.bpm(),
            samples_per_tick = self.samples_per_tick(),
            "tempo change"
        );
    }

    /// The tempo in effect.
    pub fn tempo(&self) -> &TempoEvent {
        &self.tempo
    }

    /// Output frames per tick at the current tempo.
    pub fn samples_per_tick(&self) -> usize {
        self.silence.len()
    }

    /// One tick of silent 16-bit frames.
    pub fn silent_span(&self) -> &[Sample] {
        &self.silence
    }

    fn resize_silence(&mut self) {
        let frames = self.tempo.samples_per_tick(self.division, self.sample_rate);
        self.silence.resize(frames as usize, Sample::default());
    }
}
