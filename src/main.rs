//! midify - render a MIDI track into a WAVE file.
//!
//! Every note-on in the chosen track plays a copy of a reference clip, so a
//! short sample (a drum hit, a plucked string) becomes a rhythm following the
//! timing and tempo changes of the MIDI file.
//!
//! # Usage
//!
//! ```bash
//! midify tc song.mid                 # Describe the tracks of a MIDI file
//! midify tc song.mid --json          # Same, as JSON
//! midify make song.mid               # Render track 0 with wave.wav into test.wav
//! midify make song.mid --clip kick.wav --output out.wav --track 1 --force
//! midify help                        # Show help
//! ```
//!
//! Set `RUST_LOG=debug` to trace every chunk as it is read.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use midify::wave::UNITY_VOLUME;
use midify::{Midi, Wave};
use std::path::{Path, PathBuf};

/// Render MIDI tracks into WAVE files using an audio clip as the instrument.
#[derive(Parser)]
#[command(name = "midify")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of a MIDI file: tracks, tempo and time signatures
    Tc {
        /// Path to the MIDI file
        midi: PathBuf,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Render one track of a MIDI file into a WAVE file
    Make {
        /// Path to the MIDI file
        midi: PathBuf,

        /// Clip played for every note (16-bit PCM source at 44100 Hz after conversion)
        #[arg(short, long, default_value = "wave.wav")]
        clip: PathBuf,

        /// Output WAVE file
        #[arg(short, long, default_value = "test.wav")]
        output: PathBuf,

        /// Index of the track to render, counting only tracks with notes
        #[arg(short, long, default_value_t = 0)]
        track: usize,

        /// Clip volume, 64 leaves it unchanged
        #[arg(long, default_value_t = UNITY_VOLUME)]
        volume: i32,

        /// Overwrite the output file if it already exists
        #[arg(short, long)]
        force: bool,
    },
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Tc { midi, json } => describe(&midi, json),
        Commands::Make {
            midi,
            clip,
            output,
            track,
            volume,
            force,
        } => make(&midi, &clip, &output, track, volume, force),
    }
}

/// Prints the track summary of a MIDI file.
fn describe(path: &Path, json: bool) -> Result<()> {
    let midi = Midi::open(path)
        .with_context(|| format!("Failed to load MIDI file: {}", path.display()))?;
    let summary = midi.summary();

    if json {
        let text = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        println!("{text}");
    } else {
        println!("{}", path.display());
        print!("{summary}");
    }
    Ok(())
}

/// Renders `track` of the MIDI file against the clip and saves the result.
fn make(
    midi_path: &Path,
    clip_path: &Path,
    output: &Path,
    track: usize,
    volume: i32,
    force: bool,
) -> Result<()> {
    let midi = Midi::open(midi_path)
        .with_context(|| format!("Failed to load MIDI file: {}", midi_path.display()))?;

    let mut clip = Wave::open(clip_path)
        .with_context(|| format!("Failed to load clip: {}", clip_path.display()))?;
    if volume != UNITY_VOLUME {
        clip.change_volume(volume);
    }

    let wave = midi
        .render(track, &clip)
        .with_context(|| format!("Failed to render track {track}"))?;

    wave.save(output, force)
        .with_context(|| format!("Failed to save WAVE file: {}", output.display()))?;

    println!(
        "Wrote {} ({:.2} s, {} frames)",
        output.display(),
        wave.duration_secs(),
        wave.frame_count()
    );
    Ok(())
}
