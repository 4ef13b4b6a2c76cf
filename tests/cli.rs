mod common;

use common::{midi_file, write_file, write_mono_clip, TrackBuilder};
use std::process::Command;

fn midify() -> Command {
    Command::new(env!("CARGO_BIN_EXE_midify"))
}

fn song() -> Vec<u8> {
    let track = TrackBuilder::new()
        .tempo(0, 600_000)
        .note_on(0, 2, 67)
        .note_off(48, 2, 67)
        .note_on(0, 2, 69)
        .note_off(48, 2, 69)
        .finish(0);
    midi_file(0, 96, &[track])
}

#[test]
fn test_tc_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "song.mid", &song());

    let output = midify().arg("tc").arg(&path).arg("--json").output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["division"], 96);
    assert_eq!(json["tracks"][0]["notes"], 4);
    assert_eq!(json["tracks"][0]["ticks"], 96);
    assert_eq!(json["tempo_changes"][0][1], 100.0);
}

#[test]
fn test_tc_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "song.mid", &song());

    let output = midify().arg("tc").arg(&path).output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("Division:    96 ticks per quarter note"), "{text}");
    assert!(text.contains("range G4-A4"), "{text}");
}

#[test]
fn test_make_then_refuse_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let midi = write_file(dir.path(), "song.mid", &song());
    let clip = dir.path().join("wave.wav");
    write_mono_clip(&clip, &[1200, -1200, 800]);
    let out = dir.path().join("test.wav");

    let make = |force: bool| {
        let mut cmd = midify();
        cmd.arg("make")
            .arg(&midi)
            .arg("--clip")
            .arg(&clip)
            .arg("--output")
            .arg(&out);
        if force {
            cmd.arg("--force");
        }
        cmd.output().unwrap()
    };

    let first = make(false);
    assert!(first.status.success(), "{}", String::from_utf8_lossy(&first.stderr));
    let reader = hound::WavReader::open(&out).unwrap();
    // 600000 us per quarter at 96 ticks = 276 frames per tick, 96 ticks
    assert_eq!(reader.duration(), 96 * 276);

    let second = make(false);
    assert!(!second.status.success());
    assert!(String::from_utf8_lossy(&second.stderr).contains("already exists"));

    assert!(make(true).status.success());
}

#[test]
fn test_make_reports_missing_midi() {
    let dir = tempfile::tempdir().unwrap();
    let output = midify()
        .current_dir(dir.path())
        .args(["make", "nope.mid"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}
