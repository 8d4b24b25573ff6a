// Integration tests for the file-backed reference devices
//
// FileCapture replays a source WAV in wall time; ClockPlayer tracks a
// playback position against the wall clock. Timing assertions use wide
// ranges since test hosts schedule loosely.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;
use voicenote::{
    AudioCaptureDevice, AudioFile, AudioPlaybackDevice, CaptureError, ClockPlayer, FileCapture,
    PlaybackError,
};

/// Write `secs` of a 440 Hz sine at 16 kHz mono.
fn write_sine_fixture(dir: &TempDir, name: &str, secs: f32) -> Result<PathBuf> {
    let path = dir.path().join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec)?;
    let total = (secs * 16000.0) as usize;
    for i in 0..total {
        let t = i as f32 / 16000.0;
        let sample = (t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 0.5;
        writer.write_sample((sample * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;

    Ok(path)
}

#[tokio::test]
async fn test_file_capture_writes_decodable_wav() -> Result<()> {
    let dir = TempDir::new()?;
    let source = write_sine_fixture(&dir, "source.wav", 2.0)?;
    let destination = dir.path().join("note.wav");

    let mut capture = FileCapture::new(&source);
    capture.begin(&destination).await?;
    tokio::time::sleep(Duration::from_millis(250)).await;

    // Mid-capture the meter reads real signal, well above silence.
    let power = capture.power_level_db();
    assert!(
        (-40.0..0.0).contains(&power),
        "sine at 0.5 amplitude should meter near -9 dB, got {}",
        power
    );

    capture.end().await;

    let decoded = AudioFile::open(&destination)?;
    assert_eq!(decoded.sample_rate, 16000);
    assert_eq!(decoded.channels, 1);
    let secs = decoded.duration().as_secs_f64();
    assert!(
        (0.1..=1.0).contains(&secs),
        "250ms of capture should yield roughly that much audio, got {:.3}s",
        secs
    );

    Ok(())
}

#[tokio::test]
async fn test_file_capture_begin_twice_is_busy() -> Result<()> {
    let dir = TempDir::new()?;
    let source = write_sine_fixture(&dir, "source.wav", 1.0)?;

    let mut capture = FileCapture::new(&source);
    capture.begin(&dir.path().join("a.wav")).await?;

    let second = capture.begin(&dir.path().join("b.wav")).await;
    assert!(matches!(second, Err(CaptureError::Busy)));

    capture.end().await;
    Ok(())
}

#[tokio::test]
async fn test_file_capture_missing_source_is_unavailable() {
    let mut capture = FileCapture::new("/nonexistent/source.wav");
    let result = capture.begin(&std::env::temp_dir().join("dest.wav")).await;
    assert!(matches!(result, Err(CaptureError::Unavailable(_))));
}

#[tokio::test]
async fn test_file_capture_meter_silent_when_not_capturing() {
    let capture = FileCapture::new("/nonexistent/source.wav");
    assert_eq!(capture.power_level_db(), voicenote::audio::SILENCE_DB);
}

#[tokio::test]
async fn test_clock_player_position_advances_and_pauses() -> Result<()> {
    let dir = TempDir::new()?;
    let source = write_sine_fixture(&dir, "note.wav", 2.0)?;

    let mut player = ClockPlayer::new();
    player.load(&source).await?;
    assert_eq!(player.position(), Duration::ZERO);
    assert!(!player.is_active());

    player.play();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(player.is_active());

    let position = player.position();
    assert!(
        position > Duration::from_millis(100) && position < Duration::from_millis(800),
        "200ms of playback should report roughly that position, got {:?}",
        position
    );

    player.pause();
    let frozen = player.position();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(player.position(), frozen, "paused position must not drift");
    assert!(!player.is_active());

    Ok(())
}

#[tokio::test]
async fn test_clock_player_rewinds_after_end_of_track() -> Result<()> {
    let dir = TempDir::new()?;
    let source = write_sine_fixture(&dir, "short.wav", 0.2)?;

    let mut player = ClockPlayer::new();
    player.load(&source).await?;

    player.play();
    tokio::time::sleep(Duration::from_millis(500)).await;

    // The track ran out; position clamps to duration.
    assert!(!player.is_active());
    let duration = player.position();
    assert!((0.15..=0.25).contains(&duration.as_secs_f64()));

    // Settling at the end rewinds the resting position to the top.
    player.pause();
    assert_eq!(player.position(), Duration::ZERO);

    player.play();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(player.is_active(), "replay after finish starts from zero");

    Ok(())
}

#[tokio::test]
async fn test_clock_player_load_missing_file() {
    let mut player = ClockPlayer::new();
    let result = player.load(std::path::Path::new("/nonexistent/note.wav")).await;
    assert!(matches!(result, Err(PlaybackError::Missing(_))));
}

#[tokio::test]
async fn test_clock_player_load_corrupt_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("garbage.wav");
    std::fs::write(&path, b"definitely not audio")?;

    let mut player = ClockPlayer::new();
    let result = player.load(&path).await;
    assert!(matches!(result, Err(PlaybackError::Corrupt(_))));

    Ok(())
}
