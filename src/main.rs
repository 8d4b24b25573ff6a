use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use voicenote::{
    ClockPlayer, Config, FileCapture, JsonFileStore, RecordingSession, RecordingState,
    SessionConfig, UnlockRegistry,
};

/// Record a voice note from a source audio file, show its waveform, and
/// play it back.
#[derive(Debug, Parser)]
#[command(name = "voicenote")]
struct Args {
    /// Config profile (loaded via the config crate; built-in defaults
    /// are used when the profile is absent)
    #[arg(long, default_value = "config/voicenote")]
    config: String,

    /// Source audio file the capture device replays
    #[arg(long, default_value = "tests/fixtures/sample-note.wav")]
    source: PathBuf,

    /// How long to record, in milliseconds
    #[arg(long, default_value_t = 2000)]
    duration_ms: u64,

    /// Profile identifier to unlock after a successful submission
    #[arg(long)]
    unlock: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let cfg = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            info!("No config profile loaded ({}), using defaults", e);
            Config::default()
        }
    };

    info!("voicenote v0.1.0");

    if !args.source.exists() {
        info!("No source audio found at {}", args.source.display());
        info!("To run the demo, place an audio file there or pass --source");
        return Ok(());
    }

    let session_config = SessionConfig {
        recordings_dir: PathBuf::from(&cfg.audio.recordings_path),
        tick_interval: Duration::from_millis(cfg.audio.tick_interval_ms),
        ..Default::default()
    };

    let session = RecordingSession::new(
        session_config,
        Box::new(FileCapture::new(&args.source)),
        Box::new(ClockPlayer::new()),
    );

    session.start_recording().await?;
    tokio::time::sleep(Duration::from_millis(args.duration_ms)).await;

    if let Err(e) = session.stop_recording().await {
        warn!("Recording stopped but playback is unavailable: {}", e);
    }

    let snapshot = wait_for_summary(&session).await;
    info!(
        "Recorded {:.2}s, {} waveform buckets",
        snapshot.total_duration.as_secs_f64(),
        snapshot.waveform.len()
    );
    println!("{}", render_waveform(&snapshot.waveform));

    if snapshot.total_duration > Duration::ZERO {
        match session.play_recording().await {
            Ok(()) => {
                while session.snapshot().state == RecordingState::Playing {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                info!("Playback finished");
            }
            Err(e) => warn!("Playback unavailable: {}", e),
        }
    }

    if let Some(id) = &args.unlock {
        let store = JsonFileStore::open(&cfg.storage.unlocks_path)?;
        let mut registry = UnlockRegistry::new(store);
        registry.unlock(id)?;
    }

    Ok(())
}

/// Wait for the post-recording summary waveform to replace the live
/// window (it is the next publish after stopping), or give up after two
/// seconds and return whatever is there.
async fn wait_for_summary(session: &RecordingSession) -> voicenote::SessionSnapshot {
    let mut rx = session.subscribe();
    let _ = tokio::time::timeout(Duration::from_secs(2), rx.changed()).await;
    session.snapshot()
}

fn render_waveform(waveform: &[f32]) -> String {
    const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

    waveform
        .iter()
        .map(|amp| {
            let index = ((amp * 8.0) as usize).min(7);
            BLOCKS[index]
        })
        .collect()
}
