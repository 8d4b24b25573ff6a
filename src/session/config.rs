use std::path::PathBuf;
use std::time::Duration;

use crate::audio::waveform;

/// Configuration for a recording session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier, used for the capture filename
    pub session_id: String,

    /// Directory the capture file is written to
    pub recordings_dir: PathBuf,

    /// Cadence of the sampling tick while recording or playing
    pub tick_interval: Duration,

    /// Live waveform window: samples kept while recording
    pub live_window: usize,

    /// Buckets in the post-recording summary waveform
    pub summary_buckets: usize,
}

impl SessionConfig {
    /// Destination path for this session's capture file.
    pub fn recording_path(&self) -> PathBuf {
        self.recordings_dir
            .join(format!("voicenote-{}.wav", self.session_id))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            recordings_dir: std::env::temp_dir(),
            tick_interval: Duration::from_millis(50),
            live_window: waveform::LIVE_WINDOW,
            summary_buckets: waveform::SUMMARY_BUCKETS,
        }
    }
}
