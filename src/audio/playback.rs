use std::path::Path;
use std::time::{Duration, Instant};

use tracing::info;

use super::file::AudioFile;
use crate::error::PlaybackError;

/// Audio playback device trait
///
/// The session drives exactly one playback device at a time and polls
/// `position`/`is_active` on every sampling tick; both must be
/// non-blocking status reads. Pausing a device that is not playing is a
/// no-op.
#[async_trait::async_trait]
pub trait AudioPlaybackDevice: Send {
    /// Load a recording for playback.
    async fn load(&mut self, source: &Path) -> Result<(), PlaybackError>;

    /// Start or resume playback from the current position.
    fn play(&mut self);

    /// Pause playback, retaining the current position.
    fn pause(&mut self);

    /// Current playback position (non-blocking).
    fn position(&self) -> Duration;

    /// Whether the device is actively playing. Goes false on its own at
    /// end of track.
    fn is_active(&self) -> bool;
}

/// Wall-clock playback device over a decoded file.
///
/// Tracks position against `Instant` rather than rendering audio: the
/// session only consumes position and activity, and output routing is a
/// platform concern. Once the end of the track is reached the resting
/// position rewinds to zero, so a replay starts from the top.
pub struct ClockPlayer {
    duration: Duration,
    base: Duration,
    playing_since: Option<Instant>,
    loaded: bool,
}

impl ClockPlayer {
    pub fn new() -> Self {
        Self {
            duration: Duration::ZERO,
            base: Duration::ZERO,
            playing_since: None,
            loaded: false,
        }
    }

    fn current(&self) -> Duration {
        match self.playing_since {
            Some(since) => (self.base + since.elapsed()).min(self.duration),
            None => self.base,
        }
    }
}

impl Default for ClockPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AudioPlaybackDevice for ClockPlayer {
    async fn load(&mut self, source: &Path) -> Result<(), PlaybackError> {
        if !source.exists() {
            return Err(PlaybackError::Missing(source.to_path_buf()));
        }

        let decoded =
            AudioFile::open(source).map_err(|e| PlaybackError::Corrupt(e.to_string()))?;

        self.duration = decoded.duration();
        self.base = Duration::ZERO;
        self.playing_since = None;
        self.loaded = true;

        info!(
            "Playback loaded: {} ({:.2}s)",
            source.display(),
            self.duration.as_secs_f64()
        );

        Ok(())
    }

    fn play(&mut self) {
        if !self.loaded || self.playing_since.is_some() {
            return;
        }
        if self.base >= self.duration {
            self.base = Duration::ZERO;
        }
        self.playing_since = Some(Instant::now());
    }

    fn pause(&mut self) {
        if let Some(since) = self.playing_since.take() {
            self.base = (self.base + since.elapsed()).min(self.duration);
            if self.base >= self.duration {
                self.base = Duration::ZERO;
            }
        }
    }

    fn position(&self) -> Duration {
        self.current()
    }

    fn is_active(&self) -> bool {
        self.playing_since.is_some() && self.current() < self.duration
    }
}
