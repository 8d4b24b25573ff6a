use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle state of a recording session.
///
/// `Idle` and `Stopped`/`Paused` are resting states; `Recording` and
/// `Playing` drive the sampling tick. `Ready` is a pre-armed `Idle`
/// reserved for UI affordances and renders the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    Idle,
    Recording,
    Stopped,
    Playing,
    Paused,
    Ready,
}

impl RecordingState {
    /// States in which the sampling tick runs.
    pub fn is_active(&self) -> bool {
        matches!(self, RecordingState::Recording | RecordingState::Playing)
    }
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Observable snapshot of a session's fields, published on every
/// mutation through the session's watch channel.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Current lifecycle state
    pub state: RecordingState,

    /// Recording elapsed time, or playback position, depending on state
    pub elapsed: Duration,

    /// Duration of the completed recording; zero before one exists
    pub total_duration: Duration,

    /// Normalized visual amplitudes: a rolling window while recording,
    /// the downsampled summary once stopped
    pub waveform: Vec<f32>,

    /// Fraction of the recording played, in [0, 1]
    pub playback_progress: f64,

    /// Last known playback fraction, stable across pause
    pub last_progress: f64,

    /// When the current recording attempt started
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    pub fn initial() -> Self {
        Self {
            state: RecordingState::Idle,
            elapsed: Duration::ZERO,
            total_duration: Duration::ZERO,
            waveform: Vec::new(),
            playback_progress: 0.0,
            last_progress: 0.0,
            started_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_states() {
        assert!(RecordingState::Recording.is_active());
        assert!(RecordingState::Playing.is_active());
        assert!(!RecordingState::Idle.is_active());
        assert!(!RecordingState::Stopped.is_active());
        assert!(!RecordingState::Paused.is_active());
        assert!(!RecordingState::Ready.is_active());
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&RecordingState::Recording).unwrap();
        assert_eq!(json, "\"recording\"");
    }
}
