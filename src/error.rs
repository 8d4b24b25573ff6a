use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a capture device when a recording is started.
///
/// None of these are fatal: the session stays in its prior state and the
/// caller decides how to surface the problem.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture device is busy")]
    Busy,

    #[error("capture device unavailable: {0}")]
    Unavailable(String),

    #[error("audio capture permission denied")]
    PermissionDenied,

    #[error("failed to open capture destination {path}: {reason}")]
    Destination { path: PathBuf, reason: String },
}

/// Failures reported by a playback device.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("recording file not found: {0}")]
    Missing(PathBuf),

    #[error("recording could not be read: {0}")]
    Corrupt(String),

    #[error("no recording loaded")]
    NotLoaded,
}

/// Failures while decoding a finished recording for waveform summary.
///
/// These are recovered locally (the summary is cosmetic); they never
/// block the session from reaching its resting state.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no audio track in recording")]
    NoAudioTrack,

    #[error("failed to read recording: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode failed: {0}")]
    Codec(String),
}

impl From<symphonia::core::errors::Error> for DecodeError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        DecodeError::Codec(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_error_display() {
        let err = CaptureError::Unavailable("no input device".to_string());
        assert_eq!(err.to_string(), "capture device unavailable: no input device");
    }

    #[test]
    fn test_playback_error_display() {
        let err = PlaybackError::Missing(PathBuf::from("/tmp/gone.wav"));
        assert_eq!(err.to_string(), "recording file not found: /tmp/gone.wav");
    }
}
