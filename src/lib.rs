pub mod audio;
pub mod config;
pub mod error;
pub mod session;
pub mod store;

pub use audio::{
    AudioCaptureDevice, AudioFile, AudioPlaybackDevice, ClockPlayer, FileCapture, FixedJitter,
    JitterSource, UniformJitter,
};
pub use config::Config;
pub use error::{CaptureError, DecodeError, PlaybackError};
pub use session::{RecordingSession, RecordingState, SessionConfig, SessionSnapshot};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, UnlockRegistry};
