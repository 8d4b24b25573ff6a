pub mod capture;
pub mod file;
pub mod playback;
pub mod waveform;

pub use capture::{AudioCaptureDevice, FileCapture, SILENCE_DB};
pub use file::AudioFile;
pub use playback::{AudioPlaybackDevice, ClockPlayer};
pub use waveform::{FixedJitter, JitterSource, UniformJitter};
