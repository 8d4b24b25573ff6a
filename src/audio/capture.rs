use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use super::file::AudioFile;
use crate::error::CaptureError;

/// Reported by capture devices when there is no signal to meter.
pub const SILENCE_DB: f32 = -160.0;

/// Audio capture device trait
///
/// The session drives exactly one capture device at a time: `begin`
/// opens a fresh destination, `power_level_db` is a non-blocking meter
/// read taken on every sampling tick, and `end` finalizes the
/// destination file. Ending a device that is not capturing is a no-op.
#[async_trait::async_trait]
pub trait AudioCaptureDevice: Send {
    /// Start capturing to `destination`.
    async fn begin(&mut self, destination: &Path) -> Result<(), CaptureError>;

    /// Instantaneous signal power in decibels (non-blocking).
    fn power_level_db(&self) -> f32;

    /// Stop capturing and finalize the destination file.
    async fn end(&mut self);
}

/// File-backed capture device: "records" by replaying a source audio
/// file in wall time, writing the consumed prefix to the destination as
/// 16-bit PCM WAV. Meter reads report windowed RMS over the source
/// material at the current wall-clock position.
///
/// This is the batch/testing stand-in for a platform microphone; the
/// session only ever sees the trait.
pub struct FileCapture {
    source: PathBuf,
    sample_rate: u32,
    samples: Vec<f32>,
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    started: Option<Instant>,
}

impl FileCapture {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            sample_rate: 0,
            samples: Vec::new(),
            writer: None,
            started: None,
        }
    }

    /// Index of the source sample at the current wall-clock position.
    fn position(&self) -> usize {
        match self.started {
            Some(started) => {
                let pos = (started.elapsed().as_secs_f64() * self.sample_rate as f64) as usize;
                pos.min(self.samples.len())
            }
            None => 0,
        }
    }
}

#[async_trait::async_trait]
impl AudioCaptureDevice for FileCapture {
    async fn begin(&mut self, destination: &Path) -> Result<(), CaptureError> {
        if self.started.is_some() {
            return Err(CaptureError::Busy);
        }

        let decoded = AudioFile::open(&self.source)
            .map_err(|e| CaptureError::Unavailable(e.to_string()))?;
        self.sample_rate = decoded.sample_rate;
        self.samples = decoded.to_mono();

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer =
            hound::WavWriter::create(destination, spec).map_err(|e| CaptureError::Destination {
                path: destination.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!(
            "Capture started: {} -> {}",
            self.source.display(),
            destination.display()
        );

        self.writer = Some(writer);
        self.started = Some(Instant::now());

        Ok(())
    }

    fn power_level_db(&self) -> f32 {
        if self.started.is_none() {
            return SILENCE_DB;
        }

        let pos = self.position();
        if pos == 0 || pos >= self.samples.len() {
            // Before the first sample or past the end of the source.
            return SILENCE_DB;
        }

        // RMS over the most recent 50ms of material.
        let window = (self.sample_rate as usize / 20).max(1);
        let chunk = &self.samples[pos.saturating_sub(window)..pos];

        let energy: f32 = chunk.iter().map(|s| s * s).sum();
        let rms = (energy / chunk.len() as f32).sqrt();

        if rms > 0.0 {
            20.0 * rms.log10()
        } else {
            SILENCE_DB
        }
    }

    async fn end(&mut self) {
        let Some(started) = self.started.take() else {
            return;
        };

        if let Some(mut writer) = self.writer.take() {
            let pos = ((started.elapsed().as_secs_f64() * self.sample_rate as f64) as usize)
                .min(self.samples.len());

            for &sample in &self.samples[..pos] {
                let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                if let Err(e) = writer.write_sample(value) {
                    warn!("Failed to write capture sample: {}", e);
                    break;
                }
            }

            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize capture file: {}", e);
            } else {
                info!("Capture finalized: {} samples written", pos);
            }
        }
    }
}

impl Drop for FileCapture {
    fn drop(&mut self) {
        // A writer still present here means end() was never called;
        // finalize so the destination at least has a valid header.
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize capture file on drop: {}", e);
            }
        }
    }
}
