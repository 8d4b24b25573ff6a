use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::state::{RecordingState, SessionSnapshot};
use crate::audio::waveform::{self, JitterSource, UniformJitter};
use crate::audio::{AudioCaptureDevice, AudioFile, AudioPlaybackDevice};
use crate::error::{CaptureError, DecodeError, PlaybackError};

/// Session fields behind the single lock. Transitions and the tick
/// callback both mutate through this lock, so no two mutations ever
/// interleave.
struct Inner {
    state: RecordingState,
    elapsed: Duration,
    total_duration: Duration,
    waveform: Vec<f32>,
    playback_progress: f64,
    last_progress: f64,
    started_at: Option<DateTime<Utc>>,
    recording_path: Option<PathBuf>,
    capture: Box<dyn AudioCaptureDevice>,
    playback: Box<dyn AudioPlaybackDevice>,
    playback_ready: bool,
    jitter: Box<dyn JitterSource>,

    /// Bumped on every transition out of an active state. A tick that
    /// observes a stale generation exits without mutating, so
    /// cancellation is total even if the spawned task is still winding
    /// down.
    tick_generation: u64,

    /// Bumped when a recording is started or deleted. The summary
    /// decode validates this before applying its result, so a stale
    /// waveform is discarded rather than applied to a newer recording.
    epoch: u64,
}

impl Inner {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            elapsed: self.elapsed,
            total_duration: self.total_duration,
            waveform: self.waveform.clone(),
            playback_progress: self.playback_progress,
            last_progress: self.last_progress,
            started_at: self.started_at,
        }
    }

    fn sync_playback_position(&mut self) {
        let position = self.playback.position();
        self.elapsed = position;
        if self.total_duration > Duration::ZERO {
            let progress =
                (position.as_secs_f64() / self.total_duration.as_secs_f64()).min(1.0);
            self.playback_progress = progress;
            self.last_progress = progress;
        }
    }
}

/// A voice-note recording session: owns the recording/playback state
/// machine, drives the periodic sampling tick, computes the visual
/// waveform, and publishes observable snapshots.
///
/// State machine: `Idle → Recording → Stopped ⇄ {Playing ⇄ Paused}`,
/// with `delete_recording` returning to `Idle` from anywhere. Invalid
/// transitions are logged no-ops that leave every field unchanged.
pub struct RecordingSession {
    config: SessionConfig,
    inner: Arc<Mutex<Inner>>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    tick_handle: StdMutex<Option<JoinHandle<()>>>,
}

impl RecordingSession {
    pub fn new(
        config: SessionConfig,
        capture: Box<dyn AudioCaptureDevice>,
        playback: Box<dyn AudioPlaybackDevice>,
    ) -> Self {
        Self::with_jitter(config, capture, playback, Box::new(UniformJitter::new()))
    }

    /// Construct with an explicit jitter source. Tests inject a
    /// deterministic one; production uses [`UniformJitter`].
    pub fn with_jitter(
        config: SessionConfig,
        capture: Box<dyn AudioCaptureDevice>,
        playback: Box<dyn AudioPlaybackDevice>,
        jitter: Box<dyn JitterSource>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::initial());

        Self {
            config,
            inner: Arc::new(Mutex::new(Inner {
                state: RecordingState::Idle,
                elapsed: Duration::ZERO,
                total_duration: Duration::ZERO,
                waveform: Vec::new(),
                playback_progress: 0.0,
                last_progress: 0.0,
                started_at: None,
                recording_path: None,
                capture,
                playback,
                playback_ready: false,
                jitter,
                tick_generation: 0,
                epoch: 0,
            })),
            snapshot_tx,
            tick_handle: StdMutex::new(None),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    /// Latest published snapshot of the session's fields.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Subscribe to snapshot updates. Every transition and every tick
    /// publishes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Pre-arm the session (`Idle → Ready`). `Ready` renders like
    /// `Idle` and accepts `start_recording` the same way.
    pub async fn arm(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state != RecordingState::Idle {
            debug!("arm ignored in state {:?}", inner.state);
            return;
        }
        inner.state = RecordingState::Ready;
        self.publish(&inner);
    }

    /// Begin a new recording. Valid from `Idle` (or pre-armed `Ready`);
    /// anywhere else this is a no-op. A capture-device failure leaves
    /// the session in its prior state.
    pub async fn start_recording(&self) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock().await;
        if !matches!(inner.state, RecordingState::Idle | RecordingState::Ready) {
            debug!("start_recording ignored in state {:?}", inner.state);
            return Ok(());
        }

        let path = self.config.recording_path();
        inner.capture.begin(&path).await?;

        inner.recording_path = Some(path);
        inner.elapsed = Duration::ZERO;
        inner.total_duration = Duration::ZERO;
        inner.waveform.clear();
        inner.playback_progress = 0.0;
        inner.last_progress = 0.0;
        inner.playback_ready = false;
        inner.started_at = Some(Utc::now());
        inner.state = RecordingState::Recording;
        inner.epoch += 1;
        inner.tick_generation += 1;
        let generation = inner.tick_generation;
        self.publish(&inner);
        drop(inner);

        info!("Recording started: {}", self.config.session_id);
        self.spawn_tick(generation);
        Ok(())
    }

    /// Stop the active recording, freeze its total duration, prepare
    /// playback, and kick off the summary waveform computation. The
    /// session reaches `Stopped` even when playback preparation fails;
    /// the error is surfaced so the caller can disable play affordances.
    pub async fn stop_recording(&self) -> Result<(), PlaybackError> {
        let mut inner = self.inner.lock().await;
        if inner.state != RecordingState::Recording {
            debug!("stop_recording ignored in state {:?}", inner.state);
            return Ok(());
        }

        inner.tick_generation += 1;
        inner.capture.end().await;
        inner.total_duration = inner.elapsed;
        inner.state = RecordingState::Stopped;

        let path = inner.recording_path.clone();
        let load_result = match &path {
            Some(path) => inner.playback.load(path).await,
            None => Err(PlaybackError::NotLoaded),
        };
        inner.playback_ready = load_result.is_ok();
        if let Err(e) = &load_result {
            warn!("Failed to prepare playback: {}", e);
        }

        self.publish(&inner);
        let epoch = inner.epoch;
        let total = inner.total_duration;
        drop(inner);

        self.abort_tick();
        info!(
            "Recording stopped: {} ({:.2}s)",
            self.config.session_id,
            total.as_secs_f64()
        );

        if let Some(path) = path {
            self.spawn_summary(path, epoch);
        }

        load_result
    }

    /// Start or resume playback. Valid from `Stopped` or `Paused`;
    /// bookkeeping resumes from the device's reported position rather
    /// than resetting to zero.
    pub async fn play_recording(&self) -> Result<(), PlaybackError> {
        let mut inner = self.inner.lock().await;
        if !matches!(inner.state, RecordingState::Stopped | RecordingState::Paused) {
            debug!("play_recording ignored in state {:?}", inner.state);
            return Ok(());
        }
        if !inner.playback_ready {
            return Err(PlaybackError::NotLoaded);
        }

        inner.sync_playback_position();
        inner.playback.play();
        inner.state = RecordingState::Playing;
        inner.tick_generation += 1;
        let generation = inner.tick_generation;
        self.publish(&inner);
        drop(inner);

        debug!("Playback started: {}", self.config.session_id);
        self.spawn_tick(generation);
        Ok(())
    }

    /// Pause playback, snapshotting the position so the paused waveform
    /// rendering stays stable. Valid only from `Playing`.
    pub async fn pause_recording(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state != RecordingState::Playing {
            debug!("pause_recording ignored in state {:?}", inner.state);
            return;
        }

        inner.playback.pause();
        inner.sync_playback_position();
        inner.state = RecordingState::Paused;
        inner.tick_generation += 1;
        self.publish(&inner);
        drop(inner);

        self.abort_tick();
        debug!("Playback paused: {}", self.config.session_id);
    }

    /// Tear down both devices, delete the capture file, and reset every
    /// field. Valid from any state and idempotent.
    pub async fn delete_recording(&self) {
        let mut inner = self.inner.lock().await;
        inner.tick_generation += 1;
        inner.epoch += 1;
        inner.capture.end().await;
        inner.playback.pause();

        if let Some(path) = inner.recording_path.take() {
            match std::fs::remove_file(&path) {
                Ok(()) => info!("Recording deleted: {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove recording {}: {}", path.display(), e),
            }
        }

        inner.state = RecordingState::Idle;
        inner.elapsed = Duration::ZERO;
        inner.total_duration = Duration::ZERO;
        inner.waveform.clear();
        inner.playback_progress = 0.0;
        inner.last_progress = 0.0;
        inner.playback_ready = false;
        inner.started_at = None;
        self.publish(&inner);
        drop(inner);

        self.abort_tick();
    }

    fn publish(&self, inner: &Inner) {
        self.snapshot_tx.send_replace(inner.snapshot());
    }

    /// Spawn the periodic sampling tick for one active stretch. The
    /// generation check under the session lock makes cancellation
    /// total: once a transition bumps the generation, no pending tick
    /// mutates anything.
    fn spawn_tick(&self, generation: u64) {
        let inner = Arc::clone(&self.inner);
        let tx = self.snapshot_tx.clone();
        let interval = self.config.tick_interval;
        let live_window = self.config.live_window;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let mut inner = inner.lock().await;
                if inner.tick_generation != generation {
                    break;
                }

                match inner.state {
                    RecordingState::Recording => {
                        inner.elapsed += interval;
                        let power = inner.capture.power_level_db();
                        let jitter = inner.jitter.sample();
                        let amplitude = waveform::live_amplitude(power, jitter);
                        inner.waveform.push(amplitude);
                        if inner.waveform.len() > live_window {
                            inner.waveform.remove(0);
                        }
                        tx.send_replace(inner.snapshot());
                    }
                    RecordingState::Playing => {
                        inner.sync_playback_position();

                        if !inner.playback.is_active() {
                            // End of track: the device stopped on its own.
                            inner.playback.pause();
                            inner.state = RecordingState::Paused;
                            inner.tick_generation += 1;
                            tx.send_replace(inner.snapshot());
                            break;
                        }
                        tx.send_replace(inner.snapshot());
                    }
                    _ => break,
                }
            }
        });

        if let Ok(mut guard) = self.tick_handle.lock() {
            if let Some(old) = guard.replace(handle) {
                old.abort();
            }
        }
    }

    fn abort_tick(&self) {
        if let Ok(mut guard) = self.tick_handle.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }

    /// Decode the finished recording off the owning context and replace
    /// the live waveform with the downsampled summary. Decode failures
    /// substitute an empty waveform; a result arriving after the
    /// session was deleted or restarted is discarded.
    fn spawn_summary(&self, path: PathBuf, epoch: u64) {
        let inner = Arc::clone(&self.inner);
        let tx = self.snapshot_tx.clone();
        let buckets = self.config.summary_buckets;

        tokio::spawn(async move {
            let decoded = tokio::task::spawn_blocking(move || -> Result<Vec<f32>, DecodeError> {
                let audio = AudioFile::open(&path)?;
                Ok(waveform::bucket_rms(&audio.to_mono(), buckets))
            })
            .await;

            let bucket_rms = match decoded {
                Ok(Ok(rms)) => rms,
                Ok(Err(e)) => {
                    warn!("Waveform decode failed, substituting empty summary: {}", e);
                    Vec::new()
                }
                Err(e) => {
                    warn!("Waveform decode task failed: {}", e);
                    Vec::new()
                }
            };

            let mut inner = inner.lock().await;
            if inner.epoch != epoch {
                debug!("Discarding stale waveform summary");
                return;
            }

            let mut shaped = Vec::with_capacity(bucket_rms.len());
            for rms in bucket_rms {
                let jitter = inner.jitter.sample();
                shaped.push(waveform::summary_amplitude(rms, jitter));
            }
            inner.waveform = shaped;
            tx.send_replace(inner.snapshot());
        });
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        // The session owns its tick, never the other way around.
        self.abort_tick();
    }
}
