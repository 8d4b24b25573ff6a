use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Maximum number of live samples kept while recording (oldest evicted).
pub const LIVE_WINDOW: usize = 60;

/// Number of buckets in the post-recording summary waveform.
pub const SUMMARY_BUCKETS: usize = 50;

/// Meter readings below this floor are treated as silence.
pub const POWER_FLOOR_DB: f32 = -60.0;

/// Visual amplitude bounds; the lower bound keeps silent stretches
/// rendered as a thin baseline rather than vanishing.
pub const AMPLITUDE_MIN: f32 = 0.02;
pub const AMPLITUDE_MAX: f32 = 1.0;

/// Jitter range added to every shaped amplitude.
pub const JITTER_MIN: f32 = 0.02;
pub const JITTER_MAX: f32 = 0.05;

/// Source of the small positive jitter mixed into shaped amplitudes.
///
/// The jitter is cosmetic and non-deterministic in production; tests
/// substitute [`FixedJitter`] and assert ranges instead of exact values.
pub trait JitterSource: Send {
    fn sample(&mut self) -> f32;
}

/// Uniform random jitter in `[JITTER_MIN, JITTER_MAX]`.
pub struct UniformJitter {
    rng: StdRng,
}

impl UniformJitter {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for UniformJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl JitterSource for UniformJitter {
    fn sample(&mut self) -> f32 {
        self.rng.gen_range(JITTER_MIN..=JITTER_MAX)
    }
}

/// Constant jitter for deterministic tests.
pub struct FixedJitter(pub f32);

impl JitterSource for FixedJitter {
    fn sample(&mut self) -> f32 {
        self.0
    }
}

/// Shape one live meter reading into a visual amplitude.
///
/// The dB reading is floored at [`POWER_FLOOR_DB`], converted to linear
/// gain, soft-clipped so loud input saturates smoothly, offset by the
/// jitter, and clamped into the visual range.
pub fn live_amplitude(power_db: f32, jitter: f32) -> f32 {
    let floored = power_db.max(POWER_FLOOR_DB);
    let linear = 10f32.powf(floored / 20.0);
    ((linear * 8.0).tanh() + jitter).clamp(AMPLITUDE_MIN, AMPLITUDE_MAX)
}

/// RMS energy of each contiguous bucket of `samples`.
///
/// Bucket size is `max(len / buckets, 1)`; at most `buckets` values are
/// produced, so a remainder never yields an extra bucket. Fewer raw
/// samples than buckets yields one bucket per sample.
pub fn bucket_rms(samples: &[f32], buckets: usize) -> Vec<f32> {
    if samples.is_empty() || buckets == 0 {
        return Vec::new();
    }

    let chunk_size = (samples.len() / buckets).max(1);

    samples
        .chunks(chunk_size)
        .take(buckets)
        .map(|chunk| {
            let energy: f32 = chunk.iter().map(|s| s * s).sum();
            (energy / chunk.len() as f32).sqrt()
        })
        .collect()
}

/// Shape one summary bucket's RMS into a visual amplitude.
pub fn summary_amplitude(rms: f32, jitter: f32) -> f32 {
    ((rms * 10.0).tanh() + jitter).clamp(AMPLITUDE_MIN, AMPLITUDE_MAX)
}

/// Reduce a raw sample buffer to at most `buckets` shaped amplitudes.
pub fn downsample(samples: &[f32], buckets: usize, jitter: &mut dyn JitterSource) -> Vec<f32> {
    bucket_rms(samples, buckets)
        .into_iter()
        .map(|rms| summary_amplitude(rms, jitter.sample()))
        .collect()
}
