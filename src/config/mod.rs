//! Engine configuration and validation helpers.
//!
//! The orchestrating process owns where configuration comes from (file,
//! defaults, UI); this crate only defines the shape and the rules. A
//! [`CaptureConfig`] is validated once when the engine is constructed and
//! never mutated afterwards.

mod defaults;
#[cfg(test)]
mod tests;
mod validation;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_BASE_SILENCE_THRESHOLD, DEFAULT_CHUNK_MS, DEFAULT_MAX_DURATION_MS,
    DEFAULT_MIN_DURATION_MS, DEFAULT_NOISE_MULTIPLIER, DEFAULT_SAMPLE_RATE,
    DEFAULT_THRESHOLD_FLOOR, DEFAULT_TRAILING_SILENCE_MS,
};
use defaults::{
    DEFAULT_CALIBRATION_MS, DEFAULT_CHANNELS, DEFAULT_CHANNEL_CAPACITY, DEFAULT_DENOISE_STRENGTH,
    DEFAULT_HIGHPASS_HZ, DEFAULT_LOWPASS_HZ, DEFAULT_TARGET_PEAK,
};

/// Immutable per-engine configuration. One instance covers every session
/// the engine runs; all durations are wall-clock milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Sample rate of captured chunks and of the artifact (Hz).
    pub sample_rate: u32,
    /// Channel count; only mono is supported.
    pub channels: u16,
    /// Duration of one capture chunk.
    pub chunk_ms: u64,
    /// Hard cap on a single recording, pre-speech silence included.
    pub max_duration_ms: u64,
    /// Shortest session accepted as valid speech.
    pub min_duration_ms: u64,
    /// Threshold used when noise calibration is disabled.
    pub base_silence_threshold: f32,
    /// Continuous sub-threshold time after speech that ends the session.
    pub trailing_silence_ms: u64,
    /// Calibrated threshold = max(noise_rms * multiplier, threshold_floor).
    pub noise_multiplier: f32,
    /// Lower bound on the calibrated threshold; keeps electrical noise from
    /// registering as speech when the room is very quiet.
    pub threshold_floor: f32,
    /// Ambient noise sample length recorded before each session.
    pub calibration_ms: u64,
    /// Run the noise calibration pass at session start.
    pub calibrate: bool,
    /// Bounded channel capacity between the device callback and the
    /// session loop, in chunks.
    pub channel_capacity: usize,
    /// Preferred input device name; default device when unset.
    pub input_device: Option<String>,
    /// Directory for finished artifacts; the OS temp dir when unset.
    pub artifact_dir: Option<PathBuf>,
    /// Spectral gating reduction strength, 0.0 (off) to 1.0 (full).
    pub denoise_strength: f32,
    /// High-pass cutoff removing sub-audio rumble (Hz).
    pub highpass_hz: f32,
    /// Low-pass cutoff removing hiss above the speech band (Hz).
    pub lowpass_hz: f32,
    /// Linear peak level the cleaned utterance is normalized to.
    pub target_peak: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            chunk_ms: DEFAULT_CHUNK_MS,
            max_duration_ms: DEFAULT_MAX_DURATION_MS,
            min_duration_ms: DEFAULT_MIN_DURATION_MS,
            base_silence_threshold: DEFAULT_BASE_SILENCE_THRESHOLD,
            trailing_silence_ms: DEFAULT_TRAILING_SILENCE_MS,
            noise_multiplier: DEFAULT_NOISE_MULTIPLIER,
            threshold_floor: DEFAULT_THRESHOLD_FLOOR,
            calibration_ms: DEFAULT_CALIBRATION_MS,
            calibrate: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            input_device: None,
            artifact_dir: None,
            denoise_strength: DEFAULT_DENOISE_STRENGTH,
            highpass_hz: DEFAULT_HIGHPASS_HZ,
            lowpass_hz: DEFAULT_LOWPASS_HZ,
            target_peak: DEFAULT_TARGET_PEAK,
        }
    }
}

impl CaptureConfig {
    /// Samples per chunk at the configured rate.
    pub fn chunk_samples(&self) -> usize {
        ((self.sample_rate as u64 * self.chunk_ms) / 1000).max(1) as usize
    }

    /// Whole chunks needed to cover the calibration window.
    pub fn calibration_chunks(&self) -> usize {
        (self.calibration_ms.div_ceil(self.chunk_ms)).max(1) as usize
    }
}
