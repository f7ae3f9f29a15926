//! Default values shared by [`super::CaptureConfig`] and its validation.

/// Whisper's native rate; chunks and artifacts both use it.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
pub(super) const DEFAULT_CHANNELS: u16 = 1;
pub const DEFAULT_CHUNK_MS: u64 = 100;
pub const DEFAULT_MAX_DURATION_MS: u64 = 60_000;
pub const DEFAULT_MIN_DURATION_MS: u64 = 300;
pub const DEFAULT_BASE_SILENCE_THRESHOLD: f32 = 0.015;
/// Long tail so the user gets time to think mid-sentence.
pub const DEFAULT_TRAILING_SILENCE_MS: u64 = 3_000;
pub const DEFAULT_NOISE_MULTIPLIER: f32 = 2.5;
pub const DEFAULT_THRESHOLD_FLOOR: f32 = 0.01;
pub(super) const DEFAULT_CALIBRATION_MS: u64 = 500;
pub(super) const DEFAULT_CHANNEL_CAPACITY: usize = 64;
/// Moderate reduction; full suppression flattens voice texture.
pub(super) const DEFAULT_DENOISE_STRENGTH: f32 = 0.8;
pub(super) const DEFAULT_HIGHPASS_HZ: f32 = 80.0;
pub(super) const DEFAULT_LOWPASS_HZ: f32 = 7_500.0;
/// Linear equivalent of -1 dBFS.
pub(super) const DEFAULT_TARGET_PEAK: f32 = 0.891;

pub(super) const MAX_DURATION_HARD_LIMIT_MS: u64 = 600_000;
pub(super) const MIN_SAMPLE_RATE: u32 = 8_000;
pub(super) const MAX_SAMPLE_RATE: u32 = 96_000;
