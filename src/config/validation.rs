use super::defaults::{MAX_DURATION_HARD_LIMIT_MS, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
use super::CaptureConfig;
use anyhow::{bail, Result};

impl CaptureConfig {
    /// Check value ranges and cross-field constraints. The engine calls
    /// this once at construction; orchestrators loading config from disk
    /// should call it before handing the struct over.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            bail!(
                "sample_rate must be between {MIN_SAMPLE_RATE} and {MAX_SAMPLE_RATE} Hz, got {}",
                self.sample_rate
            );
        }
        if self.channels != 1 {
            bail!("only mono capture is supported, got {} channels", self.channels);
        }
        if !(10..=500).contains(&self.chunk_ms) {
            bail!("chunk_ms must be between 10 and 500 ms, got {}", self.chunk_ms);
        }
        if self.max_duration_ms == 0 || self.max_duration_ms > MAX_DURATION_HARD_LIMIT_MS {
            bail!(
                "max_duration_ms must be between 1 and {MAX_DURATION_HARD_LIMIT_MS} ms, got {}",
                self.max_duration_ms
            );
        }
        if self.min_duration_ms > self.max_duration_ms {
            bail!(
                "min_duration_ms ({}) exceeds max_duration_ms ({})",
                self.min_duration_ms,
                self.max_duration_ms
            );
        }
        if self.trailing_silence_ms < self.chunk_ms
            || self.trailing_silence_ms > self.max_duration_ms
        {
            bail!(
                "trailing_silence_ms must be >= chunk_ms and <= max_duration_ms ({}), got {}",
                self.max_duration_ms,
                self.trailing_silence_ms
            );
        }
        if self.calibration_ms == 0 {
            bail!("calibration_ms must be nonzero");
        }
        if self.channel_capacity == 0 {
            bail!("channel_capacity must be nonzero");
        }
        if !self.noise_multiplier.is_finite() || self.noise_multiplier <= 0.0 {
            bail!("noise_multiplier must be positive, got {}", self.noise_multiplier);
        }
        if !self.threshold_floor.is_finite() || self.threshold_floor <= 0.0 {
            bail!("threshold_floor must be positive, got {}", self.threshold_floor);
        }
        if !self.base_silence_threshold.is_finite() || self.base_silence_threshold <= 0.0 {
            bail!(
                "base_silence_threshold must be positive, got {}",
                self.base_silence_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.denoise_strength) {
            bail!(
                "denoise_strength must be within 0.0..=1.0, got {}",
                self.denoise_strength
            );
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        if self.highpass_hz <= 0.0 || self.highpass_hz >= nyquist {
            bail!(
                "highpass_hz must be between 0 and the Nyquist rate ({nyquist} Hz), got {}",
                self.highpass_hz
            );
        }
        if self.lowpass_hz <= self.highpass_hz || self.lowpass_hz >= nyquist {
            bail!(
                "lowpass_hz must be above highpass_hz and below the Nyquist rate ({nyquist} Hz), got {}",
                self.lowpass_hz
            );
        }
        if !(0.0 < self.target_peak && self.target_peak <= 1.0) {
            bail!("target_peak must be within (0.0, 1.0], got {}", self.target_peak);
        }
        Ok(())
    }
}
