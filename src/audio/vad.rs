//! Noise calibration for the energy-based voice activity detector.
//!
//! A short silence sample recorded at session start sets the speech
//! threshold adaptively, so the same config works in a quiet office and
//! next to a humming desktop fan.

use super::chunk::ChunkSource;
use super::meter;
use crate::config::CaptureConfig;
use anyhow::{Context, Result};

/// Adaptive silence threshold derived once per session, never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationResult {
    /// RMS of the ambient noise sample, normalized units.
    pub noise_rms: f32,
    /// Chunks with RMS above this are classified as speech.
    pub threshold: f32,
}

/// `max(noise_rms * multiplier, floor)`. The floor keeps electrical noise
/// from reading as speech when the room measures near-zero.
pub(super) fn derive_threshold(noise_rms: f32, multiplier: f32, floor: f32) -> f32 {
    (noise_rms * multiplier).max(floor)
}

/// Record the calibration window from `source` under the assumption the
/// user is silent and derive the session threshold. A device failure here
/// is fatal to the session; no recording is attempted afterwards.
pub(super) fn calibrate(
    source: &mut dyn ChunkSource,
    cfg: &CaptureConfig,
) -> Result<CalibrationResult> {
    if !cfg.calibrate {
        return Ok(CalibrationResult {
            noise_rms: 0.0,
            threshold: cfg.base_silence_threshold,
        });
    }

    let mut window = Vec::with_capacity(cfg.calibration_chunks() * cfg.chunk_samples());
    for _ in 0..cfg.calibration_chunks() {
        let (chunk, _) = source
            .read_chunk()
            .context("noise calibration read failed")?;
        window.extend_from_slice(chunk.samples());
    }
    let noise_rms = meter::rms_i16(&window);
    Ok(CalibrationResult {
        noise_rms,
        threshold: derive_threshold(noise_rms, cfg.noise_multiplier, cfg.threshold_floor),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_scales_noise_by_multiplier() {
        let threshold = derive_threshold(0.02, 2.5, 0.01);
        assert!((threshold - 0.05).abs() < 1e-6);
    }

    #[test]
    fn threshold_never_drops_below_floor() {
        assert_eq!(derive_threshold(0.0, 2.5, 0.01), 0.01);
        assert_eq!(derive_threshold(0.001, 2.5, 0.01), 0.01);
    }

    #[test]
    fn threshold_matches_invariant_for_various_noise_levels() {
        for noise in [0.0f32, 0.003, 0.004, 0.02, 0.3] {
            let threshold = derive_threshold(noise, 2.5, 0.01);
            assert!((threshold - (noise * 2.5).max(0.01)).abs() < 1e-7);
            assert!(threshold >= 0.01);
        }
    }
}
