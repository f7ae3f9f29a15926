use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Thread-safe level cell a UI can poll while a capture session reports
/// chunk energies into it. Stores a linear RMS value, 0.0 when idle.
#[derive(Clone, Debug, Default)]
pub struct LiveMeter {
    level_bits: Arc<AtomicU32>,
}

impl LiveMeter {
    pub fn new() -> Self {
        Self {
            level_bits: Arc::new(AtomicU32::new(0.0f32.to_bits())),
        }
    }

    pub fn set_level(&self, rms: f32) {
        self.level_bits.store(rms.to_bits(), Ordering::Relaxed);
    }

    pub fn level(&self) -> f32 {
        f32::from_bits(self.level_bits.load(Ordering::Relaxed))
    }
}

/// Root-mean-square energy of a block of samples. Numerically trivial but
/// kept in one place so the capture loop, calibration and tests agree on
/// the definition: sqrt(mean(x^2)), exactly 0.0 for empty or silent input.
pub(super) fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    energy.sqrt()
}

/// RMS of i16 PCM with samples normalized to [-1.0, 1.0] first, so the
/// calibrated thresholds stay in one unit system regardless of bit depth.
pub(super) fn rms_i16(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f32 = samples
        .iter()
        .map(|&s| {
            let x = s as f32 / 32_768.0;
            x * x
        })
        .sum::<f32>()
        / samples.len() as f32;
    energy.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_silence_is_exactly_zero() {
        assert_eq!(rms(&[0.0; 1600]), 0.0);
        assert_eq!(rms_i16(&[0i16; 1600]), 0.0);
    }

    #[test]
    fn rms_of_empty_input_is_zero() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(rms_i16(&[]), 0.0);
    }

    #[test]
    fn rms_of_constant_signal_matches_amplitude() {
        let samples = vec![0.5f32; 800];
        assert!((rms(&samples) - 0.5).abs() < 1e-6);

        let pcm = vec![16_384i16; 800];
        assert!((rms_i16(&pcm) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn live_meter_starts_at_zero_and_updates() {
        let meter = LiveMeter::new();
        assert_eq!(meter.level(), 0.0);
        meter.set_level(0.25);
        assert_eq!(meter.level(), 0.25);
    }
}
