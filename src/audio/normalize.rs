//! Peak normalization and the float/PCM boundary conversions.

/// Scale the buffer so its absolute peak hits `target_peak`. A zero-peak
/// buffer passes through unscaled; the speech-detected gate should make
/// that unreachable, but division by zero is not how to find out.
pub(super) fn normalize_peak(samples: &mut [f32], target_peak: f32) {
    let peak = samples.iter().fold(0.0f32, |max, &s| max.max(s.abs()));
    if peak > 0.0 {
        let gain = target_peak / peak;
        for sample in samples.iter_mut() {
            *sample *= gain;
        }
    }
}

pub(super) fn to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32_768.0).collect()
}

/// Convert to 16-bit PCM with hard clipping at the format's range; values
/// outside full scale saturate, never wrap.
pub(super) fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s * 32_767.0).clamp(-32_768.0, 32_767.0) as i16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |max, &s| max.max(s.abs()))
    }

    #[test]
    fn normalization_hits_the_target_peak() {
        let mut buf = vec![0.1f32, -0.3, 0.2, 0.05];
        normalize_peak(&mut buf, 0.891);
        assert!((peak(&buf) - 0.891).abs() < 1e-6);
    }

    #[test]
    fn normalization_is_idempotent() {
        let mut buf: Vec<f32> = (0..1_000).map(|i| ((i * 37) % 100) as f32 / 250.0 - 0.2).collect();
        normalize_peak(&mut buf, 0.891);
        let first_peak = peak(&buf);
        normalize_peak(&mut buf, 0.891);
        assert!(
            (peak(&buf) - first_peak).abs() < 1e-6,
            "second pass must not change the peak"
        );
    }

    #[test]
    fn zero_buffer_passes_through_unscaled() {
        let mut buf = vec![0.0f32; 64];
        normalize_peak(&mut buf, 0.891);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn conversion_clips_instead_of_wrapping() {
        let out = to_i16(&[1.5, -1.5, 2.0, -2.0, 0.0]);
        assert_eq!(out, vec![32_767, -32_768, 32_767, -32_768, 0]);
        for &s in &out {
            assert!((-32_768..=32_767).contains(&(s as i32)));
        }
    }

    #[test]
    fn pcm_round_trip_is_close() {
        let pcm = vec![0i16, 100, -100, 16_384, -16_384];
        let floats = to_f32(&pcm);
        let back = to_i16(&floats);
        for (a, b) in pcm.iter().zip(&back) {
            assert!((a - b).abs() <= 1, "{a} vs {b}");
        }
    }
}
