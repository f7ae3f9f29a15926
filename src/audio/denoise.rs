//! Stationary spectral noise gating.
//!
//! Classic short-time-Fourier gating: estimate a per-bin noise profile
//! from the magnitude statistics of the whole utterance, build a binary
//! speech mask (magnitude above mean + 1.5 sigma), smooth it over time and
//! frequency, and attenuate masked-out bins by the configured strength.
//! Strength stays below 1.0 so the residual keeps natural voice texture
//! instead of the watery artifacts full suppression produces.

use anyhow::{anyhow, Result};
use realfft::num_complex::Complex32;
use realfft::RealFftPlanner;
use std::f32::consts::PI;

const FFT_SIZE: usize = 512;
const HOP: usize = FFT_SIZE / 4;
const N_BINS: usize = FFT_SIZE / 2 + 1;
/// Bins louder than mean + this many standard deviations count as speech.
const GATE_SIGMA: f32 = 1.5;
/// Mask smoothing half-width, in frames and in bins.
const SMOOTH_RADIUS: usize = 2;

/// Apply stationary spectral gating to a full utterance and return a
/// buffer of the same length. Buffers shorter than one analysis window
/// pass through untouched; there is nothing to profile in them.
pub(super) fn reduce_noise(samples: &[f32], strength: f32) -> Result<Vec<f32>> {
    let strength = strength.clamp(0.0, 1.0);
    if samples.len() < FFT_SIZE || strength == 0.0 {
        return Ok(samples.to_vec());
    }

    let n_frames = (samples.len() - FFT_SIZE).div_ceil(HOP) + 1;
    let padded_len = (n_frames - 1) * HOP + FFT_SIZE;
    let mut padded = samples.to_vec();
    padded.resize(padded_len, 0.0);

    let window = hann_window(FFT_SIZE);
    let mut planner = RealFftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(FFT_SIZE);
    let inverse = planner.plan_fft_inverse(FFT_SIZE);

    // Analysis pass: windowed spectra plus per-frame magnitudes.
    let mut spectra: Vec<Vec<Complex32>> = Vec::with_capacity(n_frames);
    let mut magnitudes: Vec<Vec<f32>> = Vec::with_capacity(n_frames);
    let mut indata = forward.make_input_vec();
    for frame in 0..n_frames {
        let start = frame * HOP;
        for (i, slot) in indata.iter_mut().enumerate() {
            *slot = padded[start + i] * window[i];
        }
        let mut spectrum = forward.make_output_vec();
        forward
            .process(&mut indata, &mut spectrum)
            .map_err(|e| anyhow!("forward FFT failed: {e}"))?;
        magnitudes.push(spectrum.iter().map(|c| c.norm()).collect());
        spectra.push(spectrum);
    }

    let gains = gate_gains(&magnitudes, strength);

    // Synthesis pass: attenuate, invert, overlap-add with the same window.
    let mut out = vec![0.0f32; padded_len];
    let mut norm = vec![0.0f32; padded_len];
    let mut time = inverse.make_output_vec();
    for (frame, spectrum) in spectra.iter_mut().enumerate() {
        for (bin, value) in spectrum.iter_mut().enumerate() {
            *value *= gains[frame][bin];
        }
        // Purely real gains keep these zero, but the inverse transform
        // rejects any residual imaginary part in the edge bins.
        spectrum[0].im = 0.0;
        spectrum[N_BINS - 1].im = 0.0;
        inverse
            .process(spectrum, &mut time)
            .map_err(|e| anyhow!("inverse FFT failed: {e}"))?;

        let start = frame * HOP;
        for i in 0..FFT_SIZE {
            let w = window[i];
            out[start + i] += time[i] / FFT_SIZE as f32 * w;
            norm[start + i] += w * w;
        }
    }
    for (sample, weight) in out.iter_mut().zip(&norm) {
        *sample /= weight.max(1e-8);
    }

    out.truncate(samples.len());
    Ok(out)
}

/// Per-frame, per-bin attenuation in [1 - strength, 1.0].
fn gate_gains(magnitudes: &[Vec<f32>], strength: f32) -> Vec<Vec<f32>> {
    let n_frames = magnitudes.len();

    // Stationary noise profile: magnitude mean and spread per bin.
    let mut threshold = vec![0.0f32; N_BINS];
    for (bin, slot) in threshold.iter_mut().enumerate() {
        let mean =
            magnitudes.iter().map(|m| m[bin]).sum::<f32>() / n_frames as f32;
        let var = magnitudes
            .iter()
            .map(|m| {
                let d = m[bin] - mean;
                d * d
            })
            .sum::<f32>()
            / n_frames as f32;
        *slot = mean + GATE_SIGMA * var.sqrt();
    }

    let mask: Vec<Vec<f32>> = magnitudes
        .iter()
        .map(|frame| {
            frame
                .iter()
                .zip(&threshold)
                .map(|(&m, &t)| if m > t { 1.0 } else { 0.0 })
                .collect()
        })
        .collect();
    let smoothed = smooth_mask(&mask);

    smoothed
        .into_iter()
        .map(|frame| {
            frame
                .into_iter()
                .map(|m| 1.0 - strength * (1.0 - m))
                .collect()
        })
        .collect()
}

/// Box-average the binary mask across neighboring bins and frames so gate
/// decisions do not flutter on and off between adjacent frames.
fn smooth_mask(mask: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let n_frames = mask.len();

    // Frequency direction first.
    let mut freq_smoothed = vec![vec![0.0f32; N_BINS]; n_frames];
    for frame in 0..n_frames {
        for bin in 0..N_BINS {
            let lo = bin.saturating_sub(SMOOTH_RADIUS);
            let hi = (bin + SMOOTH_RADIUS).min(N_BINS - 1);
            let sum: f32 = mask[frame][lo..=hi].iter().sum();
            freq_smoothed[frame][bin] = sum / (hi - lo + 1) as f32;
        }
    }

    // Then time direction.
    let mut smoothed = vec![vec![0.0f32; N_BINS]; n_frames];
    for frame in 0..n_frames {
        let lo = frame.saturating_sub(SMOOTH_RADIUS);
        let hi = (frame + SMOOTH_RADIUS).min(n_frames - 1);
        let span = (hi - lo + 1) as f32;
        for bin in 0..N_BINS {
            let sum: f32 = (lo..=hi).map(|f| freq_smoothed[f][bin]).sum();
            smoothed[frame][bin] = sum / span;
        }
    }
    smoothed
}

fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n as f32).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::meter;

    /// Deterministic pseudo-noise in [-amplitude, amplitude].
    fn pseudo_noise(len: usize, amplitude: f32, mut seed: u32) -> Vec<f32> {
        (0..len)
            .map(|_| {
                seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let unit = (seed >> 8) as f32 / (1u32 << 24) as f32;
                (unit * 2.0 - 1.0) * amplitude
            })
            .collect()
    }

    #[test]
    fn preserves_buffer_length() {
        for len in [FFT_SIZE, 5_000, 16_001] {
            let input = pseudo_noise(len, 0.1, 7);
            let output = reduce_noise(&input, 0.8).expect("denoise");
            assert_eq!(output.len(), len);
        }
    }

    #[test]
    fn short_buffers_pass_through_unchanged() {
        let input = pseudo_noise(FFT_SIZE - 1, 0.1, 3);
        let output = reduce_noise(&input, 0.8).expect("denoise");
        assert_eq!(output, input);
    }

    #[test]
    fn zero_strength_is_identity() {
        let input = pseudo_noise(4_096, 0.1, 11);
        let output = reduce_noise(&input, 0.0).expect("denoise");
        assert_eq!(output, input);
    }

    #[test]
    fn attenuates_stationary_noise() {
        let input = pseudo_noise(16_000, 0.1, 42);
        let output = reduce_noise(&input, 0.8).expect("denoise");
        let in_rms = meter::rms(&input);
        let out_rms = meter::rms(&output);
        assert!(
            out_rms < in_rms * 0.8,
            "noise should drop: in={in_rms} out={out_rms}"
        );
    }

    #[test]
    fn keeps_a_loud_burst_while_gating_the_quiet_tail() {
        let mut input = pseudo_noise(16_000, 0.01, 99);
        for (i, sample) in input[8_000..12_000].iter_mut().enumerate() {
            *sample += 0.5 * (2.0 * PI * 300.0 * i as f32 / 16_000.0).sin();
        }
        let output = reduce_noise(&input, 0.8).expect("denoise");

        let in_burst = meter::rms(&input[8_500..11_500]);
        let out_burst = meter::rms(&output[8_500..11_500]);
        assert!(
            out_burst > in_burst * 0.5,
            "burst should survive: in={in_burst} out={out_burst}"
        );

        let in_quiet = meter::rms(&input[2_000..6_000]);
        let out_quiet = meter::rms(&output[2_000..6_000]);
        assert!(
            out_quiet < in_quiet * 0.6,
            "quiet tail should be gated: in={in_quiet} out={out_quiet}"
        );
    }
}
