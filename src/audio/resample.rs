//! Sample-rate conversion from whatever the microphone natively runs at
//! (typically 44.1 or 48 kHz) down to the engine's 16 kHz. The default
//! build uses a sinc resampler; without the `high-quality-audio` feature,
//! or when the sinc path fails, a linear resampler behind an anti-alias
//! FIR takes over.

use std::cmp::Ordering as CmpOrdering;
use std::f32::consts::PI;

#[cfg(feature = "high-quality-audio")]
use anyhow::{anyhow, Result};
#[cfg(feature = "high-quality-audio")]
use rubato::{InterpolationParameters, InterpolationType, Resampler, SincFixedIn, WindowFunction};
#[cfg(feature = "high-quality-audio")]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(feature = "high-quality-audio")]
use tracing::warn;

// Practical device-rate bounds; anything outside is a driver bug.
const MIN_DEVICE_RATE: u32 = 2_000;
const MAX_DEVICE_RATE: u32 = 192_000;
const MAX_FIR_TAPS: usize = 129;

#[cfg(feature = "high-quality-audio")]
static SINC_FALLBACK_WARNED: AtomicBool = AtomicBool::new(false);

/// Convert a device-rate chunk to a target-rate chunk of exactly
/// `target_samples`, padding or truncating the tail sample as needed so
/// chunk boundaries stay aligned with wall-clock time.
pub(super) fn convert_chunk(
    chunk: Vec<f32>,
    device_rate: u32,
    target_rate: u32,
    target_samples: usize,
) -> Vec<f32> {
    if device_rate == target_rate {
        return fit_length(chunk, target_samples);
    }
    fit_length(resample(&chunk, device_rate, target_rate), target_samples)
}

pub(super) fn resample(input: &[f32], device_rate: u32, target_rate: u32) -> Vec<f32> {
    if input.is_empty() || device_rate == 0 || device_rate == target_rate {
        return input.to_vec();
    }

    #[cfg(feature = "high-quality-audio")]
    {
        match sinc_resample(input, device_rate, target_rate) {
            Ok(output) => return output,
            Err(err) => {
                if !SINC_FALLBACK_WARNED.swap(true, Ordering::AcqRel) {
                    warn!(%err, "sinc resampler failed, using linear fallback");
                }
            }
        }
    }

    linear_with_antialias(input, device_rate, target_rate)
}

#[cfg(feature = "high-quality-audio")]
fn sinc_resample(input: &[f32], device_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if !(MIN_DEVICE_RATE..=MAX_DEVICE_RATE).contains(&device_rate) {
        return Err(anyhow!("unsupported device rate {device_rate} Hz"));
    }
    let ratio = target_rate as f64 / device_rate as f64;

    const CHUNK: usize = 256;
    let params = InterpolationParameters {
        sinc_len: 64,
        f_cutoff: 0.9,
        interpolation: InterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK, 1)
        .map_err(|e| anyhow!("failed to construct sinc resampler: {e:?}"))?;

    let expected = ((input.len() as f64) * ratio).round() as usize;
    let mut output = Vec::with_capacity(expected + CHUNK);
    let mut segment = vec![0.0f32; CHUNK];
    let mut idx = 0usize;
    while idx < input.len() {
        let end = (idx + CHUNK).min(input.len());
        let pad = input[end - 1];
        segment.fill(pad);
        segment[..end - idx].copy_from_slice(&input[idx..end]);
        let produced = resampler
            .process(std::slice::from_ref(&segment), None)
            .map_err(|e| anyhow!("sinc resampler process failed: {e:?}"))?;
        output.extend_from_slice(&produced[0]);
        idx = end;
    }

    Ok(fit_length(output, expected.max(1)))
}

fn linear_with_antialias(input: &[f32], device_rate: u32, target_rate: u32) -> Vec<f32> {
    if !(MIN_DEVICE_RATE..=MAX_DEVICE_RATE).contains(&device_rate) {
        return input.to_vec();
    }
    let ratio = target_rate as f32 / device_rate as f32;
    let filtered = if device_rate > target_rate {
        // Decimation aliases anything above the target Nyquist; tame it first.
        let cutoff = (target_rate as f32 * 0.5 / device_rate as f32).min(0.499);
        fir_low_pass(input, cutoff, fir_tap_count(device_rate, target_rate))
    } else {
        input.to_vec()
    };
    linear_resample(&filtered, ratio)
}

pub(super) fn linear_resample(input: &[f32], ratio: f32) -> Vec<f32> {
    let output_len = (input.len() as f32 * ratio).round() as usize;
    let mut output = Vec::with_capacity(output_len);
    for i in 0..output_len {
        let src = i as f32 / ratio;
        let idx = src.floor() as usize;
        let frac = src - idx as f32;
        if idx + 1 < input.len() {
            output.push(input[idx] * (1.0 - frac) + input[idx + 1] * frac);
        } else {
            output.push(input.last().copied().unwrap_or(0.0));
        }
    }
    output
}

fn fir_tap_count(device_rate: u32, target_rate: u32) -> usize {
    let decimation = device_rate as f32 / target_rate as f32;
    let mut taps = (decimation * 4.0).ceil().max(11.0) as usize;
    if taps % 2 == 0 {
        taps += 1;
    }
    taps.min(MAX_FIR_TAPS)
}

fn fir_low_pass(input: &[f32], normalized_cutoff: f32, taps: usize) -> Vec<f32> {
    if input.is_empty() || taps <= 1 {
        return input.to_vec();
    }
    let coeffs = hamming_sinc_taps(normalized_cutoff, taps);
    let half = taps / 2;
    let mut output = Vec::with_capacity(input.len());
    for n in 0..input.len() {
        let mut acc = 0.0;
        for (k, coeff) in coeffs.iter().enumerate() {
            let idx = n + k;
            if idx >= half {
                if let Some(sample) = input.get(idx - half) {
                    acc += sample * coeff;
                }
            }
        }
        output.push(acc);
    }
    output
}

fn hamming_sinc_taps(normalized_cutoff: f32, taps: usize) -> Vec<f32> {
    let m = (taps - 1) as f32;
    let mut coeffs = Vec::with_capacity(taps);
    for n in 0..taps {
        let centered = n as f32 - m / 2.0;
        let x = 2.0 * PI * normalized_cutoff * centered;
        let sinc = if centered == 0.0 {
            2.0 * normalized_cutoff
        } else {
            (2.0 * normalized_cutoff * x.sin()) / x
        };
        let window = 0.54 - 0.46 * ((2.0 * PI * n as f32) / m).cos();
        coeffs.push(sinc * window);
    }
    let sum: f32 = coeffs.iter().sum();
    if sum != 0.0 {
        for coeff in coeffs.iter_mut() {
            *coeff /= sum;
        }
    }
    coeffs
}

pub(super) fn fit_length(mut data: Vec<f32>, desired: usize) -> Vec<f32> {
    match data.len().cmp(&desired) {
        CmpOrdering::Greater => data.truncate(desired),
        CmpOrdering::Less => {
            let pad = data.last().copied().unwrap_or(0.0);
            data.resize(desired, pad);
        }
        CmpOrdering::Equal => {}
    }
    data
}
