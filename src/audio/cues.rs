//! Audible status cues.
//!
//! Short synthesized tones on the default output device tell the user the
//! engine changed phase without any visual indicator: capture started,
//! utterance accepted and processing, transcript delivered. Playback is
//! fire-and-forget on a detached thread; a machine with no output device
//! just records quietly.

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::bounded;
use std::f32::consts::PI;
use std::time::Duration;
use tracing::debug;

const TONE_AMPLITUDE: f32 = 0.3;
const FADE_MS: u64 = 5;

/// The three fixed cues the engine and its orchestrator emit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cue {
    /// Single high beep: calibration done, microphone is live.
    Start,
    /// Two quick beeps: utterance accepted, cleanup underway.
    Processing,
    /// Ascending pair: the downstream consumer finished.
    Success,
}

/// One tone or gap; `freq_hz == 0.0` means silence.
struct Segment {
    freq_hz: f32,
    duration_ms: u64,
}

impl Cue {
    pub fn label(&self) -> &'static str {
        match self {
            Cue::Start => "start",
            Cue::Processing => "processing",
            Cue::Success => "success",
        }
    }

    fn segments(&self) -> &'static [Segment] {
        const GAP: Segment = Segment { freq_hz: 0.0, duration_ms: 50 };
        match self {
            Cue::Start => &[Segment { freq_hz: 1_000.0, duration_ms: 200 }],
            Cue::Processing => &[
                Segment { freq_hz: 800.0, duration_ms: 100 },
                GAP,
                Segment { freq_hz: 800.0, duration_ms: 100 },
            ],
            Cue::Success => &[
                Segment { freq_hz: 600.0, duration_ms: 150 },
                GAP,
                Segment { freq_hz: 900.0, duration_ms: 200 },
            ],
        }
    }
}

/// Play a cue without blocking the caller. Failures are logged and
/// swallowed; a missing speaker must never abort a capture session.
pub fn play_cue(cue: Cue) {
    std::thread::spawn(move || {
        if let Err(err) = play_blocking(cue) {
            debug!(cue = cue.label(), %err, "status cue playback failed");
        }
    });
}

fn play_blocking(cue: Cue) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no default output device")?;
    let default_config = device
        .default_output_config()
        .context("failed to query output device config")?;
    let format = default_config.sample_format();
    let config: StreamConfig = default_config.into();
    let rate = config.sample_rate.0;
    let channels = usize::from(config.channels.max(1));

    let samples = synthesize(cue.segments(), rate);
    let total_ms = samples.len() as u64 * 1_000 / u64::from(rate.max(1));
    let (done_tx, done_rx) = bounded::<()>(1);
    let mut pos = 0usize;

    let err_fn = |err| debug!(%err, "output stream error");
    let stream = match format {
        SampleFormat::F32 => device.build_output_stream(
            &config,
            move |data: &mut [f32], _| {
                for frame in data.chunks_mut(channels) {
                    let value = samples.get(pos).copied().unwrap_or(0.0);
                    frame.fill(value);
                    if pos < samples.len() {
                        pos += 1;
                        if pos == samples.len() {
                            let _ = done_tx.try_send(());
                        }
                    }
                }
            },
            err_fn,
            None,
        )?,
        SampleFormat::I16 => device.build_output_stream(
            &config,
            move |data: &mut [i16], _| {
                for frame in data.chunks_mut(channels) {
                    let value = samples.get(pos).copied().unwrap_or(0.0);
                    frame.fill((value * 32_767.0) as i16);
                    if pos < samples.len() {
                        pos += 1;
                        if pos == samples.len() {
                            let _ = done_tx.try_send(());
                        }
                    }
                }
            },
            err_fn,
            None,
        )?,
        other => return Err(anyhow!("unsupported output sample format: {other:?}")),
    };

    stream.play().context("failed to start output stream")?;
    let _ = done_rx.recv_timeout(Duration::from_millis(total_ms + 500));
    Ok(())
}

/// Render the segment list as mono samples with a short linear fade at
/// each tone edge to avoid clicks.
fn synthesize(segments: &[Segment], rate: u32) -> Vec<f32> {
    let mut samples = Vec::new();
    let fade_samples = ((u64::from(rate) * FADE_MS) / 1_000).max(1) as usize;
    for segment in segments {
        let n = ((u64::from(rate) * segment.duration_ms) / 1_000) as usize;
        if segment.freq_hz == 0.0 {
            samples.extend(std::iter::repeat(0.0).take(n));
            continue;
        }
        let step = 2.0 * PI * segment.freq_hz / rate as f32;
        for i in 0..n {
            let envelope = if i < fade_samples {
                i as f32 / fade_samples as f32
            } else if i + fade_samples >= n {
                (n - i) as f32 / fade_samples as f32
            } else {
                1.0
            };
            samples.push((step * i as f32).sin() * TONE_AMPLITUDE * envelope);
        }
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_labels_are_stable() {
        assert_eq!(Cue::Start.label(), "start");
        assert_eq!(Cue::Processing.label(), "processing");
        assert_eq!(Cue::Success.label(), "success");
    }

    #[test]
    fn synthesized_tone_covers_the_requested_duration() {
        let samples = synthesize(Cue::Start.segments(), 16_000);
        assert_eq!(samples.len(), 3_200); // 200 ms at 16 kHz
        assert!(samples.iter().any(|&s| s.abs() > 0.1));
    }

    #[test]
    fn gaps_render_as_silence() {
        let samples = synthesize(Cue::Processing.segments(), 16_000);
        // 100 ms tone, 50 ms gap, 100 ms tone.
        assert_eq!(samples.len(), 4_000);
        let gap = &samples[1_600..2_400];
        assert!(gap.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn tones_start_and_end_near_zero() {
        let samples = synthesize(Cue::Start.segments(), 16_000);
        assert!(samples.first().copied().unwrap_or(1.0).abs() < 1e-3);
        assert!(samples.last().copied().unwrap_or(1.0).abs() < 0.05);
    }
}
