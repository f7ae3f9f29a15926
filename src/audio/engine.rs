//! The capture engine: one call records, gates and cleans an utterance.
//!
//! [`AudioCaptureEngine::capture`] runs the full session: calibrate against
//! ambient noise, stream chunks through the state machine until a stop
//! condition fires, then push the accepted utterance through the cleanup
//! pipeline and write it out as a WAV artifact. The outcome enum tells the
//! orchestrator exactly what happened; the engine itself never panics on
//! device or I/O trouble.

use super::capture::{run_session, SessionContext, SessionVerdict, StopReason};
#[cfg(test)]
use super::chunk::ChunkSource;
use super::cues::{play_cue, Cue};
use super::denoise::reduce_noise;
use super::device::Microphone;
use super::filters::FilterChain;
use super::normalize::{normalize_peak, to_f32, to_i16};
use super::vad::calibrate;
use crate::config::CaptureConfig;
use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Terminal result of one capture session.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// An utterance was accepted, cleaned and written to disk.
    Artifact { path: PathBuf, duration: Duration },
    /// The session ended without any chunk crossing the speech threshold.
    NoSpeechDetected,
    /// Speech was detected but the session was shorter than the minimum.
    TooShort,
    /// The stop predicate was already set before the stream opened.
    ManualStop,
    /// Device or processing failure; the session produced nothing.
    CaptureError(CaptureError),
}

impl CaptureOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CaptureOutcome::Artifact { .. } => "artifact",
            CaptureOutcome::NoSpeechDetected => "no_speech",
            CaptureOutcome::TooShort => "too_short",
            CaptureOutcome::ManualStop => "manual_stop",
            CaptureOutcome::CaptureError(_) => "error",
        }
    }
}

/// Failure classes an orchestrator may want to treat differently: device
/// errors usually mean "check your microphone", processing errors are bugs
/// or disk trouble.
#[derive(Debug)]
pub enum CaptureError {
    Device(String),
    Processing(String),
}

impl CaptureError {
    pub fn label(&self) -> &'static str {
        match self {
            CaptureError::Device(_) => "device",
            CaptureError::Processing(_) => "processing",
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Device(msg) => write!(f, "audio device error: {msg}"),
            CaptureError::Processing(msg) => write!(f, "audio processing error: {msg}"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Reusable capture engine. Construction validates the config and binds the
/// input device; each [`capture`](Self::capture) call is an independent
/// session with its own stream, calibration and state machine.
pub struct AudioCaptureEngine {
    config: CaptureConfig,
    mic: Microphone,
}

impl AudioCaptureEngine {
    pub fn new(config: CaptureConfig) -> Result<Self> {
        config.validate()?;
        let mic = Microphone::new(config.input_device.as_deref())?;
        info!(device = %mic.name(), sample_rate = config.sample_rate, "capture engine ready");
        Ok(Self { config, mic })
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Run one capture session. `stop` is polled at every chunk boundary;
    /// `level` receives per-chunk RMS for a live meter and is reset to 0.0
    /// exactly once when the session ends, on every outcome.
    pub fn capture<S, L>(&self, stop: S, mut level: L) -> CaptureOutcome
    where
        S: Fn() -> bool,
        L: FnMut(f32),
    {
        let outcome = self.capture_inner(&stop, &mut level);
        level(0.0);
        info!(outcome = outcome.label(), "capture session settled");
        outcome
    }

    fn capture_inner(&self, stop: &dyn Fn() -> bool, level: &mut dyn FnMut(f32)) -> CaptureOutcome {
        if stop() {
            return CaptureOutcome::ManualStop;
        }

        let cfg = &self.config;
        let (session, reason) = {
            let mut stream = match self.mic.open_stream(cfg) {
                Ok(stream) => stream,
                Err(err) => {
                    return CaptureOutcome::CaptureError(CaptureError::Device(format!("{err:#}")))
                }
            };

            let calibration = match calibrate(&mut stream, cfg) {
                Ok(calibration) => calibration,
                Err(err) => {
                    return CaptureOutcome::CaptureError(CaptureError::Device(format!("{err:#}")))
                }
            };
            info!(
                noise_rms = calibration.noise_rms,
                threshold = calibration.threshold,
                "noise calibration complete"
            );
            play_cue(Cue::Start);

            let mut session = SessionContext::new(cfg, calibration.threshold);
            let reason = match run_session(&mut stream, &mut session, stop, level) {
                Ok(reason) => reason,
                Err(err) => {
                    return CaptureOutcome::CaptureError(CaptureError::Device(format!("{err:#}")))
                }
            };
            (session, reason)
            // Stream drops here; the device is released before the cleanup
            // pipeline starts crunching.
        };

        settle_session(cfg, session, reason)
    }
}

/// Apply the acceptance gates to a finished session and, if the utterance
/// is accepted, run cleanup and write the artifact.
fn settle_session(
    cfg: &CaptureConfig,
    session: SessionContext,
    reason: StopReason,
) -> CaptureOutcome {
    info!(
        elapsed_ms = session.elapsed_ms(),
        speech = session.speech_detected(),
        reason = reason.label(),
        "capture session ended"
    );

    match session.finish() {
        SessionVerdict::NoSpeech => {
            warn!("no speech detected, discarding session");
            CaptureOutcome::NoSpeechDetected
        }
        SessionVerdict::TooShort => {
            warn!(min_ms = cfg.min_duration_ms, "utterance too short, discarding session");
            CaptureOutcome::TooShort
        }
        SessionVerdict::Accepted { samples, elapsed_ms } => {
            play_cue(Cue::Processing);
            match preprocess_and_store(cfg, &samples) {
                Ok(path) => {
                    info!(path = %path.display(), elapsed_ms, "artifact written");
                    CaptureOutcome::Artifact {
                        path,
                        duration: Duration::from_millis(elapsed_ms),
                    }
                }
                Err(err) => {
                    CaptureOutcome::CaptureError(CaptureError::Processing(format!("{err:#}")))
                }
            }
        }
    }
}

/// The cleanup pipeline in its fixed order: denoise, band-limit, normalize,
/// quantize, write.
fn preprocess_and_store(cfg: &CaptureConfig, samples: &[i16]) -> Result<PathBuf> {
    let mut buf = to_f32(samples);
    buf = reduce_noise(&buf, cfg.denoise_strength).context("noise reduction failed")?;
    FilterChain::band_limit(cfg.sample_rate, cfg.highpass_hz, cfg.lowpass_hz).process(&mut buf);
    normalize_peak(&mut buf, cfg.target_peak);
    let pcm = to_i16(&buf);
    write_artifact(cfg, &pcm)
}

/// Write 16-bit mono PCM to a uniquely named WAV in the artifact directory.
/// A failed write leaves no partial file behind.
fn write_artifact(cfg: &CaptureConfig, pcm: &[i16]) -> Result<PathBuf> {
    let dir = cfg
        .artifact_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create artifact dir {}", dir.display()))?;
    let path = dir.join(format!("voicegate_{}.wav", Uuid::new_v4()));

    let spec = hound::WavSpec {
        channels: cfg.channels,
        sample_rate: cfg.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let result = (|| -> Result<()> {
        let mut writer = hound::WavWriter::create(&path, spec)
            .with_context(|| format!("failed to create {}", path.display()))?;
        for &sample in pcm {
            writer.write_sample(sample)?;
        }
        writer.finalize().context("failed to finalize WAV")?;
        Ok(())
    })();

    if let Err(err) = result {
        let _ = std::fs::remove_file(&path);
        return Err(err);
    }
    Ok(path)
}

/// Session driver for an arbitrary chunk source. The hardware engine wraps
/// this with a real microphone stream; tests feed it scripted chunks.
#[cfg(test)]
pub(super) fn capture_from_source(
    cfg: &CaptureConfig,
    source: &mut dyn ChunkSource,
    stop: &dyn Fn() -> bool,
    level: &mut dyn FnMut(f32),
) -> CaptureOutcome {
    let outcome = (|| {
        if stop() {
            return CaptureOutcome::ManualStop;
        }
        let calibration = match calibrate(source, cfg) {
            Ok(calibration) => calibration,
            Err(err) => {
                return CaptureOutcome::CaptureError(CaptureError::Device(format!("{err:#}")))
            }
        };
        let mut session = SessionContext::new(cfg, calibration.threshold);
        match run_session(source, &mut session, stop, level) {
            Ok(reason) => settle_session(cfg, session, reason),
            Err(err) => CaptureOutcome::CaptureError(CaptureError::Device(format!("{err:#}"))),
        }
    })();
    level(0.0);
    outcome
}
