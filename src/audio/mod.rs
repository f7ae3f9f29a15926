//! Audio capture, voice activity detection and utterance cleanup.
//!
//! The microphone is read in fixed 100 ms chunks via CPAL; each chunk is
//! classified against a noise-calibrated energy threshold and fed through
//! the capture state machine, which decides when the utterance ends. The
//! accepted buffer is then denoised, band-limited and normalized before it
//! is written out as a WAV artifact.

mod capture;
mod chunk;
mod cues;
mod denoise;
mod device;
mod dispatch;
mod engine;
mod filters;
mod meter;
mod normalize;
mod resample;
mod vad;

pub use capture::StopReason;
pub use chunk::{AudioChunk, ChunkSource};
pub use cues::{play_cue, Cue};
pub use device::Microphone;
pub use engine::{AudioCaptureEngine, CaptureError, CaptureOutcome};
pub use meter::LiveMeter;
pub use vad::CalibrationResult;
