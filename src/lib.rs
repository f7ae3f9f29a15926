//! Voice activity capture and preprocessing engine for dictation pipelines.
//!
//! Records microphone audio in fixed 100 ms chunks, decides when speech
//! starts and ends using an energy threshold calibrated against ambient
//! noise, and cleans the accepted utterance (denoise, band-limit,
//! normalize) before writing it as a 16 kHz mono WAV artifact for a
//! downstream transcription stage. Transcription, clipboard injection,
//! hotkeys and UI all live outside this crate; they talk to the engine
//! through [`AudioCaptureEngine::capture`] and the narrow stop-predicate /
//! level-sink callbacks.

pub mod audio;
pub mod config;
mod telemetry;

pub use audio::{
    play_cue, AudioCaptureEngine, AudioChunk, CaptureError, CaptureOutcome, ChunkSource, Cue,
    LiveMeter, Microphone, StopReason,
};
pub use config::CaptureConfig;
pub use telemetry::init_tracing;
