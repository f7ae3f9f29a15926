//! Capture state machine: decides, chunk by chunk, when a recording ends.
//!
//! One [`SessionContext`] is built per capture call and discarded with the
//! session; no state survives between recordings except the engine config.

use super::chunk::{AudioChunk, ChunkSource};
use crate::config::CaptureConfig;
use anyhow::{Context, Result};
use tracing::warn;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum CaptureState {
    AwaitingSpeech,
    SpeechActive,
    TrailingSilence,
}

/// Why the capture loop stopped reading chunks.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StopReason {
    SilenceTimeout,
    ManualStop,
    MaxDurationReached,
}

impl StopReason {
    pub fn label(&self) -> &'static str {
        match self {
            StopReason::SilenceTimeout => "silence_timeout",
            StopReason::ManualStop => "manual_stop",
            StopReason::MaxDurationReached => "max_duration",
        }
    }
}

/// What the session amounts to once the loop has stopped. The acceptance
/// gates run for every stop reason, so a manual stop with too little
/// speech is still rejected rather than treated as success.
#[derive(Debug)]
pub(super) enum SessionVerdict {
    Accepted { samples: Vec<i16>, elapsed_ms: u64 },
    NoSpeech,
    TooShort,
}

/// Per-session mutable state: the accumulated utterance, the VAD state and
/// the two clocks (total elapsed, trailing silence).
pub(super) struct SessionContext {
    threshold: f32,
    chunk_ms: u64,
    max_duration_ms: u64,
    min_duration_ms: u64,
    trailing_silence_ms: u64,
    state: CaptureState,
    utterance: Vec<i16>,
    speech_detected: bool,
    silence_streak_ms: u64,
    elapsed_ms: u64,
}

impl SessionContext {
    pub(super) fn new(cfg: &CaptureConfig, threshold: f32) -> Self {
        Self {
            threshold,
            chunk_ms: cfg.chunk_ms,
            max_duration_ms: cfg.max_duration_ms,
            min_duration_ms: cfg.min_duration_ms,
            trailing_silence_ms: cfg.trailing_silence_ms,
            state: CaptureState::AwaitingSpeech,
            utterance: Vec::new(),
            speech_detected: false,
            silence_streak_ms: 0,
            elapsed_ms: 0,
        }
    }

    /// Apply the transition rules to one chunk. Every chunk is recorded;
    /// the decision only concerns the timers and the terminal state.
    ///
    /// Pre-speech silence never feeds the trailing-silence clock, but it
    /// does count toward the max-duration budget, so silence before the
    /// first word eats into the 60 s cap.
    pub(super) fn on_chunk(&mut self, chunk: &AudioChunk, rms: f32) -> Option<StopReason> {
        self.utterance.extend_from_slice(chunk.samples());

        if rms > self.threshold {
            self.state = CaptureState::SpeechActive;
            self.speech_detected = true;
            self.silence_streak_ms = 0;
        } else if self.state != CaptureState::AwaitingSpeech {
            self.state = CaptureState::TrailingSilence;
            self.silence_streak_ms = self.silence_streak_ms.saturating_add(self.chunk_ms);
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(self.chunk_ms);

        if self.state == CaptureState::TrailingSilence
            && self.silence_streak_ms >= self.trailing_silence_ms
        {
            return Some(StopReason::SilenceTimeout);
        }
        if self.elapsed_ms >= self.max_duration_ms {
            return Some(StopReason::MaxDurationReached);
        }
        None
    }

    /// Evaluate the acceptance gates and hand the utterance over, or
    /// discard it. Ordering matters: the speech gate is checked before
    /// the duration gate so an all-silence session reads as "no speech"
    /// rather than "too short".
    pub(super) fn finish(self) -> SessionVerdict {
        if !self.speech_detected {
            return SessionVerdict::NoSpeech;
        }
        if self.elapsed_ms < self.min_duration_ms {
            return SessionVerdict::TooShort;
        }
        SessionVerdict::Accepted {
            samples: self.utterance,
            elapsed_ms: self.elapsed_ms,
        }
    }

    pub(super) fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub(super) fn speech_detected(&self) -> bool {
        self.speech_detected
    }
}

/// Drive the state machine against a blocking chunk source until it stops.
///
/// The stop predicate is polled once per chunk boundary, before the next
/// blocking read, so an in-flight read always completes before a manual
/// stop is observed. The level sink gets every chunk's RMS in capture
/// order; the final 0.0 reset is the caller's responsibility so it happens
/// exactly once per session on every exit path.
pub(super) fn run_session(
    source: &mut dyn ChunkSource,
    session: &mut SessionContext,
    stop_requested: &dyn Fn() -> bool,
    level: &mut dyn FnMut(f32),
) -> Result<StopReason> {
    loop {
        if stop_requested() {
            return Ok(StopReason::ManualStop);
        }
        let (chunk, overflow) = source.read_chunk().context("audio stream read failed")?;
        if overflow {
            warn!(elapsed_ms = session.elapsed_ms(), "input overflow, frames dropped");
        }
        let rms = chunk.rms();
        level(rms);
        if let Some(reason) = session.on_chunk(&chunk, rms) {
            return Ok(reason);
        }
    }
}
