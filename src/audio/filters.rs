//! Band-limiting filters for the cleanup pipeline.
//!
//! Third-order Butterworth responses realized as cascaded low-order
//! sections: one biquad (RBJ cookbook coefficients, Q = 1.0 places the
//! conjugate pole pair on the Butterworth circle) plus one first-order
//! stage. Applied forward-only over the whole utterance; zero-phase is
//! not needed for speech-to-text input.

use std::f32::consts::PI;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum FilterKind {
    HighPass,
    LowPass,
}

/// One second-order section in transposed direct form II. First-order
/// stages reuse the same struct with b2 = a2 = 0.
#[derive(Debug, Clone)]
struct Section {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Section {
    fn biquad(kind: FilterKind, cutoff_hz: f32, sample_rate: u32, q: f32) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate as f32;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);
        let a0 = 1.0 + alpha;

        let (b0, b1, b2) = match kind {
            FilterKind::LowPass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterKind::HighPass => {
                let b1 = -(1.0 + cos_w0);
                (-b1 / 2.0, b1, -b1 / 2.0)
            }
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    fn first_order(kind: FilterKind, cutoff_hz: f32, sample_rate: u32) -> Self {
        // Bilinear transform of the analog one-pole prototype.
        let k = (PI * cutoff_hz / sample_rate as f32).tan();
        let a0 = k + 1.0;
        let (b0, b1) = match kind {
            FilterKind::LowPass => (k / a0, k / a0),
            FilterKind::HighPass => (1.0 / a0, -1.0 / a0),
        };
        Self {
            b0,
            b1,
            b2: 0.0,
            a1: (k - 1.0) / a0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    fn process_sample(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// The fixed filter sequence applied to a full utterance: high-pass to
/// strip rumble below the voice band, low-pass to strip hiss above it.
pub(super) struct FilterChain {
    sections: Vec<Section>,
}

impl FilterChain {
    pub(super) fn band_limit(sample_rate: u32, highpass_hz: f32, lowpass_hz: f32) -> Self {
        Self {
            sections: vec![
                Section::biquad(FilterKind::HighPass, highpass_hz, sample_rate, 1.0),
                Section::first_order(FilterKind::HighPass, highpass_hz, sample_rate),
                Section::biquad(FilterKind::LowPass, lowpass_hz, sample_rate, 1.0),
                Section::first_order(FilterKind::LowPass, lowpass_hz, sample_rate),
            ],
        }
    }

    /// Run every section over the buffer in place. Section state is reset
    /// at the start of each invocation; nothing carries over between
    /// utterances.
    pub(super) fn process(&mut self, samples: &mut [f32]) {
        for section in &mut self.sections {
            section.reset();
            for sample in samples.iter_mut() {
                *sample = section.process_sample(*sample);
            }
        }
    }
}
