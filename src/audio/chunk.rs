use super::meter;
use anyhow::Result;

/// One fixed-duration block of mono 16-bit PCM, immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    samples: Vec<i16>,
}

impl AudioChunk {
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// RMS energy with samples normalized to [-1.0, 1.0]; exactly 0.0 for
    /// silent or empty chunks.
    pub fn rms(&self) -> f32 {
        meter::rms_i16(&self.samples)
    }
}

/// Blocking source of capture chunks. `read_chunk` returns the next chunk
/// in capture order plus an overflow flag that is true when the producer
/// dropped frames since the previous read. The blocking read is the
/// session loop's pacing mechanism; implementations must not busy-wait.
pub trait ChunkSource {
    fn read_chunk(&mut self) -> Result<(AudioChunk, bool)>;
}
