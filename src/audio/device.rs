//! Microphone access via CPAL.
//!
//! The device keeps its native format and rate; samples are downmixed,
//! converted to f32 and resampled to the engine rate on the way into the
//! session loop, then quantized to i16 chunks.

use super::chunk::{AudioChunk, ChunkSource};
use super::dispatch::ChunkDispatcher;
use super::resample::convert_chunk;
use crate::config::CaptureConfig;
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Audio input device wrapper. Construction picks the device; each capture
/// session opens and closes its own stream.
pub struct Microphone {
    device: cpal::Device,
}

impl Microphone {
    /// Input device names, for an orchestrator-side device picker.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }

    /// Use the named device, or the host default when `preferred` is None.
    pub fn new(preferred: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match preferred {
            Some(name) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow!("input device '{name}' not found"))?
            }
            None => host
                .default_input_device()
                .context("no default input device available")?,
        };
        Ok(Self { device })
    }

    pub fn name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "unknown input device".to_string())
    }

    /// Open a blocking chunk stream for one session. The stream owns the
    /// hardware handle; dropping it releases the device.
    pub(super) fn open_stream(&self, cfg: &CaptureConfig) -> Result<MicStream> {
        let default_config = self
            .device
            .default_input_config()
            .context("failed to query input device config")?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let device_rate = device_config.sample_rate.0;
        let channels = usize::from(device_config.channels.max(1));
        debug!(
            device = %self.name(),
            ?format,
            device_rate,
            channels,
            "opening input stream"
        );

        let device_chunk_samples = ((device_rate as u64 * cfg.chunk_ms) / 1000).max(1) as usize;
        let (sender, receiver) = bounded::<Vec<f32>>(cfg.channel_capacity.max(1));
        let dropped = Arc::new(AtomicUsize::new(0));
        let dispatcher = Arc::new(Mutex::new(ChunkDispatcher::new(
            device_chunk_samples,
            sender,
            dropped.clone(),
        )));

        let err_fn = |err| debug!(%err, "audio stream error");
        let stream = match format {
            SampleFormat::F32 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| sample);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| sample as f32 / 32_768.0);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| {
                                (sample as f32 - 32_768.0) / 32_768.0
                            });
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(anyhow!("unsupported sample format: {other:?}")),
        };

        stream.play().context("failed to start input stream")?;

        // Generous stall timeout: the callback should deliver a chunk every
        // chunk_ms, so 20x that means the device went away.
        let read_timeout = Duration::from_millis((cfg.chunk_ms * 20).max(1_000));

        Ok(MicStream {
            stream,
            receiver,
            dropped,
            last_dropped: 0,
            device_rate,
            target_rate: cfg.sample_rate,
            chunk_samples: cfg.chunk_samples(),
            read_timeout,
        })
    }
}

/// Live input stream for one session. Reads block on the dispatcher
/// channel, which paces the session loop at one chunk per chunk duration.
pub(super) struct MicStream {
    stream: cpal::Stream,
    receiver: Receiver<Vec<f32>>,
    dropped: Arc<AtomicUsize>,
    last_dropped: usize,
    device_rate: u32,
    target_rate: u32,
    chunk_samples: usize,
    read_timeout: Duration,
}

impl ChunkSource for MicStream {
    fn read_chunk(&mut self) -> Result<(AudioChunk, bool)> {
        let frame = match self.receiver.recv_timeout(self.read_timeout) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => {
                return Err(anyhow!(
                    "audio stream stalled; no samples for {:?}",
                    self.read_timeout
                ))
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(anyhow!("audio stream disconnected"))
            }
        };
        let frame = convert_chunk(frame, self.device_rate, self.target_rate, self.chunk_samples);
        let samples = frame
            .iter()
            .map(|&s| (s * 32_768.0).clamp(-32_768.0, 32_767.0) as i16)
            .collect();

        let total_dropped = self.dropped.load(Ordering::Relaxed);
        let overflow = total_dropped > self.last_dropped;
        self.last_dropped = total_dropped;

        Ok((AudioChunk::new(samples), overflow))
    }
}

impl Drop for MicStream {
    fn drop(&mut self) {
        let _ = self.stream.pause();
    }
}
