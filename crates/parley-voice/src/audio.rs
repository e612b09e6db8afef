//! Microphone capture: fixed-size PCM16 chunks pulled from a cpal stream.
//!
//! The cpal callback accumulates samples into chunks and hands them to a
//! channel; [`MicSource`] exposes the receiving end as a pull-based
//! [`ChunkSource`] so the endpointer can be driven by a synthetic sequence
//! in tests.

use crate::error::{VoiceError, VoiceResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use std::sync::mpsc;
use tracing::{info, warn};

/// Capture parameters: 16 kHz mono in 1024-sample chunks (64 ms).
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub chunk_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            chunk_size: 1024,
        }
    }
}

/// One fixed-size block of PCM16 samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub samples: Vec<i16>,
}

/// Pull-based supplier of audio chunks. `Ok(None)` means the source is
/// closed and no more audio will arrive.
pub trait ChunkSource {
    fn next_chunk(&mut self) -> VoiceResult<Option<AudioChunk>>;
    fn sample_rate(&self) -> u32;
    fn chunk_size(&self) -> usize;
}

/// Live microphone input via cpal. The stream keeps capturing for as long
/// as the source is alive; chunks queue in the channel between pulls.
pub struct MicSource {
    config: CaptureConfig,
    rx: mpsc::Receiver<AudioChunk>,
    _stream: Stream,
}

impl MicSource {
    /// Open the default input device and start the capture stream.
    pub fn open(config: CaptureConfig) -> VoiceResult<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| VoiceError::AudioDevice("no input device available".to_string()))?;
        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate = config.sample_rate,
            "opening microphone"
        );

        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.chunk_size as u32),
        };

        let (tx, rx) = mpsc::channel::<AudioChunk>();
        let chunk_size = config.chunk_size;
        let mut sample_buffer: Vec<i16> = Vec::with_capacity(chunk_size);

        let stream = device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for &sample in data {
                    sample_buffer.push((sample.clamp(-1.0, 1.0) * 32767.0) as i16);
                    if sample_buffer.len() >= chunk_size {
                        let chunk = AudioChunk {
                            samples: std::mem::replace(
                                &mut sample_buffer,
                                Vec::with_capacity(chunk_size),
                            ),
                        };
                        if tx.send(chunk).is_err() {
                            // receiver dropped; the stream is being torn down
                            return;
                        }
                    }
                }
            },
            move |err| {
                warn!("audio stream error: {err}");
            },
            None,
        )?;
        stream.play()?;

        Ok(Self {
            config,
            rx,
            _stream: stream,
        })
    }
}

impl ChunkSource for MicSource {
    fn next_chunk(&mut self) -> VoiceResult<Option<AudioChunk>> {
        match self.rx.recv() {
            Ok(chunk) => Ok(Some(chunk)),
            // stream dropped its sender: treat as end of audio
            Err(mpsc::RecvError) => Ok(None),
        }
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }
}
