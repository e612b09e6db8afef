//! # Parley Voice - speech I/O for the negotiation coach
//!
//! Implements the speech contracts of `parley-core`:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  ┌──────────┐   ┌──────────────┐   ┌────────────────┐   │
//! │  │ Mic      │ → │  Endpointer  │ → │ WhisperApiStt  │   │
//! │  │ (cpal)   │   │ (RMS energy) │   │ (HTTP)         │   │
//! │  └──────────┘   └──────────────┘   └────────────────┘   │
//! │                                                         │
//! │  ┌──────────┐   ┌──────────────┐                        │
//! │  │ ApiTts   │ → │   Speaker    │                        │
//! │  │ (HTTP)   │   │   (rodio)    │                        │
//! │  └──────────┘   └──────────────┘                        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Capture is a pull loop over fixed-size PCM16 chunks; the endpointer
//! commits the utterance after two seconds of silence once speech has been
//! heard, or at the duration cap if it never is.

pub mod audio;
pub mod endpoint;
pub mod error;
pub mod stt;
pub mod tts;

pub use audio::{AudioChunk, CaptureConfig, ChunkSource, MicSource};
pub use endpoint::{EndpointConfig, EndpointState, Endpointer, Recorder};
pub use error::{VoiceError, VoiceResult};
pub use stt::WhisperApiStt;
pub use tts::{ApiTts, Speaker, VoiceSynthesizer};
