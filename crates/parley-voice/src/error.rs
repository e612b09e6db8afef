//! Error types for the voice layer.

use parley_core::CoachError;
use thiserror::Error;

/// Result type alias for voice operations.
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Errors that can occur capturing, transcribing, or speaking audio.
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Audio channel closed: {0}")]
    ChannelClosed(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("STT error: {0}")]
    Stt(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<cpal::DevicesError> for VoiceError {
    fn from(err: cpal::DevicesError) -> Self {
        VoiceError::AudioDevice(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for VoiceError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        VoiceError::AudioDevice(err.to_string())
    }
}

impl From<cpal::BuildStreamError> for VoiceError {
    fn from(err: cpal::BuildStreamError) -> Self {
        VoiceError::AudioStream(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for VoiceError {
    fn from(err: cpal::PlayStreamError) -> Self {
        VoiceError::AudioStream(err.to_string())
    }
}

/// Map voice failures onto the pipeline's error classes: everything on the
/// input path is a capture failure, STT is transcription, TTS and playback
/// are synthesis.
impl From<VoiceError> for CoachError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::AudioDevice(m)
            | VoiceError::AudioStream(m)
            | VoiceError::ChannelClosed(m)
            | VoiceError::Capture(m) => CoachError::Capture(m),
            VoiceError::Stt(m) => CoachError::Transcription(m),
            VoiceError::Tts(m) | VoiceError::Playback(m) => CoachError::Synthesis(m),
            VoiceError::Config(m) => CoachError::Config(m),
            VoiceError::Io(e) => CoachError::Capture(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_class_errors_map_to_capture() {
        for err in [
            VoiceError::AudioDevice("no mic".to_string()),
            VoiceError::AudioStream("stream died".to_string()),
            VoiceError::ChannelClosed("sender dropped".to_string()),
            VoiceError::Capture("closed early".to_string()),
        ] {
            assert!(matches!(CoachError::from(err), CoachError::Capture(_)));
        }
    }

    #[test]
    fn stt_and_tts_map_to_their_pipeline_stages() {
        assert!(matches!(
            CoachError::from(VoiceError::Stt("503".to_string())),
            CoachError::Transcription(_)
        ));
        assert!(matches!(
            CoachError::from(VoiceError::Tts("503".to_string())),
            CoachError::Synthesis(_)
        ));
        assert!(matches!(
            CoachError::from(VoiceError::Playback("no sink".to_string())),
            CoachError::Synthesis(_)
        ));
    }
}
