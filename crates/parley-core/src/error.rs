//! Error types for the negotiation coach core.

use thiserror::Error;

/// Result type alias for coach operations.
pub type CoachResult<T> = Result<T, CoachError>;

/// Errors that can occur in the session pipeline.
///
/// Every external-service failure carries the service's own message; none of
/// them are retried automatically. A turn-level failure leaves the session
/// active so the user can retry the continue action.
#[derive(Error, Debug)]
pub enum CoachError {
    #[error("Audio capture error: {0}")]
    Capture(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Emotion classification error: {0}")]
    Classification(String),

    #[error("Response generation error: {0}")]
    Generation(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Session state error: {0}")]
    State(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
