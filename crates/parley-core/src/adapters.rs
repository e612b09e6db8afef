//! Service contracts for the turn pipeline.
//!
//! Each stage of a turn is a trait so the session machine never touches a
//! microphone or an HTTP client directly. `parley-voice` supplies the speech
//! implementations; [`crate::llm`] supplies the language-model ones. The
//! placeholder implementations here keep the pipeline runnable with no API
//! key and drive the session tests.

use crate::error::{CoachError, CoachResult};
use crate::model::ConversationStyle;
use std::collections::VecDeque;

/// One captured utterance: PCM16 mono samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl CapturedAudio {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Records from the microphone, blocking until the speaker has stopped.
pub trait SpeechCapture {
    fn capture_turn(&mut self) -> CoachResult<CapturedAudio>;
}

/// Converts a captured utterance into text.
pub trait Transcriber {
    fn transcribe(&self, audio: &CapturedAudio) -> CoachResult<String>;
}

/// Labels the emotional tone of a piece of text. The label is free-form:
/// whatever short string the classifier returns is accepted as-is.
pub trait EmotionClassifier {
    fn classify(&self, text: &str) -> CoachResult<String>;
}

/// Produces the counterpart's next utterance.
pub trait ResponseGenerator {
    fn respond(
        &self,
        scenario: &str,
        style: ConversationStyle,
        emotion: &str,
        user_text: &str,
    ) -> CoachResult<String>;
}

/// Speaks a reply aloud. Failures here never invalidate the turn.
pub trait SpeechSynthesizer {
    fn speak(&self, text: &str) -> CoachResult<()>;
}

/// Capture double fed from a queue of pre-recorded utterances. Errors once
/// the queue runs dry.
#[derive(Debug, Default)]
pub struct ScriptedCapture {
    queue: VecDeque<CapturedAudio>,
}

impl ScriptedCapture {
    pub fn new(utterances: impl IntoIterator<Item = CapturedAudio>) -> Self {
        Self {
            queue: utterances.into_iter().collect(),
        }
    }
}

impl SpeechCapture for ScriptedCapture {
    fn capture_turn(&mut self) -> CoachResult<CapturedAudio> {
        self.queue
            .pop_front()
            .ok_or_else(|| CoachError::Capture("scripted capture exhausted".to_string()))
    }
}

/// Transcriber that answers with a fixed string, or a description of the
/// audio it was handed when none is set.
#[derive(Debug, Default)]
pub struct PlaceholderTranscriber {
    pub response: Option<String>,
}

impl PlaceholderTranscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(s: impl Into<String>) -> Self {
        Self {
            response: Some(s.into()),
        }
    }
}

impl Transcriber for PlaceholderTranscriber {
    fn transcribe(&self, audio: &CapturedAudio) -> CoachResult<String> {
        if let Some(ref r) = self.response {
            return Ok(r.clone());
        }
        Ok(format!(
            "[transcription placeholder: {} samples, {:.1}s — configure an API key for real speech-to-text]",
            audio.samples.len(),
            audio.duration_secs()
        ))
    }
}

/// Classifier that reports every utterance as neutral.
#[derive(Debug, Default)]
pub struct PlaceholderClassifier;

impl EmotionClassifier for PlaceholderClassifier {
    fn classify(&self, _text: &str) -> CoachResult<String> {
        Ok("neutral".to_string())
    }
}

/// Responder that produces a canned counterpart line without calling any
/// service. Keeps sessions usable for a dry run with no key configured.
#[derive(Debug, Default)]
pub struct PlaceholderResponder;

impl ResponseGenerator for PlaceholderResponder {
    fn respond(
        &self,
        scenario: &str,
        style: ConversationStyle,
        _emotion: &str,
        user_text: &str,
    ) -> CoachResult<String> {
        Ok(format!(
            "[{style} counterpart in \"{scenario}\"] That's an interesting position — \
             you said \"{user_text}\". What would make this work for both of us?"
        ))
    }
}

/// Synthesizer that swallows its input. Used when no TTS backend is wired.
#[derive(Debug, Default)]
pub struct NullSynthesizer;

impl SpeechSynthesizer for NullSynthesizer {
    fn speak(&self, _text: &str) -> CoachResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_transcriber_describes_audio() {
        let audio = CapturedAudio {
            samples: vec![0; 16000],
            sample_rate: 16000,
        };
        let text = PlaceholderTranscriber::new().transcribe(&audio).unwrap();
        assert!(text.contains("16000 samples"));
        assert!(text.contains("1.0s"));
    }

    #[test]
    fn scripted_capture_errors_when_exhausted() {
        let mut capture = ScriptedCapture::new([CapturedAudio {
            samples: vec![1, 2, 3],
            sample_rate: 16000,
        }]);
        assert!(capture.capture_turn().is_ok());
        assert!(matches!(
            capture.capture_turn(),
            Err(CoachError::Capture(_))
        ));
    }

    #[test]
    fn duration_handles_zero_sample_rate() {
        let audio = CapturedAudio {
            samples: vec![0; 100],
            sample_rate: 0,
        };
        assert_eq!(audio.duration_secs(), 0.0);
    }
}
