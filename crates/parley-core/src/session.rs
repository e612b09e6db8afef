//! Session lifecycle and the turn-processing pipeline.
//!
//! One negotiation is active at a time. Starting a session runs its first
//! turn immediately; `continue` runs another; `end` freezes the transcript,
//! scores it, and appends the record to the session log. Any stage failure
//! aborts only the current turn; the session stays active and the user
//! decides whether to try again.

use crate::adapters::{
    EmotionClassifier, ResponseGenerator, SpeechCapture, SpeechSynthesizer, Transcriber,
};
use crate::error::{CoachError, CoachResult};
use crate::feedback::Feedback;
use crate::model::{Conversation, ConversationStyle, SessionRecord, Turn};
use crate::store::SessionStore;
use chrono::Local;
use tracing::{debug, info, warn};

/// The five stages of a turn, wired together by the composition root.
pub struct TurnPipeline {
    pub capture: Box<dyn SpeechCapture>,
    pub transcriber: Box<dyn Transcriber>,
    pub classifier: Box<dyn EmotionClassifier>,
    pub responder: Box<dyn ResponseGenerator>,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
}

impl TurnPipeline {
    /// Run one full turn: capture → transcribe → classify → respond → speak.
    ///
    /// Strictly sequential, no retries. A synthesis failure is logged and the
    /// turn still stands; every other failure propagates and nothing is
    /// recorded.
    pub fn run_turn(
        &mut self,
        scenario: &str,
        style: ConversationStyle,
    ) -> CoachResult<Turn> {
        let audio = self.capture.capture_turn()?;
        debug!(
            samples = audio.samples.len(),
            seconds = audio.duration_secs(),
            "captured utterance"
        );

        let user_text = self.transcriber.transcribe(&audio)?;
        if user_text.trim().is_empty() {
            return Err(CoachError::Transcription(
                "transcription returned empty text".to_string(),
            ));
        }
        info!(%user_text, "transcribed");

        let emotion = self.classifier.classify(&user_text)?;
        info!(%emotion, "classified user tone");

        let ai_text = self
            .responder
            .respond(scenario, style, &emotion, &user_text)?;

        if let Err(e) = self.synthesizer.speak(&ai_text) {
            warn!("speech synthesis failed, turn is still recorded: {e}");
        }

        Ok(Turn {
            user: user_text,
            ai: ai_text,
        })
    }
}

struct ActiveSession {
    scenario: String,
    style: ConversationStyle,
    conversation: Conversation,
}

enum Phase {
    NotStarted,
    Active(ActiveSession),
}

/// Lifecycle state machine: NotStarted → Active → (end: score, persist,
/// reset). The just-ended record stays visible for display and export until
/// a new session starts or a prior one is loaded.
pub struct SessionMachine {
    phase: Phase,
    last_completed: Option<SessionRecord>,
    loaded: Option<SessionRecord>,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            phase: Phase::NotStarted,
            last_completed: None,
            loaded: None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active(_))
    }

    /// Scenario of the active session, if one is in progress.
    pub fn scenario(&self) -> Option<&str> {
        match &self.phase {
            Phase::Active(s) => Some(&s.scenario),
            Phase::NotStarted => None,
        }
    }

    /// Transcript of the active session, if one is in progress.
    pub fn conversation(&self) -> Option<&Conversation> {
        match &self.phase {
            Phase::Active(s) => Some(&s.conversation),
            Phase::NotStarted => None,
        }
    }

    /// The record to display or export when no session is active: an
    /// explicitly loaded session wins over the one that just ended.
    pub fn current_record(&self) -> Option<&SessionRecord> {
        self.loaded.as_ref().or(self.last_completed.as_ref())
    }

    /// Begin a negotiation and run its first turn, as a single user action.
    /// The session becomes active before the turn runs, so a first-turn
    /// failure leaves an active session with an empty transcript that the
    /// user can retry into.
    pub fn start(
        &mut self,
        scenario: impl Into<String>,
        style: ConversationStyle,
        pipeline: &mut TurnPipeline,
    ) -> CoachResult<&Turn> {
        if self.is_active() {
            return Err(CoachError::State(
                "a negotiation is already in progress; end it first".to_string(),
            ));
        }
        let scenario = scenario.into();
        info!(%scenario, %style, "negotiation started");
        self.loaded = None;
        self.last_completed = None;
        self.phase = Phase::Active(ActiveSession {
            scenario,
            style,
            conversation: Conversation::new(),
        });
        self.continue_turn(pipeline)
    }

    /// Run one more turn of the active session. On failure the transcript is
    /// untouched and the session remains active.
    pub fn continue_turn(&mut self, pipeline: &mut TurnPipeline) -> CoachResult<&Turn> {
        let Phase::Active(session) = &mut self.phase else {
            return Err(CoachError::State(
                "no negotiation in progress; start one first".to_string(),
            ));
        };
        let turn = pipeline.run_turn(&session.scenario, session.style)?;
        session.conversation.push(turn);
        // push succeeded, so last() is present
        session
            .conversation
            .last()
            .ok_or_else(|| CoachError::State("conversation empty after push".to_string()))
    }

    /// End the active session: score the frozen transcript, stamp and
    /// persist the record, and reset for the next negotiation. A failed
    /// append is a warning; the record survives in memory and is returned.
    pub fn end(&mut self, store: &SessionStore) -> CoachResult<&SessionRecord> {
        let Phase::Active(session) = std::mem::replace(&mut self.phase, Phase::NotStarted)
        else {
            return Err(CoachError::State(
                "no negotiation in progress; nothing to end".to_string(),
            ));
        };
        let feedback = Feedback::from_conversation(&session.conversation, &session.scenario);
        let record = SessionRecord {
            scenario: session.scenario,
            style: session.style,
            conversation: session.conversation,
            feedback,
            timestamp: Local::now().naive_local(),
        };
        if let Err(e) = store.append(&record) {
            warn!("failed to persist session, keeping it in memory: {e}");
        }
        info!(
            turns = record.conversation.len(),
            total = record.feedback.score.total,
            "negotiation ended"
        );
        Ok(self.last_completed.insert(record))
    }

    /// Install a previously persisted session for display/export. Refused
    /// while a negotiation is active.
    pub fn load(&mut self, record: SessionRecord) -> CoachResult<()> {
        if self.is_active() {
            return Err(CoachError::State(
                "cannot load a past session while a negotiation is in progress".to_string(),
            ));
        }
        info!(label = %record.label(), "loaded past session");
        self.loaded = Some(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        CapturedAudio, NullSynthesizer, PlaceholderClassifier, PlaceholderTranscriber,
        ScriptedCapture,
    };
    use std::collections::VecDeque;

    fn utterance() -> CapturedAudio {
        CapturedAudio {
            samples: vec![0; 1600],
            sample_rate: 16000,
        }
    }

    struct ScriptedTranscriber {
        lines: std::cell::RefCell<VecDeque<CoachResult<String>>>,
    }

    impl ScriptedTranscriber {
        fn new(lines: impl IntoIterator<Item = CoachResult<String>>) -> Self {
            Self {
                lines: std::cell::RefCell::new(lines.into_iter().collect()),
            }
        }
    }

    impl Transcriber for ScriptedTranscriber {
        fn transcribe(&self, _audio: &CapturedAudio) -> CoachResult<String> {
            self.lines
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok("more talk".to_string()))
        }
    }

    struct EchoResponder;

    impl ResponseGenerator for EchoResponder {
        fn respond(
            &self,
            _scenario: &str,
            _style: ConversationStyle,
            _emotion: &str,
            user_text: &str,
        ) -> CoachResult<String> {
            Ok(format!("counter to: {user_text}"))
        }
    }

    struct FailingSynthesizer;

    impl SpeechSynthesizer for FailingSynthesizer {
        fn speak(&self, _text: &str) -> CoachResult<()> {
            Err(CoachError::Synthesis("no audio device".to_string()))
        }
    }

    fn pipeline_with(
        captures: usize,
        transcriber: Box<dyn Transcriber>,
        synthesizer: Box<dyn SpeechSynthesizer>,
    ) -> TurnPipeline {
        TurnPipeline {
            capture: Box::new(ScriptedCapture::new(
                std::iter::repeat_with(utterance).take(captures),
            )),
            transcriber,
            classifier: Box::new(PlaceholderClassifier),
            responder: Box::new(EchoResponder),
            synthesizer,
        }
    }

    fn working_pipeline(captures: usize) -> TurnPipeline {
        pipeline_with(
            captures,
            Box::new(PlaceholderTranscriber::with_response("I want a raise")),
            Box::new(NullSynthesizer),
        )
    }

    fn temp_store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("sessions.json"));
        (dir, store)
    }

    #[test]
    fn start_runs_first_turn() {
        let mut machine = SessionMachine::new();
        let mut pipeline = working_pipeline(1);
        let turn = machine
            .start("salary negotiation", ConversationStyle::Neutral, &mut pipeline)
            .unwrap();
        assert_eq!(turn.user, "I want a raise");
        assert_eq!(turn.ai, "counter to: I want a raise");
        assert!(machine.is_active());
        assert_eq!(machine.conversation().unwrap().len(), 1);
    }

    #[test]
    fn start_while_active_is_refused() {
        let mut machine = SessionMachine::new();
        let mut pipeline = working_pipeline(2);
        machine
            .start("salary", ConversationStyle::Neutral, &mut pipeline)
            .unwrap();
        let err = machine
            .start("another", ConversationStyle::Neutral, &mut pipeline)
            .unwrap_err();
        assert!(matches!(err, CoachError::State(_)));
        assert_eq!(machine.conversation().unwrap().len(), 1);
    }

    #[test]
    fn continue_without_session_is_refused() {
        let mut machine = SessionMachine::new();
        let mut pipeline = working_pipeline(1);
        assert!(matches!(
            machine.continue_turn(&mut pipeline),
            Err(CoachError::State(_))
        ));
    }

    #[test]
    fn failing_transcription_aborts_turn_but_not_session() {
        let mut machine = SessionMachine::new();
        let mut pipeline = working_pipeline(1);
        machine
            .start("salary", ConversationStyle::Neutral, &mut pipeline)
            .unwrap();

        let mut failing = pipeline_with(
            1,
            Box::new(ScriptedTranscriber::new([Err(CoachError::Transcription(
                "service unavailable".to_string(),
            ))])),
            Box::new(NullSynthesizer),
        );
        let err = machine.continue_turn(&mut failing).unwrap_err();
        assert!(matches!(err, CoachError::Transcription(_)));
        assert!(machine.is_active());
        assert_eq!(machine.conversation().unwrap().len(), 1);
    }

    #[test]
    fn empty_transcription_fails_the_turn() {
        let mut machine = SessionMachine::new();
        let mut pipeline = pipeline_with(
            1,
            Box::new(PlaceholderTranscriber::with_response("   ")),
            Box::new(NullSynthesizer),
        );
        let err = machine
            .start("salary", ConversationStyle::Neutral, &mut pipeline)
            .unwrap_err();
        assert!(matches!(err, CoachError::Transcription(_)));
        // start is atomic with its first turn, but the session itself is
        // already active so the user can retry with continue
        assert!(machine.is_active());
        assert!(machine.conversation().unwrap().is_empty());
    }

    #[test]
    fn synthesis_failure_still_records_the_turn() {
        let mut machine = SessionMachine::new();
        let mut pipeline = pipeline_with(
            1,
            Box::new(PlaceholderTranscriber::with_response("hello")),
            Box::new(FailingSynthesizer),
        );
        let turn = machine
            .start("salary", ConversationStyle::Neutral, &mut pipeline)
            .unwrap();
        assert_eq!(turn.user, "hello");
        assert_eq!(machine.conversation().unwrap().len(), 1);
    }

    #[test]
    fn end_scores_persists_and_resets() {
        let (_dir, store) = temp_store();
        let mut machine = SessionMachine::new();
        let mut pipeline = working_pipeline(2);
        machine
            .start("salary negotiation", ConversationStyle::Collaborative, &mut pipeline)
            .unwrap();
        machine.continue_turn(&mut pipeline).unwrap();

        let record = machine.end(&store).unwrap();
        assert_eq!(record.conversation.len(), 2);
        assert_eq!(record.scenario, "salary negotiation");
        let expected_total =
            (record.feedback.score.clarity + record.feedback.score.persuasiveness) / 2.0;
        assert!((record.feedback.score.total - expected_total).abs() < 1e-12);

        assert!(!machine.is_active());
        assert!(machine.current_record().is_some());

        let persisted = store.load_all().unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0], *machine.current_record().unwrap());
    }

    #[test]
    fn end_with_empty_conversation_is_valid() {
        let (_dir, store) = temp_store();
        let mut machine = SessionMachine::new();
        // force an active session whose only turn failed
        let mut failing = pipeline_with(
            1,
            Box::new(ScriptedTranscriber::new([Err(CoachError::Transcription(
                "down".to_string(),
            ))])),
            Box::new(NullSynthesizer),
        );
        let _ = machine.start("salary", ConversationStyle::Neutral, &mut failing);
        assert!(machine.is_active());

        let record = machine.end(&store).unwrap();
        assert!(record.conversation.is_empty());
        assert_eq!(record.feedback.score.total, 0.0);
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn end_without_session_is_refused() {
        let (_dir, store) = temp_store();
        let mut machine = SessionMachine::new();
        assert!(matches!(machine.end(&store), Err(CoachError::State(_))));
    }

    #[test]
    fn persistence_failure_keeps_record_in_memory() {
        // a store pointed at an unwritable path: append fails, end still succeeds
        let store = SessionStore::new("/proc/definitely/not/writable/sessions.json");
        let mut machine = SessionMachine::new();
        let mut pipeline = working_pipeline(1);
        machine
            .start("salary", ConversationStyle::Neutral, &mut pipeline)
            .unwrap();
        let record = machine.end(&store).unwrap();
        assert_eq!(record.conversation.len(), 1);
        assert!(machine.current_record().is_some());
    }

    #[test]
    fn loaded_session_wins_over_last_completed() {
        let (_dir, store) = temp_store();
        let mut machine = SessionMachine::new();
        let mut pipeline = working_pipeline(1);
        machine
            .start("first", ConversationStyle::Neutral, &mut pipeline)
            .unwrap();
        machine.end(&store).unwrap();

        let mut past = store.load_all().unwrap().remove(0);
        past.scenario = "loaded one".to_string();
        machine.load(past).unwrap();
        assert_eq!(machine.current_record().unwrap().scenario, "loaded one");
    }

    #[test]
    fn starting_new_session_clears_displayed_record() {
        let (_dir, store) = temp_store();
        let mut machine = SessionMachine::new();
        let mut pipeline = working_pipeline(2);
        machine
            .start("first", ConversationStyle::Neutral, &mut pipeline)
            .unwrap();
        machine.end(&store).unwrap();
        assert!(machine.current_record().is_some());

        machine
            .start("second", ConversationStyle::Neutral, &mut pipeline)
            .unwrap();
        assert!(machine.current_record().is_none());
        assert_eq!(machine.scenario(), Some("second"));
    }

    #[test]
    fn load_while_active_is_refused() {
        let (_dir, store) = temp_store();
        let mut machine = SessionMachine::new();
        let mut pipeline = working_pipeline(2);
        machine
            .start("first", ConversationStyle::Neutral, &mut pipeline)
            .unwrap();
        machine.end(&store).unwrap();
        let past = store.load_all().unwrap().remove(0);

        machine
            .start("second", ConversationStyle::Neutral, &mut pipeline)
            .unwrap();
        assert!(matches!(machine.load(past), Err(CoachError::State(_))));
    }
}
