//! # Parley Core - negotiation session engine
//!
//! Drives one practice negotiation at a time through a fixed turn pipeline
//! and scores the transcript when the session ends.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Session Machine                         │
//! │  ┌─────────┐  ┌────────────┐  ┌─────────┐  ┌────────────┐    │
//! │  │ Capture │→ │ Transcribe │→ │ Emotion │→ │  Respond   │    │
//! │  └─────────┘  └────────────┘  └─────────┘  └─────┬──────┘    │
//! │                                                  ↓           │
//! │  ┌──────────────┐   ┌──────────┐          ┌────────────┐     │
//! │  │ Session Log  │ ← │ Feedback │ ← end ←  │ Synthesize │     │
//! │  │   (JSONL)    │   │ Scoring  │          │  + Play    │     │
//! │  └──────────────┘   └──────────┘          └────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The speech stages are trait contracts (implemented by `parley-voice`);
//! everything here is synchronous and single-user.

pub mod adapters;
pub mod config;
pub mod error;
pub mod feedback;
pub mod llm;
pub mod model;
pub mod report;
pub mod session;
pub mod store;

pub use adapters::{
    CapturedAudio, EmotionClassifier, PlaceholderClassifier, PlaceholderResponder,
    PlaceholderTranscriber, NullSynthesizer, ResponseGenerator, ScriptedCapture, SpeechCapture,
    SpeechSynthesizer, Transcriber,
};
pub use config::CoachConfig;
pub use error::{CoachError, CoachResult};
pub use feedback::{Feedback, FeedbackScore};
pub use llm::{ApiEmotionClassifier, ApiResponseGenerator, ChatClient};
pub use model::{Conversation, ConversationStyle, SessionRecord, Turn};
pub use report::render_report;
pub use session::{SessionMachine, TurnPipeline};
pub use store::SessionStore;
