//! Core data model: turns, conversations, styles, and completed sessions.

use crate::error::CoachError;
use crate::feedback::Feedback;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One exchange: what the user said and what the counterpart answered.
/// Immutable once appended to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    pub ai: String,
}

/// The chat transcript of a session, in strict chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation(Vec<Turn>);

impl Conversation {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, turn: Turn) {
        self.0.push(turn);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.0
    }

    pub fn last(&self) -> Option<&Turn> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.0.iter()
    }
}

/// Tone the counterpart adopts when responding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationStyle {
    Collaborative,
    Aggressive,
    #[default]
    Neutral,
}

impl fmt::Display for ConversationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConversationStyle::Collaborative => "Collaborative",
            ConversationStyle::Aggressive => "Aggressive",
            ConversationStyle::Neutral => "Neutral",
        };
        f.write_str(s)
    }
}

impl FromStr for ConversationStyle {
    type Err = CoachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collaborative" => Ok(ConversationStyle::Collaborative),
            "aggressive" => Ok(ConversationStyle::Aggressive),
            "neutral" => Ok(ConversationStyle::Neutral),
            other => Err(CoachError::Config(format!(
                "unknown conversation style: {other} (expected collaborative, aggressive, or neutral)"
            ))),
        }
    }
}

/// A completed, immutable negotiation session. Only sessions that have been
/// ended (and therefore scored) take this form; it is the unit the session
/// log stores, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub scenario: String,
    pub style: ConversationStyle,
    pub conversation: Conversation,
    pub feedback: Feedback,
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
}

impl SessionRecord {
    /// Short identifier for session pickers: `2026-08-06 14:02:11 - salary negotiation`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.timestamp.format(timestamp::FORMAT), self.scenario)
    }
}

/// Serde adapter pinning the on-disk timestamp format to `YYYY-MM-DD HH:MM:SS`.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}
