//! Runtime configuration, read from the environment once at startup.
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | PARLEY_API_URL | https://api.openai.com/v1 | Base URL for all OpenAI-compatible calls. |
//! | PARLEY_API_KEY / OPENAI_API_KEY | (unset) | Bearer key; without it the placeholders run. |
//! | PARLEY_CHAT_MODEL | gpt-4 | Chat model for emotion + responses. |
//! | PARLEY_STT_MODEL | whisper-1 | Transcription model. |
//! | PARLEY_TTS_MODEL | tts-1 | Speech synthesis model. |
//! | PARLEY_TTS_VOICE | alloy | Synthesis voice. |
//! | PARLEY_SESSION_LOG | negotiation_sessions.json | Session log path. |
//!
//! Only the composition root calls [`CoachConfig::from_env`]; everything
//! downstream receives the struct.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CoachConfig {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub stt_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub session_log: PathBuf,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            chat_model: "gpt-4".to_string(),
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            session_log: PathBuf::from("negotiation_sessions.json"),
        }
    }
}

impl CoachConfig {
    /// Load from environment. Unset or empty values fall back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env_string("PARLEY_API_URL", &defaults.api_base_url),
            api_key: env_opt_string("PARLEY_API_KEY")
                .or_else(|| env_opt_string("OPENAI_API_KEY")),
            chat_model: env_string("PARLEY_CHAT_MODEL", &defaults.chat_model),
            stt_model: env_string("PARLEY_STT_MODEL", &defaults.stt_model),
            tts_model: env_string("PARLEY_TTS_MODEL", &defaults.tts_model),
            tts_voice: env_string("PARLEY_TTS_VOICE", &defaults.tts_voice),
            session_log: env_opt_string("PARLEY_SESSION_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_log),
        }
    }
}

fn env_opt_string(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn env_string(key: &str, default: &str) -> String {
    env_opt_string(key).unwrap_or_else(|| default.to_string())
}
