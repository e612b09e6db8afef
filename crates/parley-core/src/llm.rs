//! OpenAI-compatible chat-completions client and the two language-model
//! adapters built on it: emotion classification and counterpart response
//! generation.
//!
//! The client is blocking with a bounded timeout; the pipeline runs each
//! stage sequentially and has no use for in-flight concurrency.

use crate::adapters::{EmotionClassifier, ResponseGenerator};
use crate::error::{CoachError, CoachResult};
use crate::model::ConversationStyle;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_CHAT_MODEL: &str = "gpt-4";

const EMOTION_SYSTEM_PROMPT: &str = "Detect the emotional tone of this text.";

/// Token budget for the emotion label; one short word is plenty.
const EMOTION_MAX_TOKENS: u32 = 10;

/// Token budget for the counterpart's reply.
const RESPONSE_MAX_TOKENS: u32 = 150;

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Deserialize)]
struct ChatMessageBody {
    content: String,
}

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    /// Base URL without trailing slash (e.g. https://api.openai.com/v1).
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl ChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: Option<String>,
    ) -> CoachResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CoachError::Config(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            client,
        })
    }

    /// One system+user completion. The error text is wrapped into the proper
    /// pipeline variant by the calling adapter.
    fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String, String> {
        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: None,
            max_tokens: Some(max_tokens),
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().unwrap_or_default();
            return Err(format!("chat API error {status}: {text}"));
        }
        let parsed: ChatResponse = res.json().map_err(|e| e.to_string())?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| "chat API returned no choices".to_string())?;
        Ok(content.trim().to_string())
    }
}

/// Emotion classification via chat completions. The returned label is
/// free-form; no vocabulary is enforced.
#[derive(Debug, Clone)]
pub struct ApiEmotionClassifier {
    client: ChatClient,
}

impl ApiEmotionClassifier {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

impl EmotionClassifier for ApiEmotionClassifier {
    fn classify(&self, text: &str) -> CoachResult<String> {
        self.client
            .complete(EMOTION_SYSTEM_PROMPT, text, EMOTION_MAX_TOKENS)
            .map_err(CoachError::Classification)
    }
}

/// Counterpart response generation: role-plays the other side of the
/// scenario, conditioned on style and the detected tone.
#[derive(Debug, Clone)]
pub struct ApiResponseGenerator {
    client: ChatClient,
}

impl ApiResponseGenerator {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    fn role_play_prompt(
        scenario: &str,
        style: ConversationStyle,
        emotion: &str,
        user_text: &str,
    ) -> String {
        format!(
            "You are role-playing as the person the user is negotiating with in the following scenario:\n\
             Scenario: {scenario}\n\
             Conversation Style: {style}\n\
             User's Emotional Tone: {emotion}\n\
             User's Input: \"{user_text}\"\n\
             Respond as the counterpart in the scenario, keeping the conversation realistic and engaging."
        )
    }
}

impl ResponseGenerator for ApiResponseGenerator {
    fn respond(
        &self,
        scenario: &str,
        style: ConversationStyle,
        emotion: &str,
        user_text: &str,
    ) -> CoachResult<String> {
        let system = Self::role_play_prompt(scenario, style, emotion, user_text);
        self.client
            .complete(&system, user_text, RESPONSE_MAX_TOKENS)
            .map_err(CoachError::Generation)
    }
}
