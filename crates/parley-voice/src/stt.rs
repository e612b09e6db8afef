//! Speech-to-text over an OpenAI-compatible transcription API.
//!
//! The captured PCM16 is wrapped in a WAV header and uploaded as multipart
//! form data to `{base}/audio/transcriptions`.

use crate::error::{VoiceError, VoiceResult};
use parley_core::{CapturedAudio, CoachError, CoachResult, Transcriber};
use std::time::Duration;

const DEFAULT_STT_MODEL: &str = "whisper-1";

/// Encode PCM16 mono samples as 16-bit WAV bytes for API upload.
fn pcm16_to_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = samples.len() * 2;
    let file_len = 44 + data_len as u32;

    let mut buf = Vec::with_capacity(44 + data_len);
    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(file_len - 8).to_le_bytes());
    buf.extend_from_slice(b"WAVE");
    // fmt subchunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // subchunk1 size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    buf.extend_from_slice(&2u16.to_le_bytes()); // block align
    buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    // data subchunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&(data_len as u32).to_le_bytes());
    for &s in samples {
        buf.extend_from_slice(&s.to_le_bytes());
    }
    buf
}

/// Transcription via an OpenAI-compatible `/audio/transcriptions` endpoint
/// (OpenAI Whisper or any server speaking the same protocol).
#[derive(Debug, Clone)]
pub struct WhisperApiStt {
    /// Base URL without trailing slash (e.g. https://api.openai.com/v1).
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl WhisperApiStt {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: Option<String>,
    ) -> VoiceResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| VoiceError::Stt(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_STT_MODEL.to_string()),
            client,
        })
    }

    fn request(&self, audio: &CapturedAudio) -> VoiceResult<String> {
        let wav = pcm16_to_wav(&audio.samples, audio.sample_rate);
        let url = format!(
            "{}/audio/transcriptions",
            self.base_url.trim_end_matches('/')
        );
        let part = reqwest::blocking::multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| VoiceError::Stt(e.to_string()))?;
        let form = reqwest::blocking::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|e| VoiceError::Stt(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().unwrap_or_default();
            return Err(VoiceError::Stt(format!("STT API error {status}: {body}")));
        }
        let json: serde_json::Value = res.json().map_err(|e| VoiceError::Stt(e.to_string()))?;
        let text = json
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .trim()
            .to_string();
        Ok(text)
    }
}

impl Transcriber for WhisperApiStt {
    fn transcribe(&self, audio: &CapturedAudio) -> CoachResult<String> {
        if audio.samples.is_empty() {
            // nothing recorded; the pipeline treats empty text as a failed turn
            return Ok(String::new());
        }
        self.request(audio).map_err(CoachError::from)
    }
}
