//! Text-to-speech synthesis and playback.
//!
//! [`ApiTts`] fetches audio bytes from an OpenAI-compatible `/audio/speech`
//! endpoint; [`Speaker`] plays them through a rodio sink, blocking until
//! playback finishes (the pipeline is strictly sequential). Failures on this
//! path never invalidate a turn.

use crate::error::{VoiceError, VoiceResult};
use parley_core::{CoachError, CoachResult, SpeechSynthesizer};
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TTS_MODEL: &str = "tts-1";
const DEFAULT_TTS_VOICE: &str = "alloy";

/// Synthesis via an OpenAI-compatible `/audio/speech` endpoint.
#[derive(Debug, Clone)]
pub struct ApiTts {
    /// Base URL without trailing slash (e.g. https://api.openai.com/v1).
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    client: reqwest::blocking::Client,
}

impl ApiTts {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: Option<String>,
        voice: Option<String>,
    ) -> VoiceResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| VoiceError::Tts(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
            voice: voice.unwrap_or_else(|| DEFAULT_TTS_VOICE.to_string()),
            client,
        })
    }

    /// Synthesize text to audio bytes (WAV/MP3). Empty text yields empty
    /// bytes and no request.
    pub fn synthesize(&self, text: &str) -> VoiceResult<Vec<u8>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/audio/speech", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": self.voice,
        });
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| VoiceError::Tts(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().unwrap_or_default();
            return Err(VoiceError::Tts(format!("TTS API error {status}: {body}")));
        }
        let bytes = res.bytes().map_err(|e| VoiceError::Tts(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Audio output through the default device.
pub struct Speaker {
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
    sink: Sink,
}

impl Speaker {
    pub fn new() -> VoiceResult<Self> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| VoiceError::Playback(e.to_string()))?;
        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| VoiceError::Playback(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            _stream_handle: stream_handle,
            sink,
        })
    }

    /// Decode and play audio bytes, blocking until playback completes.
    pub fn play_bytes(&self, bytes: &[u8]) -> VoiceResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let cursor = Cursor::new(bytes.to_vec());
        let source = rodio::Decoder::new(cursor)
            .map_err(|e| VoiceError::Playback(format!("decode failed: {e}")))?;
        self.sink.append(source.convert_samples::<f32>());
        self.sink.sleep_until_end();
        Ok(())
    }
}

/// The full synthesis stage: fetch audio for the reply and play it.
pub struct VoiceSynthesizer {
    tts: ApiTts,
    speaker: Speaker,
}

impl VoiceSynthesizer {
    pub fn new(tts: ApiTts, speaker: Speaker) -> Self {
        Self { tts, speaker }
    }
}

impl SpeechSynthesizer for VoiceSynthesizer {
    fn speak(&self, text: &str) -> CoachResult<()> {
        let bytes = self.tts.synthesize(text).map_err(CoachError::from)?;
        debug!(bytes = bytes.len(), "synthesized reply audio");
        self.speaker.play_bytes(&bytes).map_err(CoachError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_synthesizes_to_no_audio_without_a_request() {
        let tts = ApiTts::new("https://api.openai.com/v1", "key", None, None).unwrap();
        assert!(tts.synthesize("   ").unwrap().is_empty());
    }
}
