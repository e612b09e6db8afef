//! Energy-based endpointing: record until the speaker has stopped.
//!
//! State machine `Idle → Listening → Endpointed`, driven one chunk at a
//! time. A chunk whose RMS energy (on the i16 scale) exceeds the threshold
//! counts as speech; once speech has been heard, the utterance commits after
//! the silence timeout. Everything fed in is buffered, leading silence
//! included, so the transcription service sees the whole take.
//!
//! A session where nobody ever speaks would otherwise listen forever, so the
//! duration cap commits whatever has been buffered once that much audio has
//! gone by, in any state.

use crate::audio::{AudioChunk, ChunkSource};
use crate::error::VoiceError;
use parley_core::{CapturedAudio, CoachError, CoachResult, SpeechCapture};
use std::time::Duration;
use tracing::{debug, info};

/// Endpointing parameters. Defaults: threshold 500 (RMS, i16 scale),
/// 2 s silence timeout, 90 s duration cap.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// RMS energy above this counts as speech.
    pub silence_threshold: f32,
    /// Trailing silence, after speech, that commits the utterance.
    pub silence_timeout: Duration,
    /// Hard cap on buffered audio time; commits in any state.
    pub max_duration: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            silence_threshold: 500.0,
            silence_timeout: Duration::from_secs(2),
            max_duration: Duration::from_secs(90),
        }
    }
}

/// Endpointer states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// No speech heard yet.
    Idle,
    /// Speech heard; watching for the trailing-silence timeout.
    Listening,
    /// Utterance complete; further chunks are ignored.
    Endpointed,
}

/// One utterance's worth of endpointing state. Create a fresh one per
/// capture.
pub struct Endpointer {
    config: EndpointConfig,
    state: EndpointState,
    buffered: Vec<i16>,
    trailing_silence_samples: usize,
    timeout_samples: usize,
    max_samples: usize,
}

impl Endpointer {
    pub fn new(config: EndpointConfig, sample_rate: u32) -> Self {
        let timeout_samples =
            (config.silence_timeout.as_secs_f64() * sample_rate as f64) as usize;
        let max_samples = (config.max_duration.as_secs_f64() * sample_rate as f64) as usize;
        Self {
            config,
            state: EndpointState::Idle,
            buffered: Vec::new(),
            trailing_silence_samples: 0,
            timeout_samples,
            max_samples,
        }
    }

    pub fn state(&self) -> EndpointState {
        self.state
    }

    /// Feed one chunk and advance the state machine. Returns the state
    /// after the chunk; once `Endpointed`, input is no longer consumed.
    pub fn offer(&mut self, chunk: &AudioChunk) -> EndpointState {
        if self.state == EndpointState::Endpointed {
            return self.state;
        }
        self.buffered.extend_from_slice(&chunk.samples);

        let energy = rms(&chunk.samples);
        if energy > self.config.silence_threshold {
            if self.state == EndpointState::Idle {
                debug!(energy, "speech started");
            }
            self.state = EndpointState::Listening;
            self.trailing_silence_samples = 0;
        } else {
            self.trailing_silence_samples += chunk.samples.len();
            if self.state == EndpointState::Listening
                && self.trailing_silence_samples >= self.timeout_samples
            {
                debug!("silence timeout reached, utterance complete");
                self.state = EndpointState::Endpointed;
            }
        }

        if self.state != EndpointState::Endpointed && self.buffered.len() >= self.max_samples {
            info!("duration cap reached, committing capture");
            self.state = EndpointState::Endpointed;
        }

        self.state
    }

    /// Take the buffered utterance, leaving the endpointer empty.
    pub fn take_audio(&mut self) -> Vec<i16> {
        std::mem::take(&mut self.buffered)
    }
}

/// Root-mean-square energy of a chunk, on the i16 sample scale.
pub fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples
        .iter()
        .map(|&s| {
            let v = s as f64;
            v * v
        })
        .sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Records one utterance from a [`ChunkSource`] per capture call.
pub struct Recorder<S: ChunkSource> {
    source: S,
    config: EndpointConfig,
}

impl<S: ChunkSource> Recorder<S> {
    pub fn new(source: S, config: EndpointConfig) -> Self {
        Self { source, config }
    }
}

impl<S: ChunkSource> SpeechCapture for Recorder<S> {
    /// Block pulling chunks until the endpointer commits. A source that
    /// closes mid-speech commits what was buffered; one that closes before
    /// any speech is a capture failure.
    fn capture_turn(&mut self) -> CoachResult<CapturedAudio> {
        let sample_rate = self.source.sample_rate();
        let mut endpointer = Endpointer::new(self.config.clone(), sample_rate);
        info!("listening (speak now)");

        loop {
            match self.source.next_chunk().map_err(CoachError::from)? {
                Some(chunk) => {
                    if endpointer.offer(&chunk) == EndpointState::Endpointed {
                        break;
                    }
                }
                None => {
                    if endpointer.state() == EndpointState::Listening {
                        debug!("audio source closed mid-speech, committing buffer");
                        break;
                    }
                    return Err(CoachError::from(VoiceError::Capture(
                        "audio source closed before any speech was heard".to_string(),
                    )));
                }
            }
        }

        let samples = endpointer.take_audio();
        info!(
            samples = samples.len(),
            seconds = samples.len() as f32 / sample_rate as f32,
            "capture complete"
        );
        Ok(CapturedAudio {
            samples,
            sample_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16000;
    const CHUNK: usize = 1024;

    fn loud_chunk() -> AudioChunk {
        AudioChunk {
            samples: vec![3000i16; CHUNK],
        }
    }

    fn silent_chunk() -> AudioChunk {
        AudioChunk {
            samples: vec![0i16; CHUNK],
        }
    }

    /// Chunks for `seconds` of audio.
    fn chunks_for(seconds: f32) -> usize {
        ((seconds * RATE as f32) as usize).div_ceil(CHUNK)
    }

    struct ScriptSource {
        chunks: std::collections::VecDeque<AudioChunk>,
    }

    impl ScriptSource {
        fn new(chunks: impl IntoIterator<Item = AudioChunk>) -> Self {
            Self {
                chunks: chunks.into_iter().collect(),
            }
        }
    }

    impl ChunkSource for ScriptSource {
        fn next_chunk(&mut self) -> crate::error::VoiceResult<Option<AudioChunk>> {
            Ok(self.chunks.pop_front())
        }

        fn sample_rate(&self) -> u32 {
            RATE
        }

        fn chunk_size(&self) -> usize {
            CHUNK
        }
    }

    #[test]
    fn rms_of_silence_is_zero_and_of_tone_is_its_level() {
        assert_eq!(rms(&[0; 1024]), 0.0);
        let level = rms(&vec![3000i16; 1024]);
        assert!((level - 3000.0).abs() < 1.0);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn stays_idle_through_leading_silence() {
        let mut ep = Endpointer::new(EndpointConfig::default(), RATE);
        for _ in 0..chunks_for(5.0) {
            assert_eq!(ep.offer(&silent_chunk()), EndpointState::Idle);
        }
    }

    #[test]
    fn commits_after_trailing_silence_timeout() {
        let mut ep = Endpointer::new(EndpointConfig::default(), RATE);
        // leading silence, then a second of speech
        for _ in 0..chunks_for(0.5) {
            ep.offer(&silent_chunk());
        }
        for _ in 0..chunks_for(1.0) {
            assert_eq!(ep.offer(&loud_chunk()), EndpointState::Listening);
        }
        // under the 2s timeout: still listening
        for _ in 0..chunks_for(1.5) {
            assert_ne!(ep.offer(&silent_chunk()), EndpointState::Endpointed);
        }
        // push past the timeout
        let mut state = ep.state();
        for _ in 0..chunks_for(1.0) {
            state = ep.offer(&silent_chunk());
            if state == EndpointState::Endpointed {
                break;
            }
        }
        assert_eq!(state, EndpointState::Endpointed);
        // buffer holds everything fed in, leading silence included
        assert!(ep.take_audio().len() >= (RATE as f32 * 3.5) as usize);
    }

    #[test]
    fn speech_resuming_resets_the_silence_clock() {
        let mut ep = Endpointer::new(EndpointConfig::default(), RATE);
        ep.offer(&loud_chunk());
        for _ in 0..chunks_for(1.5) {
            ep.offer(&silent_chunk());
        }
        // speaker resumes before the timeout
        ep.offer(&loud_chunk());
        for _ in 0..chunks_for(1.5) {
            assert_ne!(ep.offer(&silent_chunk()), EndpointState::Endpointed);
        }
    }

    #[test]
    fn all_silence_commits_at_the_duration_cap() {
        let config = EndpointConfig {
            max_duration: Duration::from_secs(3),
            ..Default::default()
        };
        let mut ep = Endpointer::new(config, RATE);
        let mut offered = 0;
        loop {
            offered += 1;
            if ep.offer(&silent_chunk()) == EndpointState::Endpointed {
                break;
            }
            assert!(offered < chunks_for(4.0), "cap never fired");
        }
        assert!(ep.take_audio().len() >= 3 * RATE as usize);
    }

    #[test]
    fn recorder_captures_a_full_utterance() {
        let script: Vec<AudioChunk> = std::iter::repeat_with(silent_chunk)
            .take(chunks_for(0.5))
            .chain(std::iter::repeat_with(loud_chunk).take(chunks_for(1.0)))
            .chain(std::iter::repeat_with(silent_chunk).take(chunks_for(2.5)))
            .collect();
        let mut recorder = Recorder::new(ScriptSource::new(script), EndpointConfig::default());
        let audio = recorder.capture_turn().unwrap();
        assert_eq!(audio.sample_rate, RATE);
        assert!(audio.duration_secs() >= 3.0);
    }

    #[test]
    fn source_closing_mid_speech_commits_the_buffer() {
        let script: Vec<AudioChunk> =
            std::iter::repeat_with(loud_chunk).take(chunks_for(1.0)).collect();
        let mut recorder = Recorder::new(ScriptSource::new(script), EndpointConfig::default());
        let audio = recorder.capture_turn().unwrap();
        assert!(!audio.samples.is_empty());
    }

    #[test]
    fn source_closing_while_idle_is_a_capture_error() {
        let mut recorder = Recorder::new(
            ScriptSource::new(std::iter::repeat_with(silent_chunk).take(3)),
            EndpointConfig::default(),
        );
        assert!(matches!(
            recorder.capture_turn(),
            Err(CoachError::Capture(_))
        ));
    }
}
