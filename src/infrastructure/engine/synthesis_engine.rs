use crate::domain::audio::{self, WavInfo};
use crate::infrastructure::files;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::token_feed::TokenSource;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("synthesis server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid audio: {0}")]
    InvalidAudio(String),
    #[error("engine initialization failed: {0}")]
    Init(String),
    #[error("token feed closed")]
    FeedClosed,
    #[error("{0}")]
    Other(String),
}

/// Synthesized audio as a complete WAV file
#[derive(Debug, Clone, PartialEq)]
pub struct Audio {
    wav: Vec<u8>,
}

impl Audio {
    /// Wrap WAV bytes, rejecting anything without a RIFF/WAVE header
    pub fn from_wav(wav: Vec<u8>) -> Result<Self, EngineError> {
        if !audio::is_valid_wav(&wav) {
            return Err(EngineError::InvalidAudio(format!(
                "expected a WAV file, got {} bytes without a RIFF/WAVE header",
                wav.len()
            )));
        }
        Ok(Self { wav })
    }

    pub fn to_wav(&self) -> &[u8] {
        &self.wav
    }

    pub fn into_wav(self) -> Vec<u8> {
        self.wav
    }

    pub fn info(&self) -> Option<WavInfo> {
        audio::parse_header(&self.wav)
    }

    /// Write the WAV file, creating missing parent directories
    pub async fn save(&self, path: &Path) -> std::io::Result<()> {
        files::write_file(path, &self.wav).await
    }
}

/// One unit of streamed audio, in engine delivery order
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub sequence_index: usize,
    pub voice: String,
    pub audio: Audio,
}

pub type AudioStream = BoxStream<'static, Result<AudioChunk, EngineError>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceInfo {
    pub name: String,
    pub gender: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_grade: Option<String>,
}

/// Neural TTS backend.
///
/// Implementations turn text into WAV audio. `stream` consumes a push-based
/// token feed and must yield chunks in the order the tokens were submitted;
/// the stream ends once the feed is closed and all pending text is spoken.
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    async fn generate(&self, text: &str, voice: &str) -> Result<Audio, EngineError>;

    fn stream(self: Arc<Self>, source: TokenSource, voice: String) -> AudioStream;

    async fn list_voices(&self) -> Result<BTreeMap<String, VoiceInfo>, EngineError>;
}
