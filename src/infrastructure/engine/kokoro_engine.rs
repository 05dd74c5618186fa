use super::engine_manager::{EngineFactory, EngineSettings};
use super::sentence_stream::sentence_stream;
use super::synthesis_engine::{Audio, AudioStream, EngineError, SynthesisEngine, VoiceInfo};
use super::token_feed::TokenSource;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    voices: Vec<String>,
}

/// Kokoro served over an OpenAI-compatible HTTP API (`/v1/audio/speech`)
pub struct KokoroEngine {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl KokoroEngine {
    pub fn new(settings: &EngineSettings) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model_id.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, EngineError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(EngineError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl SynthesisEngine for KokoroEngine {
    async fn generate(&self, text: &str, voice: &str) -> Result<Audio, EngineError> {
        let start_time = std::time::Instant::now();

        tracing::info!(
            model = %self.model,
            voice = voice,
            text_length = text.len(),
            text_preview = preview(text),
            "Calling Kokoro speech API"
        );

        let payload = SpeechRequest {
            model: &self.model,
            input: text,
            voice,
            response_format: "wav",
            stream: false,
        };

        let response = self
            .request(reqwest::Method::POST, "/v1/audio/speech")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    model = %self.model,
                    voice = voice,
                    text_length = text.len(),
                    "Kokoro speech API call failed"
                );
                EngineError::from(e)
            })?;
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;

        let audio = Audio::from_wav(bytes.to_vec())?;
        tracing::debug!(
            audio_size = audio.to_wav().len(),
            latency_ms = start_time.elapsed().as_millis() as u64,
            "Kokoro audio received"
        );
        Ok(audio)
    }

    fn stream(self: Arc<Self>, source: TokenSource, voice: String) -> AudioStream {
        sentence_stream(self, source, voice)
    }

    async fn list_voices(&self) -> Result<BTreeMap<String, VoiceInfo>, EngineError> {
        let response = self
            .request(reqwest::Method::GET, "/v1/audio/voices")
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let voices: VoicesResponse = response.json().await?;

        Ok(voices
            .voices
            .into_iter()
            .map(|id| {
                let info = voice_info_from_id(&id);
                (id, info)
            })
            .collect())
    }
}

/// Builds [`KokoroEngine`]s and checks the server answers before handing one out
pub struct KokoroEngineFactory;

#[async_trait]
impl EngineFactory for KokoroEngineFactory {
    async fn create(
        &self,
        settings: &EngineSettings,
    ) -> Result<Arc<dyn SynthesisEngine>, EngineError> {
        let engine = KokoroEngine::new(settings)?;
        let voices = engine
            .list_voices()
            .await
            .map_err(|e| EngineError::Init(format!("{} unreachable: {}", settings.base_url, e)))?;

        tracing::info!(
            base_url = %settings.base_url,
            model = %settings.model_id,
            voice_count = voices.len(),
            "Kokoro engine ready"
        );
        Ok(Arc::new(engine))
    }
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(200) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Describe a Kokoro voice from its id.
///
/// Ids follow `<language><gender>_<name>`, e.g. `af_heart` is an American
/// English female voice called Heart.
pub fn voice_info_from_id(id: &str) -> VoiceInfo {
    let (prefix, name) = id.split_once('_').unwrap_or(("", id));
    let mut prefix = prefix.chars();

    let language = match prefix.next() {
        Some('a') => "en-us",
        Some('b') => "en-gb",
        Some('e') => "es",
        Some('f') => "fr",
        Some('h') => "hi",
        Some('i') => "it",
        Some('j') => "ja",
        Some('p') => "pt-br",
        Some('z') => "zh",
        _ => "unknown",
    };
    let gender = match prefix.next() {
        Some('f') => "Female",
        Some('m') => "Male",
        _ => "Unknown",
    };

    let mut display = String::with_capacity(name.len());
    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        display.extend(first.to_uppercase());
        display.push_str(chars.as_str());
    }

    VoiceInfo {
        name: display,
        gender: gender.to_string(),
        language: language.to_string(),
        traits: None,
        overall_grade: None,
    }
}
