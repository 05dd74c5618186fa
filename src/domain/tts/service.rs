use super::dto::{SynthesisRequest, SynthesisResult};
use super::error::TtsServiceError;
use super::language::VoiceSelector;
use crate::domain::audio;
use crate::domain::shared::{emit, EventSender, SynthesisEvent};
use crate::domain::text::{chunk_by_length, normalize, validate_text, TextChunk, ValidationError};
use crate::infrastructure::config::Config;
use crate::infrastructure::engine::{EngineError, EngineManager, SynthesisEngine, VoiceInfo};
use crate::infrastructure::files;
use async_trait::async_trait;
use moka::future::Cache;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const PREVIEW_TEXT: &str = "This is a sample of the selected voice.";

pub struct TtsService {
    engines: Arc<EngineManager>,
    config: Arc<Config>,
    voices: Arc<VoiceSelector>,
    preview_cache: Option<Cache<String, Arc<Vec<u8>>>>,
}

impl TtsService {
    pub fn new(
        engines: Arc<EngineManager>,
        config: Arc<Config>,
        voices: Arc<VoiceSelector>,
    ) -> Self {
        let preview_cache = if config.preview_cache_enabled {
            Some(
                Cache::builder()
                    .max_capacity(64)
                    .time_to_idle(Duration::from_secs(30 * 60)) // 30 minutes, refreshes on access
                    .build(),
            )
        } else {
            None
        };

        Self {
            engines,
            config,
            voices,
            preview_cache,
        }
    }
}

#[async_trait]
pub trait TtsServiceApi: Send + Sync {
    /// Synthesize text in one engine call and write the WAV file
    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesisResult, TtsServiceError>;

    /// Synthesize long text.
    ///
    /// The text is split into chunks that are synthesized concurrently, at most
    /// `batch_concurrency` at a time, then merged back in text order. Any
    /// chunk failure fails the whole call and nothing is written.
    async fn synthesize_long(
        &self,
        request: SynthesisRequest,
        events: Option<EventSender>,
    ) -> Result<SynthesisResult, TtsServiceError>;

    /// Pick the single-shot or batch path from the text length
    async fn speak(
        &self,
        request: SynthesisRequest,
        events: Option<EventSender>,
    ) -> Result<SynthesisResult, TtsServiceError>;

    async fn list_voices(&self) -> Result<BTreeMap<String, VoiceInfo>, TtsServiceError>;

    /// Speak a fixed sample sentence and return the path of the temp file
    async fn preview_voice(&self, voice: &str) -> Result<PathBuf, TtsServiceError>;
}

#[async_trait]
impl TtsServiceApi for TtsService {
    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesisResult, TtsServiceError> {
        let start_time = Instant::now();
        let text = self.prepare_text(&request.text)?;
        let voice = self.voices.select(request.voice.as_deref(), &text);

        tracing::info!(
            text_length = text.len(),
            voice = %voice,
            "Single-shot synthesis request"
        );

        let engine = self.engines.load().await?;
        let speech = engine.generate(&text, &voice).await.map_err(|e| {
            tracing::error!(error = %e, voice = %voice, "Synthesis failed");
            e
        })?;

        let output_path = self.output_path(request.output_path);
        speech.save(&output_path).await?;
        let wav = speech.to_wav();

        tracing::info!(
            output_path = %output_path.display(),
            audio_size = wav.len(),
            latency_ms = start_time.elapsed().as_millis() as u64,
            "Audio saved"
        );

        Ok(SynthesisResult {
            duration_secs: audio::estimate_duration(wav),
            audio_size: wav.len(),
            output_path,
            voice,
            chunk_count: 1,
        })
    }

    async fn synthesize_long(
        &self,
        request: SynthesisRequest,
        events: Option<EventSender>,
    ) -> Result<SynthesisResult, TtsServiceError> {
        let start_time = Instant::now();
        let text = self.prepare_text(&request.text)?;
        let voice = self.voices.select(request.voice.as_deref(), &text);
        let chunks = chunk_by_length(&text, self.config.chunk_max_length);
        let total = chunks.len();

        tracing::info!(
            text_length = text.len(),
            chunk_count = total,
            concurrency = self.config.batch_concurrency,
            voice = %voice,
            "Batch synthesis started"
        );
        emit(events.as_ref(), SynthesisEvent::progress(0, total));

        let engine = self.engines.load().await?;
        let limiter = Arc::new(Semaphore::new(self.config.batch_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for chunk in chunks {
            tasks.spawn(synthesize_chunk(
                engine.clone(),
                limiter.clone(),
                chunk,
                voice.clone(),
            ));
        }

        // Slots are filled by chunk index so completion order does not matter
        let mut results: Vec<Option<Vec<u8>>> = vec![None; total];
        let mut completed = 0;

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tasks.abort_all();
                    let err = anyhow::anyhow!("synthesis task failed: {}", e);
                    emit(events.as_ref(), SynthesisEvent::Failed { message: err.to_string() });
                    return Err(err.into());
                }
            };

            match outcome {
                Ok((index, wav)) => {
                    results[index] = wav;
                    completed += 1;
                    emit(events.as_ref(), SynthesisEvent::progress(completed, total));
                }
                Err(e) => {
                    tasks.abort_all();
                    tracing::error!(
                        error = %e,
                        completed,
                        chunk_count = total,
                        "Batch synthesis failed"
                    );
                    emit(events.as_ref(), SynthesisEvent::Failed { message: e.to_string() });
                    return Err(e.into());
                }
            }
        }

        let buffers: Vec<Vec<u8>> = results.into_iter().flatten().collect();
        if buffers.is_empty() {
            return Err(ValidationError::Empty.into());
        }
        let chunk_count = buffers.len();
        let merged = audio::merge(buffers);

        let output_path = self.output_path(request.output_path);
        files::write_file(&output_path, &merged).await?;

        let duration_secs = audio::estimate_duration(&merged);
        tracing::info!(
            output_path = %output_path.display(),
            chunk_count,
            audio_size = merged.len(),
            duration_secs = duration_secs.unwrap_or_default(),
            latency_ms = start_time.elapsed().as_millis() as u64,
            "Batch synthesis complete"
        );
        emit(events.as_ref(), SynthesisEvent::Complete { path: output_path.clone() });

        Ok(SynthesisResult {
            audio_size: merged.len(),
            output_path,
            voice,
            chunk_count,
            duration_secs,
        })
    }

    async fn speak(
        &self,
        request: SynthesisRequest,
        events: Option<EventSender>,
    ) -> Result<SynthesisResult, TtsServiceError> {
        if request.text.chars().count() > self.config.long_text_threshold {
            self.synthesize_long(request, events).await
        } else {
            let result = self.synthesize(request).await;
            match &result {
                Ok(done) => emit(
                    events.as_ref(),
                    SynthesisEvent::Complete { path: done.output_path.clone() },
                ),
                Err(e) => emit(events.as_ref(), SynthesisEvent::Failed { message: e.to_string() }),
            }
            result
        }
    }

    async fn list_voices(&self) -> Result<BTreeMap<String, VoiceInfo>, TtsServiceError> {
        let engine = self.engines.load().await?;
        Ok(engine.list_voices().await?)
    }

    async fn preview_voice(&self, voice: &str) -> Result<PathBuf, TtsServiceError> {
        let wav = match self.cached_preview(voice).await {
            Some(wav) => {
                tracing::info!(voice = voice, "Preview cache hit");
                wav
            }
            None => {
                let engine = self.engines.load().await?;
                let wav = Arc::new(engine.generate(PREVIEW_TEXT, voice).await?.into_wav());
                if let Some(cache) = &self.preview_cache {
                    cache.insert(voice.to_string(), wav.clone()).await;
                }
                wav
            }
        };

        let path = files::preview_path(&self.config.temp_dir);
        files::write_file(&path, &wav).await?;
        tracing::info!(voice = voice, path = %path.display(), "Voice preview saved");
        Ok(path)
    }
}

impl TtsService {
    fn prepare_text(&self, raw: &str) -> Result<String, TtsServiceError> {
        let text = normalize(raw);
        validate_text(&text, self.config.max_text_length)?;
        Ok(text)
    }

    fn output_path(&self, requested: Option<PathBuf>) -> PathBuf {
        match requested.filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => path,
            None => {
                tracing::warn!(
                    default = %self.config.output_path.display(),
                    "No output path provided, using default"
                );
                self.config.output_path.clone()
            }
        }
    }

    async fn cached_preview(&self, voice: &str) -> Option<Arc<Vec<u8>>> {
        match &self.preview_cache {
            Some(cache) => cache.get(voice).await,
            None => None,
        }
    }
}

/// One batch task: wait for a slot, then synthesize the chunk. Chunks that
/// normalize to nothing are skipped.
async fn synthesize_chunk(
    engine: Arc<dyn SynthesisEngine>,
    limiter: Arc<Semaphore>,
    chunk: TextChunk,
    voice: String,
) -> Result<(usize, Option<Vec<u8>>), EngineError> {
    let _permit = limiter
        .acquire_owned()
        .await
        .map_err(|e| EngineError::Other(e.to_string()))?;

    let index = chunk.sequence_index;
    let content = normalize(&chunk.content);
    if content.is_empty() {
        tracing::warn!(chunk_index = index, "Skipping empty chunk after normalization");
        return Ok((index, None));
    }

    tracing::debug!(chunk_index = index, chunk_length = content.len(), "Synthesizing chunk");
    let audio = engine.generate(&content, &voice).await?;
    Ok((index, Some(audio.into_wav())))
}
