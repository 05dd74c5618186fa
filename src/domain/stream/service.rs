use super::session::{StreamControl, StreamSession, StreamState};
use crate::domain::audio;
use crate::domain::shared::{emit, EventSender, SynthesisEvent};
use crate::domain::text::{normalize, tokenize, validate_text};
use crate::domain::tts::{SynthesisRequest, TtsServiceError, VoiceSelector};
use crate::infrastructure::config::Config;
use crate::infrastructure::engine::{
    token_feed, AudioStream, EngineError, EngineManager, TokenFeed,
};
use crate::infrastructure::files;
use futures::StreamExt;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type ActiveSession = Arc<Mutex<Option<Arc<StreamSession>>>>;

/// Runs at most one streaming synthesis at a time
pub struct StreamService {
    engines: Arc<EngineManager>,
    config: Arc<Config>,
    voices: Arc<VoiceSelector>,
    active: ActiveSession,
}

/// A running stream: its control surface, its events and its outcome
pub struct StreamHandle {
    session: Arc<StreamSession>,
    events: mpsc::UnboundedReceiver<SynthesisEvent>,
    task: JoinHandle<StreamState>,
}

impl StreamHandle {
    pub fn control(&self) -> StreamControl {
        self.session.clone()
    }

    /// Next notification, or `None` once the stream has finished
    pub async fn next_event(&mut self) -> Option<SynthesisEvent> {
        self.events.recv().await
    }

    /// Wait for the stream to end and return its final state
    pub async fn join(self) -> StreamState {
        match self.task.await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(error = %e, session_id = %self.session.id(), "Stream task failed");
                StreamState::Failed
            }
        }
    }
}

impl StreamService {
    pub fn new(
        engines: Arc<EngineManager>,
        config: Arc<Config>,
        voices: Arc<VoiceSelector>,
    ) -> Self {
        Self {
            engines,
            config,
            voices,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Start streaming `request.text`.
    ///
    /// Fails with `Conflict` while another stream is running. Chunk files are
    /// announced through the handle as soon as they are written; the merged
    /// file is written only if the stream runs to completion.
    pub async fn start_stream(
        &self,
        request: SynthesisRequest,
    ) -> Result<StreamHandle, TtsServiceError> {
        let text = normalize(&request.text);
        validate_text(&text, self.config.max_text_length)?;
        if self.is_streaming() {
            return Err(TtsServiceError::Conflict(
                "a stream is already in progress".to_string(),
            ));
        }

        let voice = self.voices.select(request.voice.as_deref(), &text);
        let engine = self.engines.load().await?;

        let session = Arc::new(StreamSession::new());
        {
            let mut active = self.active.lock();
            if active.as_ref().is_some_and(|s| !s.state().is_terminal()) {
                return Err(TtsServiceError::Conflict(
                    "a stream is already in progress".to_string(),
                ));
            }
            session.transition(StreamState::Streaming);
            *active = Some(session.clone());
        }

        let tokens: Vec<String> = tokenize(&text).into_iter().map(str::to_string).collect();
        let output_path = request
            .output_path
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| files::stream_output_path(&self.config.temp_dir, session.id()));

        tracing::info!(
            session_id = %session.id(),
            text_length = text.len(),
            token_count = tokens.len(),
            voice = %voice,
            "Stream started"
        );

        let (feed, source) = token_feed();
        let chunks = engine.stream(source, voice);
        let (tx, rx) = mpsc::unbounded_channel();

        let pipeline = Pipeline {
            session: session.clone(),
            temp_dir: self.config.temp_dir.clone(),
            output_path,
            pacing: self.config.stream_pacing(),
            events: tx,
        };
        let active = self.active.clone();
        let task = tokio::spawn(async move {
            let state = pipeline.run(feed, tokens, chunks).await;
            release(&active, &pipeline.session);
            state
        });

        Ok(StreamHandle {
            session,
            events: rx,
            task,
        })
    }

    pub fn is_streaming(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|s| !s.state().is_terminal())
    }

    pub fn active_session(&self) -> Option<StreamControl> {
        self.active.lock().clone()
    }

    /// Pause the active stream. Returns whether there was one.
    pub fn pause(&self) -> bool {
        self.with_active(StreamSession::pause)
    }

    pub fn resume(&self) -> bool {
        self.with_active(StreamSession::resume)
    }

    pub fn cancel(&self) -> bool {
        self.with_active(StreamSession::cancel)
    }

    fn with_active(&self, signal: impl FnOnce(&StreamSession)) -> bool {
        match self.active.lock().as_ref() {
            Some(session) => {
                signal(session);
                true
            }
            None => false,
        }
    }
}

fn release(active: &ActiveSession, session: &StreamSession) {
    let mut active = active.lock();
    if active.as_ref().is_some_and(|s| s.id() == session.id()) {
        *active = None;
    }
}

struct Pipeline {
    session: Arc<StreamSession>,
    temp_dir: PathBuf,
    output_path: PathBuf,
    pacing: Duration,
    events: EventSender,
}

impl Pipeline {
    async fn run(&self, feed: TokenFeed, tokens: Vec<String>, chunks: AudioStream) -> StreamState {
        let start_time = Instant::now();
        let producer = tokio::spawn(feed_tokens(
            feed,
            tokens,
            self.session.clone(),
            self.pacing,
        ));

        let consumed = self.consume(chunks).await;
        let outcome: Result<Option<PathBuf>, TtsServiceError> = match consumed {
            Ok(buffers) if self.session.is_cancelled() => {
                producer.abort();
                tracing::info!(
                    session_id = %self.session.id(),
                    chunk_count = buffers.len(),
                    "Stream cancelled, discarding audio"
                );
                Ok(None)
            }
            Ok(buffers) => match producer.await {
                Ok(Ok(_)) => self.finish(buffers).await.map(Some),
                Ok(Err(e)) => Err(e.into()),
                Err(e) => Err(anyhow::anyhow!("token feeder failed: {}", e).into()),
            },
            Err(e) => {
                producer.abort();
                Err(e)
            }
        };

        let state = match outcome {
            Ok(Some(path)) => {
                tracing::info!(
                    session_id = %self.session.id(),
                    output_path = %path.display(),
                    chunk_count = self.session.chunk_paths().len(),
                    latency_ms = start_time.elapsed().as_millis() as u64,
                    "Stream complete"
                );
                emit(Some(&self.events), SynthesisEvent::Complete { path });
                StreamState::Completed
            }
            Ok(None) => StreamState::Cancelled,
            Err(e) => {
                tracing::error!(error = %e, session_id = %self.session.id(), "Stream failed");
                emit(
                    Some(&self.events),
                    SynthesisEvent::Failed {
                        message: format!("Streaming error: {}", e),
                    },
                );
                StreamState::Failed
            }
        };

        self.session.transition(state);
        state
    }

    /// Persist chunks in delivery order until the engine is done or the
    /// stream is cancelled
    async fn consume(&self, mut chunks: AudioStream) -> Result<Vec<Vec<u8>>, TtsServiceError> {
        let mut buffers = Vec::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = self.session.cancelled() => break,
                next = chunks.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk?;
            if self.session.is_cancelled() {
                break;
            }

            let index = buffers.len();
            let wav = chunk.audio.into_wav();
            let path = files::chunk_path(&self.temp_dir, self.session.id(), index);
            files::write_file(&path, &wav).await?;

            tracing::debug!(
                session_id = %self.session.id(),
                chunk_index = index,
                audio_size = wav.len(),
                path = %path.display(),
                "Stream chunk ready"
            );
            self.session.push_chunk_path(path.clone());
            emit(Some(&self.events), SynthesisEvent::ChunkReady { index, path });
            buffers.push(wav);

            if !self.session.wait_while_paused().await {
                break;
            }
        }

        Ok(buffers)
    }

    async fn finish(&self, buffers: Vec<Vec<u8>>) -> Result<PathBuf, TtsServiceError> {
        if buffers.is_empty() {
            return Err(EngineError::Other("stream produced no audio".to_string()).into());
        }
        let merged = audio::merge(buffers);
        files::write_file(&self.output_path, &merged).await?;
        Ok(self.output_path.clone())
    }
}

/// Push tokens into the engine feed with a fixed delay between them, stopping
/// early on cancel. The feed is always closed on the way out.
async fn feed_tokens(
    mut feed: TokenFeed,
    tokens: Vec<String>,
    session: Arc<StreamSession>,
    pacing: Duration,
) -> Result<usize, EngineError> {
    let mut pushed = 0;
    for token in tokens {
        if session.is_cancelled() {
            tracing::debug!(session_id = %session.id(), pushed, "Token feed stopped by cancel");
            break;
        }
        if let Err(e) = feed.push(token) {
            feed.close();
            return Err(e);
        }
        pushed += 1;
        tokio::time::sleep(pacing).await;
    }
    feed.close();
    Ok(pushed)
}
