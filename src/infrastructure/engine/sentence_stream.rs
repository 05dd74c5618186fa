use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::synthesis_engine::{AudioChunk, AudioStream, EngineError, SynthesisEngine};
use super::token_feed::TokenSource;
use crate::domain::text::segmenter::{split_sentences, DEFAULT_CHUNK_LENGTH};

/// Accumulates streamed tokens and releases whole sentences.
///
/// A sentence is released once whitespace after its closing punctuation has
/// been seen, or once the pending text grows past `max_chars`.
#[derive(Debug)]
pub struct SentenceSplitter {
    pending: String,
    max_chars: usize,
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_LENGTH)
    }
}

impl SentenceSplitter {
    pub fn new(max_chars: usize) -> Self {
        Self {
            pending: String::new(),
            max_chars: max_chars.max(1),
        }
    }

    pub fn push(&mut self, token: &str) -> Vec<String> {
        self.pending.push_str(token);

        let mut sentences = split_sentences(&self.pending);
        let last = sentences.pop().unwrap_or_default();
        self.pending = last;

        if self.pending.chars().count() > self.max_chars {
            sentences.push(std::mem::take(&mut self.pending));
        }
        sentences
    }

    /// Whatever is left once the feed closes
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let rest = rest.trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }
}

/// Streaming adapter for engines that only synthesize whole utterances.
///
/// Tokens are read from `source` and grouped into sentences; each sentence is
/// synthesized with [`SynthesisEngine::generate`] as soon as it is complete, so
/// chunks come out in submission order. The stream ends after the feed closes
/// and the trailing text is spoken, or right after the first error.
pub fn sentence_stream(
    engine: Arc<dyn SynthesisEngine>,
    mut source: TokenSource,
    voice: String,
) -> AudioStream {
    let (tx, rx) = mpsc::channel(4);

    tokio::spawn(async move {
        let mut splitter = SentenceSplitter::default();
        let mut sequence_index = 0;

        loop {
            let sentences = match source.next_token().await {
                Some(token) => splitter.push(&token),
                None => {
                    if let Some(rest) = splitter.finish() {
                        speak(engine.as_ref(), &tx, rest, &voice, sequence_index).await;
                    }
                    break;
                }
            };
            for sentence in sentences {
                if !speak(engine.as_ref(), &tx, sentence, &voice, sequence_index).await {
                    return;
                }
                sequence_index += 1;
            }
            if tx.is_closed() {
                break;
            }
        }
    });

    ReceiverStream::new(rx).boxed()
}

/// Synthesize one sentence and forward it. Returns false once the stream
/// should stop: the receiver is gone or the engine failed.
async fn speak(
    engine: &dyn SynthesisEngine,
    tx: &mpsc::Sender<Result<AudioChunk, EngineError>>,
    sentence: String,
    voice: &str,
    sequence_index: usize,
) -> bool {
    tracing::debug!(
        sequence_index,
        sentence_length = sentence.len(),
        "Synthesizing streamed sentence"
    );
    let item = engine
        .generate(&sentence, voice)
        .await
        .map(|audio| AudioChunk {
            sequence_index,
            voice: voice.to_string(),
            audio,
        });
    let failed = item.is_err();
    tx.send(item).await.is_ok() && !failed
}
