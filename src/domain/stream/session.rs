use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    Idle,
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamState::Completed | StreamState::Cancelled | StreamState::Failed
        )
    }

    fn can_become(&self, next: StreamState) -> bool {
        match (self, next) {
            (StreamState::Idle, StreamState::Streaming) => true,
            (StreamState::Streaming, next) => next.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Signals {
    paused: bool,
    cancelled: bool,
}

/// State shared by the producer and consumer of one stream and by whoever
/// controls it.
///
/// Pause and cancel are delivered through a watch channel so a paused consumer
/// sleeps until something changes instead of polling. All signals are
/// idempotent; nothing can be resumed after a cancel.
#[derive(Debug)]
pub struct StreamSession {
    id: Uuid,
    signals: watch::Sender<Signals>,
    state: Mutex<StreamState>,
    chunk_paths: Mutex<Vec<PathBuf>>,
}

/// Cloneable handle used to steer a running stream
pub type StreamControl = Arc<StreamSession>;

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSession {
    pub fn new() -> Self {
        let (signals, _) = watch::channel(Signals::default());
        Self {
            id: Uuid::new_v4(),
            signals,
            state: Mutex::new(StreamState::Idle),
            chunk_paths: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn pause(&self) {
        let changed = self.signals.send_if_modified(|s| {
            if s.paused || s.cancelled {
                return false;
            }
            s.paused = true;
            true
        });
        if changed {
            tracing::info!(session_id = %self.id, "Stream paused");
        }
    }

    pub fn resume(&self) {
        let changed = self.signals.send_if_modified(|s| {
            if !s.paused {
                return false;
            }
            s.paused = false;
            true
        });
        if changed {
            tracing::info!(session_id = %self.id, "Stream resumed");
        }
    }

    pub fn cancel(&self) {
        let changed = self.signals.send_if_modified(|s| {
            if s.cancelled {
                return false;
            }
            s.cancelled = true;
            s.paused = false;
            true
        });
        if changed {
            tracing::info!(session_id = %self.id, "Stream cancelled");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.signals.borrow().paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.signals.borrow().cancelled
    }

    pub fn state(&self) -> StreamState {
        *self.state.lock()
    }

    /// Move to `next` if the state machine allows it
    pub(crate) fn transition(&self, next: StreamState) -> bool {
        let mut state = self.state.lock();
        if !state.can_become(next) {
            tracing::warn!(
                session_id = %self.id,
                from = ?*state,
                to = ?next,
                "Ignoring invalid stream state transition"
            );
            return false;
        }
        *state = next;
        true
    }

    /// Temp files written so far, in delivery order
    pub fn chunk_paths(&self) -> Vec<PathBuf> {
        self.chunk_paths.lock().clone()
    }

    pub(crate) fn push_chunk_path(&self, path: PathBuf) {
        self.chunk_paths.lock().push(path);
    }

    /// Wait until the stream is not paused. Returns false if it was cancelled.
    pub async fn wait_while_paused(&self) -> bool {
        let mut rx = self.signals.subscribe();
        let cancelled = match rx.wait_for(|s| !s.paused || s.cancelled).await {
            Ok(signals) => signals.cancelled,
            Err(_) => true,
        };
        !cancelled
    }

    /// Resolves once the stream is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.signals.subscribe();
        let _ = rx.wait_for(|s| s.cancelled).await;
    }
}
