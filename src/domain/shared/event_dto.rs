use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Notifications emitted while audio is being produced.
///
/// Serialized with the event names the UI layer listens for
/// (`chunk-ready`, `progress-update`, `complete`, `error`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum SynthesisEvent {
    #[serde(rename = "chunk-ready")]
    ChunkReady { index: usize, path: PathBuf },
    #[serde(rename = "progress-update")]
    Progress { progress: u8, message: String },
    #[serde(rename = "complete")]
    Complete { path: PathBuf },
    #[serde(rename = "error")]
    Failed { message: String },
}

impl SynthesisEvent {
    pub fn progress(completed: usize, total: usize) -> Self {
        let progress = if total == 0 {
            100
        } else {
            (completed.min(total) * 100 / total) as u8
        };
        SynthesisEvent::Progress {
            progress,
            message: format!("Processing... {}%", progress),
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<SynthesisEvent>;

/// Send an event if anyone is listening. A dropped receiver is not an error.
pub fn emit(events: Option<&EventSender>, event: SynthesisEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
