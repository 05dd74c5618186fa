use tokio::sync::mpsc;

use super::synthesis_engine::EngineError;

/// Create a connected push feed and the source an engine reads from
pub fn token_feed() -> (TokenFeed, TokenSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TokenFeed { tx: Some(tx) }, TokenSource { rx })
}

/// Writing half of a token feed. Pushing never blocks.
#[derive(Debug)]
pub struct TokenFeed {
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl TokenFeed {
    pub fn push(&self, token: impl Into<String>) -> Result<(), EngineError> {
        let tx = self.tx.as_ref().ok_or(EngineError::FeedClosed)?;
        tx.send(token.into()).map_err(|_| EngineError::FeedClosed)
    }

    /// Signal end of input. Idempotent.
    pub fn close(&mut self) {
        self.tx.take();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().map_or(true, |tx| tx.is_closed())
    }
}

/// Reading half of a token feed
#[derive(Debug)]
pub struct TokenSource {
    rx: mpsc::UnboundedReceiver<String>,
}

impl TokenSource {
    /// Next token, or `None` once the feed is closed and drained
    pub async fn next_token(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}
