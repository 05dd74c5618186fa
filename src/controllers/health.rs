use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    infrastructure::engine::EngineManager,
};

pub struct HealthController {
    engines: Arc<EngineManager>,
}

impl HealthController {
    pub fn new(engines: Arc<EngineManager>) -> Self {
        Self { engines }
    }

    /// Bring the engine up before a command needs it. Progress goes to stderr.
    pub async fn ensure_ready(&self) -> AppResult<()> {
        let ready = self
            .engines
            .initialize(Some(|message: &str| eprintln!("{}", message)))
            .await;

        if ready {
            return Ok(());
        }
        let settings = self.engines.config();
        Err(AppError::Synthesis(format!(
            "Failed to initialize TTS system. Is the Kokoro server running at {} (model {})?",
            settings.base_url, settings.model_id
        )))
    }
}
