use super::synthesis_engine::{EngineError, SynthesisEngine};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Where and how to reach the synthesis engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub base_url: String,
    pub model_id: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Builds a ready-to-use engine. Creation may be expensive (model load).
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create(&self, settings: &EngineSettings)
        -> Result<Arc<dyn SynthesisEngine>, EngineError>;
}

type EngineCell = Arc<OnceCell<Arc<dyn SynthesisEngine>>>;

/// Lazily creates one shared engine and hands out clones of its handle.
///
/// Concurrent first calls to [`EngineManager::load`] wait on the same
/// initialization instead of each creating an engine. A failed
/// initialization is not remembered, so the next call retries.
pub struct EngineManager {
    factory: Arc<dyn EngineFactory>,
    settings: RwLock<EngineSettings>,
    cell: RwLock<EngineCell>,
}

impl EngineManager {
    pub fn new(factory: Arc<dyn EngineFactory>, settings: EngineSettings) -> Self {
        Self {
            factory,
            settings: RwLock::new(settings),
            cell: RwLock::new(Arc::new(OnceCell::new())),
        }
    }

    pub async fn load(&self) -> Result<Arc<dyn SynthesisEngine>, EngineError> {
        let cell = self.cell.read().clone();
        let engine = cell
            .get_or_try_init(|| async {
                let settings = self.settings.read().clone();
                tracing::info!(
                    base_url = %settings.base_url,
                    model = %settings.model_id,
                    "Loading synthesis engine"
                );
                self.factory.create(&settings).await
            })
            .await?;
        Ok(engine.clone())
    }

    /// Load the engine, reporting progress messages. Returns whether it is ready.
    pub async fn initialize<F>(&self, on_progress: Option<F>) -> bool
    where
        F: Fn(&str),
    {
        let report = |message: &str| {
            if let Some(callback) = &on_progress {
                callback(message);
            }
        };

        report("Initializing TTS system...");
        match self.load().await {
            Ok(_) => {
                report("TTS system ready!");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Engine initialization failed");
                report("Failed to initialize TTS system.");
                false
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.read().initialized()
    }

    /// Forget the loaded engine; the next `load` creates a new one
    pub fn clear_cache(&self) {
        *self.cell.write() = Arc::new(OnceCell::new());
        tracing::debug!("Engine cache cleared");
    }

    pub fn config(&self) -> EngineSettings {
        self.settings.read().clone()
    }

    /// Replace model and/or server settings and drop the loaded engine
    pub fn update_config(&self, model_id: Option<String>, base_url: Option<String>) {
        {
            let mut settings = self.settings.write();
            if let Some(model_id) = model_id {
                settings.model_id = model_id;
            }
            if let Some(base_url) = base_url {
                settings.base_url = base_url;
            }
        }
        self.clear_cache();
    }
}
