use crate::domain::text::ValidationError;
use crate::error::AppError;
use crate::infrastructure::engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum TtsServiceError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("synthesis failed: {0}")]
    Synthesis(#[from] EngineError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<TtsServiceError> for AppError {
    fn from(err: TtsServiceError) -> Self {
        match err {
            TtsServiceError::Invalid(e) => AppError::Validation(e),
            TtsServiceError::Synthesis(e) => AppError::Synthesis(e.to_string()),
            TtsServiceError::Io(e) => AppError::Io(e),
            TtsServiceError::Conflict(msg) => AppError::Conflict(msg),
            TtsServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
