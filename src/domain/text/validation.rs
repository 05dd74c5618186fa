use serde::Serialize;
use std::time::Duration;

use super::segmenter::DEFAULT_CHUNK_LENGTH;

/// Longest text accepted for synthesis, in characters
pub const MAX_TEXT_LENGTH: usize = 100_000;

/// Average speaking rate used for duration estimates
const WORDS_PER_MINUTE: f64 = 160.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Text cannot be empty")]
    Empty,
    #[error("Text is too long (max {max} characters)")]
    TooLong { max: usize },
    #[error("Not a text file: {0}")]
    InvalidFile(String),
    #[error("File is too large ({size} bytes, max {max}): {path}")]
    FileTooLarge { path: String, size: u64, max: u64 },
}

/// Reject text that is empty after trimming or longer than `max_length`
/// characters.
pub fn validate_text(text: &str, max_length: usize) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    if trimmed.chars().count() > max_length {
        return Err(ValidationError::TooLong { max: max_length });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub characters: usize,
    pub words: usize,
    pub sentences: usize,
    pub estimated_chunks: usize,
}

pub fn text_stats(text: &str) -> TextStats {
    let trimmed = text.trim();
    let characters = trimmed.chars().count();

    TextStats {
        characters,
        words: trimmed.split_whitespace().count(),
        sentences: trimmed
            .split(['.', '!', '?'])
            .filter(|s| !s.trim().is_empty())
            .count(),
        estimated_chunks: characters.div_ceil(DEFAULT_CHUNK_LENGTH),
    }
}

/// Estimated spoken length of the text, rounded up to whole seconds
pub fn estimate_speech_duration(text: &str) -> Duration {
    let words = text.split_whitespace().count() as f64;
    Duration::from_secs((words / WORDS_PER_MINUTE * 60.0).ceil() as u64)
}

/// Render seconds as `m:ss`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
