pub mod normalizer;
pub mod segmenter;
pub mod validation;

pub use normalizer::normalize;
pub use segmenter::{chunk_by_length, estimate_processing_time, tokenize, TextChunk};
pub use validation::{
    estimate_speech_duration, format_duration, text_stats, validate_text, TextStats,
    ValidationError, MAX_TEXT_LENGTH,
};
