pub mod dto;
pub mod error;
pub mod language;
pub mod service;

pub use dto::{SynthesisRequest, SynthesisResult};
pub use error::TtsServiceError;
pub use language::{detect_language, voice_for_language, LanguageCode, VoiceSelector};
pub use service::{TtsService, TtsServiceApi, PREVIEW_TEXT};
