use lingua::{Language, LanguageDetector, LanguageDetectorBuilder};
use serde::{Deserialize, Serialize};

/// Languages Kokoro has voices for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "it")]
    Italian,
    #[serde(rename = "pt")]
    Portuguese,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "hi")]
    Hindi,
}

const SUPPORTED: &[Language] = &[
    Language::English,
    Language::Spanish,
    Language::French,
    Language::Italian,
    Language::Portuguese,
    Language::Japanese,
    Language::Chinese,
    Language::Hindi,
];

impl LanguageCode {
    /// Get the ISO 639-1 code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::English => "en",
            LanguageCode::Spanish => "es",
            LanguageCode::French => "fr",
            LanguageCode::Italian => "it",
            LanguageCode::Portuguese => "pt",
            LanguageCode::Japanese => "ja",
            LanguageCode::Chinese => "zh",
            LanguageCode::Hindi => "hi",
        }
    }

    pub fn from_lingua(language: Language) -> Self {
        match language {
            Language::English => LanguageCode::English,
            Language::Spanish => LanguageCode::Spanish,
            Language::French => LanguageCode::French,
            Language::Italian => LanguageCode::Italian,
            Language::Portuguese => LanguageCode::Portuguese,
            Language::Japanese => LanguageCode::Japanese,
            Language::Chinese => LanguageCode::Chinese,
            Language::Hindi => LanguageCode::Hindi,
            #[allow(unreachable_patterns)]
            _ => LanguageCode::English,
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn build_detector() -> LanguageDetector {
    LanguageDetectorBuilder::from_languages(SUPPORTED).build()
}

/// Chooses the voice for a request: the one asked for, else the configured
/// default, else a voice for the detected language of the text.
pub struct VoiceSelector {
    default_voice: Option<String>,
    detector: LanguageDetector,
}

impl VoiceSelector {
    pub fn new(default_voice: Option<String>) -> Self {
        Self {
            default_voice: default_voice.filter(|v| !v.trim().is_empty()),
            detector: build_detector(),
        }
    }

    pub fn select(&self, requested: Option<&str>, text: &str) -> String {
        if let Some(voice) = requested.map(str::trim).filter(|v| !v.is_empty()) {
            return voice.to_string();
        }
        if let Some(voice) = &self.default_voice {
            return voice.clone();
        }

        let language = detect_language(&self.detector, text);
        let voice = voice_for_language(language);
        tracing::info!(language_detected = %language, voice = voice, "Voice selected from language");
        voice.to_string()
    }
}

/// Detect the language of the given text, falling back to English
pub fn detect_language(detector: &LanguageDetector, text: &str) -> LanguageCode {
    match detector.detect_language_of(text) {
        Some(language) => LanguageCode::from_lingua(language),
        None => {
            tracing::warn!("Could not detect language, falling back to English");
            LanguageCode::English
        }
    }
}

/// Kokoro voice used when the caller did not pick one
pub fn voice_for_language(language: LanguageCode) -> &'static str {
    match language {
        LanguageCode::English => "af_heart",
        LanguageCode::Spanish => "ef_dora",
        LanguageCode::French => "ff_siwis",
        LanguageCode::Italian => "if_sara",
        LanguageCode::Portuguese => "pf_dora",
        LanguageCode::Japanese => "jf_alpha",
        LanguageCode::Chinese => "zf_xiaobei",
        LanguageCode::Hindi => "hf_alpha",
    }
}
