use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::infrastructure::engine::EngineSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Kokoro server
    pub kokoro_url: String,
    pub kokoro_model: String,
    pub kokoro_api_key: Option<String>,
    pub kokoro_timeout_secs: u64,
    // Synthesis
    pub default_voice: Option<String>,
    pub output_path: PathBuf,
    pub temp_dir: PathBuf,
    pub batch_concurrency: usize,
    pub chunk_max_length: usize,
    pub long_text_threshold: usize,
    pub max_text_length: usize,
    pub max_file_size: u64,
    pub stream_pacing_ms: u64,
    pub preview_cache_enabled: bool,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kokoro_url: "http://localhost:8880".to_string(),
            kokoro_model: "kokoro".to_string(),
            kokoro_api_key: None,
            kokoro_timeout_secs: 120,
            default_voice: Some("af_heart".to_string()),
            output_path: PathBuf::from("kokoro-output.wav"),
            temp_dir: env::temp_dir(),
            batch_concurrency: 8,
            chunk_max_length: 350,
            long_text_threshold: 600,
            max_text_length: 100_000,
            max_file_size: 1024 * 1024,
            stream_pacing_ms: 10,
            preview_cache_enabled: true,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let config = Config {
            kokoro_url: env::var("KOKORO_URL").unwrap_or(defaults.kokoro_url),
            kokoro_model: env::var("KOKORO_MODEL").unwrap_or(defaults.kokoro_model),
            kokoro_api_key: env::var("KOKORO_API_KEY").ok().filter(|k| !k.is_empty()),
            kokoro_timeout_secs: parse_var("KOKORO_TIMEOUT_SECS", defaults.kokoro_timeout_secs)?,
            // Set but empty means "pick a voice from the text's language"
            default_voice: match env::var("DEFAULT_VOICE") {
                Ok(voice) if voice.trim().is_empty() => None,
                Ok(voice) => Some(voice.trim().to_string()),
                Err(_) => defaults.default_voice,
            },
            output_path: env::var("OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_path),
            temp_dir: env::var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            batch_concurrency: parse_var("BATCH_CONCURRENCY", defaults.batch_concurrency)?.max(1),
            chunk_max_length: parse_var("CHUNK_MAX_LENGTH", defaults.chunk_max_length)?.max(1),
            long_text_threshold: parse_var("LONG_TEXT_THRESHOLD", defaults.long_text_threshold)?,
            max_text_length: parse_var("MAX_TEXT_LENGTH", defaults.max_text_length)?,
            max_file_size: parse_var("MAX_FILE_SIZE", defaults.max_file_size)?,
            stream_pacing_ms: parse_var("STREAM_PACING_MS", defaults.stream_pacing_ms)?,
            preview_cache_enabled: env::var("PREVIEW_CACHE_ENABLED")
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(defaults.preview_cache_enabled),
            log_format: env::var("LOG_FORMAT")
                .map(|s| match s.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })
                .unwrap_or(defaults.log_format),
        };

        Ok(config)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            base_url: self.kokoro_url.clone(),
            model_id: self.kokoro_model.clone(),
            api_key: self.kokoro_api_key.clone(),
            timeout: Duration::from_secs(self.kokoro_timeout_secs),
        }
    }

    pub fn stream_pacing(&self) -> Duration {
        Duration::from_millis(self.stream_pacing_ms)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| format!("{}: {}", name, e).into()),
        Err(_) => Ok(default),
    }
}
