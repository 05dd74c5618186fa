use clap::{Args, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::TextInput;
use crate::{
    domain::{
        shared::SynthesisEvent,
        text::{estimate_speech_duration, format_duration},
        tts::{SynthesisRequest, SynthesisResult, TtsService, TtsServiceApi},
    },
    error::AppResult,
    infrastructure::config::Config,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SpeakMode {
    /// Batch for long text, single call otherwise
    #[default]
    Auto,
    /// Always one engine call
    Short,
    /// Always chunked batch synthesis
    Long,
}

#[derive(Debug, Clone, Args)]
pub struct SpeakArgs {
    #[command(flatten)]
    pub input: TextInput,
    /// Kokoro voice id, e.g. af_heart
    #[arg(long)]
    pub voice: Option<String>,
    /// Where to write the WAV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = SpeakMode::Auto)]
    pub mode: SpeakMode,
}

pub struct SpeakController {
    tts_service: Arc<TtsService>,
    config: Arc<Config>,
}

impl SpeakController {
    pub fn new(tts_service: Arc<TtsService>, config: Arc<Config>) -> Self {
        Self {
            tts_service,
            config,
        }
    }

    /// `speak` - synthesize text to a WAV file
    pub async fn speak<W: Write>(&self, args: SpeakArgs, out: &mut W) -> AppResult<SynthesisResult> {
        let text = args.input.read(self.config.max_file_size, true).await?;
        writeln!(
            out,
            "Speaking {} characters (about {})",
            text.trim().chars().count(),
            format_duration(estimate_speech_duration(&text))
        )?;

        let mode = args.mode;
        let mut request = SynthesisRequest::new(text);
        request.voice = args.voice;
        request.output_path = args.output;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = self.tts_service.clone();
        let synthesis = async move {
            match mode {
                SpeakMode::Auto => service.speak(request, Some(tx)).await,
                SpeakMode::Long => service.synthesize_long(request, Some(tx)).await,
                SpeakMode::Short => {
                    drop(tx);
                    service.synthesize(request).await
                }
            }
        };
        let report = async {
            while let Some(event) = rx.recv().await {
                if let SynthesisEvent::Progress { message, .. } = event {
                    writeln!(out, "{}", message)?;
                }
            }
            Ok::<_, std::io::Error>(())
        };

        let (result, reported) = tokio::join!(synthesis, report);
        reported?;
        let result = result?;

        writeln!(
            out,
            "Saved {} ({} chunk{}, voice {}{})",
            result.output_path.display(),
            result.chunk_count,
            if result.chunk_count == 1 { "" } else { "s" },
            result.voice,
            result
                .duration_secs
                .map(|secs| format!(", {:.1}s", secs))
                .unwrap_or_default()
        )?;
        Ok(result)
    }
}
