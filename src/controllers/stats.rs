use clap::Args;
use std::io::Write;
use std::sync::Arc;

use super::TextInput;
use crate::{
    domain::text::{
        estimate_processing_time, estimate_speech_duration, format_duration, normalize,
        text_stats, TextStats,
    },
    error::AppResult,
    infrastructure::config::Config,
};

#[derive(Debug, Clone, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub input: TextInput,
}

pub struct StatsController {
    config: Arc<Config>,
}

impl StatsController {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// `stats` - describe the text without synthesizing it
    pub async fn stats<W: Write>(&self, args: StatsArgs, out: &mut W) -> AppResult<TextStats> {
        let text = args.input.read(self.config.max_file_size, true).await?;
        let text = normalize(&text);
        let stats = text_stats(&text);

        writeln!(out, "Characters:        {}", stats.characters)?;
        writeln!(out, "Words:             {}", stats.words)?;
        writeln!(out, "Sentences:         {}", stats.sentences)?;
        writeln!(out, "Estimated chunks:  {}", stats.estimated_chunks)?;
        writeln!(
            out,
            "Speech duration:   {}",
            format_duration(estimate_speech_duration(&text))
        )?;
        writeln!(
            out,
            "Processing time:   ~{} ms",
            estimate_processing_time(&text, 50, 1000)
        )?;
        if stats.characters > self.config.max_text_length {
            writeln!(
                out,
                "Warning: longer than the {} character limit",
                self.config.max_text_length
            )?;
        }
        Ok(stats)
    }
}
