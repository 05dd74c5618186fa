use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    domain::tts::{TtsService, TtsServiceApi},
    error::AppResult,
};

pub struct VoicesController {
    tts_service: Arc<TtsService>,
}

impl VoicesController {
    pub fn new(tts_service: Arc<TtsService>) -> Self {
        Self { tts_service }
    }

    /// `voices` - print every voice the engine offers
    pub async fn list_voices<W: Write>(&self, out: &mut W) -> AppResult<usize> {
        let voices = self.tts_service.list_voices().await?;

        writeln!(out, "{:<16} {:<14} {:<8} {}", "VOICE", "NAME", "GENDER", "LANGUAGE")?;
        for (id, info) in &voices {
            write!(out, "{:<16} {:<14} {:<8} {}", id, info.name, info.gender, info.language)?;
            if let Some(grade) = &info.overall_grade {
                write!(out, " (grade {})", grade)?;
            }
            writeln!(out)?;
        }
        Ok(voices.len())
    }

    /// `preview VOICE` - speak a sample sentence and print the file path
    pub async fn preview<W: Write>(&self, voice: &str, out: &mut W) -> AppResult<PathBuf> {
        let path = self.tts_service.preview_voice(voice).await?;
        writeln!(out, "{}", path.display())?;
        Ok(path)
    }
}
