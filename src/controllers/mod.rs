pub mod health;
pub mod speak;
pub mod stats;
pub mod stream;
pub mod voices;

use clap::Args;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

use crate::{
    domain::text::ValidationError,
    error::AppResult,
    infrastructure::files::load_text_file,
};

/// Where the text to speak comes from
#[derive(Debug, Clone, Default, Args)]
pub struct TextInput {
    /// Text to speak
    pub text: Option<String>,
    /// Read the text from a file instead
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
    /// Accept files over the size limit
    #[arg(long, requires = "file")]
    pub allow_large: bool,
}

impl TextInput {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Resolve the text: the argument, then the file, then stdin when allowed
    pub async fn read(&self, max_file_size: u64, allow_stdin: bool) -> AppResult<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            let loaded = load_text_file(path, max_file_size, self.allow_large).await?;
            return Ok(loaded.content);
        }
        if !allow_stdin {
            return Err(ValidationError::Empty.into());
        }

        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        Ok(text)
    }
}
