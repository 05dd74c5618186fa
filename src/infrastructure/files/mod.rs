use std::io::Read;
use std::path::{Path, PathBuf};

use html2text::from_read;
use uuid::Uuid;

use crate::domain::text::ValidationError;

/// Extensions accepted without sniffing the content
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "html", "htm", "js", "ts", "json", "css", "csv", "xml", "ini", "log", "yml",
    "yaml", "py", "java", "c", "cpp", "rb", "go",
];

/// Bytes inspected when guessing whether a file is text
pub const SNIFF_BYTES: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedText {
    pub path: PathBuf,
    pub content: String,
    pub size: u64,
}

pub fn is_known_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// True when the first `sample_size` bytes are printable ASCII, tab, LF or CR.
/// Unreadable files are not text.
pub fn is_probably_text_content(path: &Path, sample_size: usize) -> bool {
    let mut sample = Vec::with_capacity(sample_size);
    let read = std::fs::File::open(path)
        .and_then(|file| file.take(sample_size as u64).read_to_end(&mut sample));
    if read.is_err() {
        return false;
    }

    sample
        .iter()
        .all(|&b| (0x20..=0x7E).contains(&b) || matches!(b, b'\t' | b'\n' | b'\r'))
}

pub fn is_valid_text_file(path: &Path) -> bool {
    is_known_text_extension(path) || is_probably_text_content(path, SNIFF_BYTES)
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_lowercase().as_str(), "html" | "htm"))
        .unwrap_or(false)
}

/// Read a text file for synthesis.
///
/// Files over `max_size` bytes are refused unless `allow_large` is set.
/// HTML is reduced to its readable text.
pub async fn load_text_file(
    path: &Path,
    max_size: u64,
    allow_large: bool,
) -> Result<LoadedText, ValidationError> {
    let shown = path.display().to_string();

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ValidationError::InvalidFile(format!("{}: {}", shown, e)))?;
    if !metadata.is_file() || !is_valid_text_file(path) {
        return Err(ValidationError::InvalidFile(shown));
    }

    let size = metadata.len();
    if size > max_size && !allow_large {
        return Err(ValidationError::FileTooLarge {
            path: shown,
            size,
            max: max_size,
        });
    }
    if size > max_size {
        tracing::warn!(path = %shown, size, max_size, "Loading large text file");
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ValidationError::InvalidFile(format!("{}: {}", shown, e)))?;
    let raw = String::from_utf8_lossy(&bytes);

    let content = if is_html(path) {
        from_read(raw.as_bytes(), usize::MAX)
    } else {
        raw.into_owned()
    };

    tracing::info!(path = %shown, size, characters = content.chars().count(), "Text file loaded");

    Ok(LoadedText {
        path: path.to_path_buf(),
        content,
        size,
    })
}

/// Temporary file for one streamed chunk
pub fn chunk_path(dir: &Path, session_id: Uuid, index: usize) -> PathBuf {
    dir.join(format!("kokoro-chunk-{}-{}.wav", session_id, index))
}

/// Default final file of a stream when the caller gave none
pub fn stream_output_path(dir: &Path, session_id: Uuid) -> PathBuf {
    dir.join(format!("kokoro-final-{}.wav", session_id))
}

pub fn preview_path(dir: &Path) -> PathBuf {
    dir.join(format!("kokoro-voice-preview-{}.wav", Uuid::new_v4()))
}

/// Write a file, creating missing parent directories first
pub async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}
