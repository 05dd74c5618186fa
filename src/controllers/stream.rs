use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::TextInput;
use crate::{
    domain::{
        shared::SynthesisEvent,
        stream::{StreamControl, StreamService, StreamState},
        tts::SynthesisRequest,
    },
    error::{AppError, AppResult},
    infrastructure::config::Config,
};

#[derive(Debug, Clone, Args)]
pub struct StreamArgs {
    #[command(flatten)]
    pub input: TextInput,
    #[arg(long)]
    pub voice: Option<String>,
    /// Where to write the merged WAV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub struct StreamController {
    stream_service: Arc<StreamService>,
    config: Arc<Config>,
}

impl StreamController {
    pub fn new(stream_service: Arc<StreamService>, config: Arc<Config>) -> Self {
        Self {
            stream_service,
            config,
        }
    }

    /// `stream` - synthesize progressively, printing each chunk file as it lands.
    ///
    /// Lines read from `commands` steer the stream: `p` pauses, `r` resumes,
    /// `c` cancels.
    pub async fn stream<W, R>(&self, args: StreamArgs, commands: R, out: &mut W) -> AppResult<StreamState>
    where
        W: Write,
        R: AsyncBufRead + Unpin,
    {
        let text = args.input.read(self.config.max_file_size, false).await?;
        let mut request = SynthesisRequest::new(text);
        request.voice = args.voice;
        request.output_path = args.output;

        let mut handle = self.stream_service.start_stream(request).await?;
        let control = handle.control();
        writeln!(out, "Streaming... (p = pause, r = resume, c = cancel)")?;

        let mut lines = commands.lines();
        let mut commands_open = true;
        let mut failure = None;

        loop {
            tokio::select! {
                event = handle.next_event() => match event {
                    Some(SynthesisEvent::ChunkReady { index, path }) => {
                        writeln!(out, "chunk {}: {}", index, path.display())?;
                    }
                    Some(SynthesisEvent::Progress { message, .. }) => writeln!(out, "{}", message)?,
                    Some(SynthesisEvent::Complete { path }) => {
                        writeln!(out, "Saved {}", path.display())?;
                    }
                    Some(SynthesisEvent::Failed { message }) => failure = Some(message),
                    None => break,
                },
                line = lines.next_line(), if commands_open => match line {
                    Ok(Some(line)) => apply_command(&control, line.trim(), out)?,
                    Ok(None) | Err(_) => commands_open = false,
                },
            }
        }

        let state = handle.join().await;
        match state {
            StreamState::Failed => Err(AppError::Synthesis(
                failure.unwrap_or_else(|| "stream failed".to_string()),
            )),
            StreamState::Cancelled => {
                writeln!(out, "Stream cancelled")?;
                Ok(state)
            }
            _ => Ok(state),
        }
    }
}

fn apply_command<W: Write>(control: &StreamControl, command: &str, out: &mut W) -> AppResult<()> {
    match command {
        "p" | "pause" => {
            control.pause();
            writeln!(out, "Paused")?;
        }
        "r" | "resume" => {
            control.resume();
            writeln!(out, "Resumed")?;
        }
        "c" | "cancel" => control.cancel(),
        "" => {}
        other => writeln!(out, "Unknown command '{}' (use p, r or c)", other)?,
    }
    Ok(())
}
