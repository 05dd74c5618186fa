use clap::{Parser, Subcommand};
use kokoro_speak::controllers::{
    health::HealthController,
    speak::{SpeakArgs, SpeakController},
    stats::{StatsArgs, StatsController},
    stream::{StreamArgs, StreamController},
    voices::VoicesController,
};
use kokoro_speak::domain::stream::StreamService;
use kokoro_speak::domain::tts::{TtsService, VoiceSelector};
use kokoro_speak::error::AppResult;
use kokoro_speak::infrastructure::config::{Config, LogFormat};
use kokoro_speak::infrastructure::engine::{EngineManager, KokoroEngineFactory};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kokoro-speak", version, about = "Text to speech with a Kokoro server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synthesize text into a WAV file
    Speak(SpeakArgs),
    /// Synthesize progressively; type p, r or c + Enter to pause, resume or cancel
    Stream(StreamArgs),
    /// List available voices
    Voices,
    /// Speak a sample sentence with a voice
    Preview { voice: String },
    /// Show text statistics and estimates
    Stats(StatsArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, exit_code = e.exit_code(), "Command failed");
            eprintln!("Error: {}", e.to_response().message);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli, config: Config) -> AppResult<()> {
    tracing::info!(
        kokoro_url = %config.kokoro_url,
        model = %config.kokoro_model,
        "Starting kokoro-speak"
    );

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Engine (lazily created on first use)
    let engines = Arc::new(EngineManager::new(
        Arc::new(KokoroEngineFactory),
        config.engine_settings(),
    ));

    // 2. Services
    let voices = Arc::new(VoiceSelector::new(config.default_voice.clone()));
    let tts_service = Arc::new(TtsService::new(
        engines.clone(),
        config.clone(),
        voices.clone(),
    ));
    let stream_service = Arc::new(StreamService::new(engines.clone(), config.clone(), voices));

    // 3. Controllers
    let health_controller = HealthController::new(engines);
    let mut stdout = std::io::stdout();

    match cli.command {
        Command::Speak(args) => {
            health_controller.ensure_ready().await?;
            SpeakController::new(tts_service, config)
                .speak(args, &mut stdout)
                .await?;
        }
        Command::Stream(args) => {
            health_controller.ensure_ready().await?;
            let commands = BufReader::new(tokio::io::stdin());
            StreamController::new(stream_service, config)
                .stream(args, commands, &mut stdout)
                .await?;
        }
        Command::Voices => {
            health_controller.ensure_ready().await?;
            VoicesController::new(tts_service)
                .list_voices(&mut stdout)
                .await?;
        }
        Command::Preview { voice } => {
            health_controller.ensure_ready().await?;
            VoicesController::new(tts_service)
                .preview(&voice, &mut stdout)
                .await?;
        }
        Command::Stats(args) => {
            StatsController::new(config).stats(args, &mut stdout).await?;
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "kokoro_speak=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "kokoro_speak=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}
