use crate::e2e::helpers;

use helpers::assertions::assert_wav_spells;
use helpers::fixtures::{expected_chunks, THREE_SENTENCES};
use helpers::TestContext;
use kokoro_speak::controllers::speak::{SpeakArgs, SpeakController, SpeakMode};
use kokoro_speak::controllers::stats::{StatsArgs, StatsController};
use kokoro_speak::controllers::stream::{StreamArgs, StreamController};
use kokoro_speak::controllers::voices::VoicesController;
use kokoro_speak::controllers::TextInput;
use kokoro_speak::domain::stream::StreamState;
use kokoro_speak::domain::text::ValidationError;
use kokoro_speak::domain::tts::SynthesisRequest;
use kokoro_speak::error::AppError;
use pretty_assertions::assert_eq;
use std::time::Duration;

fn speak_args(input: TextInput, output: std::path::PathBuf, mode: SpeakMode) -> SpeakArgs {
    SpeakArgs {
        input,
        voice: None,
        output: Some(output),
        mode,
    }
}

fn printed(out: Vec<u8>) -> String {
    String::from_utf8(out).expect("controller output should be UTF-8")
}

#[tokio::test]
async fn it_should_speak_short_text_in_one_call() {
    let ctx = TestContext::new();
    let controller = SpeakController::new(ctx.tts_service.clone(), ctx.config.clone());
    let output = ctx.path("short.wav");
    let mut out = Vec::new();

    let result = controller
        .speak(
            speak_args(TextInput::from_text("Hello there."), output.clone(), SpeakMode::Auto),
            &mut out,
        )
        .await
        .unwrap();

    assert_eq!(result.chunk_count, 1);
    assert_eq!(ctx.engine.calls(), vec!["Hello there."]);
    assert_wav_spells(&output, &["Hello there.".to_string()]);
    assert!(printed(out).contains(&format!("Saved {}", output.display())));
}

#[tokio::test]
async fn it_should_create_missing_output_directories() {
    let ctx = TestContext::new();
    let controller = SpeakController::new(ctx.tts_service.clone(), ctx.config.clone());
    let output = ctx.path("renders/today/short.wav");

    controller
        .speak(
            speak_args(TextInput::from_text("Hello there."), output.clone(), SpeakMode::Short),
            &mut std::io::sink(),
        )
        .await
        .unwrap();

    assert_wav_spells(&output, &["Hello there.".to_string()]);
}

#[tokio::test]
async fn it_should_switch_to_batch_synthesis_for_long_text() {
    let ctx = TestContext::with_config(|c| {
        c.long_text_threshold = 20;
        c.chunk_max_length = 40;
    });
    let controller = SpeakController::new(ctx.tts_service.clone(), ctx.config.clone());
    let output = ctx.path("long.wav");
    let mut out = Vec::new();

    let result = controller
        .speak(
            speak_args(TextInput::from_text(THREE_SENTENCES), output.clone(), SpeakMode::Auto),
            &mut out,
        )
        .await
        .unwrap();

    assert_eq!(result.chunk_count, 3);
    assert_wav_spells(&output, &expected_chunks(THREE_SENTENCES, 40));
    let printed = printed(out);
    assert!(printed.contains("Processing... 100%"));
    assert!(printed.contains("3 chunks"));
}

#[tokio::test]
async fn it_should_honor_an_explicit_short_mode() {
    let ctx = TestContext::with_config(|c| {
        c.long_text_threshold = 20;
        c.chunk_max_length = 40;
    });
    let controller = SpeakController::new(ctx.tts_service.clone(), ctx.config.clone());

    let result = controller
        .speak(
            speak_args(
                TextInput::from_text(THREE_SENTENCES),
                ctx.path("forced.wav"),
                SpeakMode::Short,
            ),
            &mut std::io::sink(),
        )
        .await
        .unwrap();

    assert_eq!(result.chunk_count, 1);
    assert_eq!(ctx.engine.calls(), vec![THREE_SENTENCES]);
}

#[tokio::test]
async fn it_should_speak_text_read_from_a_file() {
    let ctx = TestContext::new();
    let input_path = ctx.path("input.txt");
    std::fs::write(&input_path, "From a file.\n").unwrap();
    let controller = SpeakController::new(ctx.tts_service.clone(), ctx.config.clone());

    let input = TextInput {
        file: Some(input_path),
        ..TextInput::default()
    };
    controller
        .speak(speak_args(input, ctx.path("file.wav"), SpeakMode::Auto), &mut std::io::sink())
        .await
        .unwrap();

    assert_eq!(ctx.engine.calls(), vec!["From a file."]);
}

#[tokio::test]
async fn it_should_refuse_files_over_the_size_limit() {
    let ctx = TestContext::with_config(|c| c.max_file_size = 8);
    let input_path = ctx.path("big.txt");
    std::fs::write(&input_path, "This file is larger than eight bytes.").unwrap();
    let controller = SpeakController::new(ctx.tts_service.clone(), ctx.config.clone());

    let input = TextInput {
        file: Some(input_path.clone()),
        ..TextInput::default()
    };
    let err = controller
        .speak(speak_args(input, ctx.path("big.wav"), SpeakMode::Auto), &mut std::io::sink())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Validation(ValidationError::FileTooLarge { max: 8, .. })
    ));
    assert_eq!(err.exit_code(), 2);
    assert!(ctx.engine.calls().is_empty());

    // Same file goes through when explicitly allowed
    let input = TextInput {
        file: Some(input_path),
        allow_large: true,
        ..TextInput::default()
    };
    controller
        .speak(speak_args(input, ctx.path("big.wav"), SpeakMode::Auto), &mut std::io::sink())
        .await
        .unwrap();
    assert_eq!(ctx.engine.calls().len(), 1);
}

#[tokio::test]
async fn it_should_report_engine_failures_as_synthesis_errors() {
    let ctx = TestContext::new();
    ctx.engine.fail_when("Hello");
    let controller = SpeakController::new(ctx.tts_service.clone(), ctx.config.clone());

    let err = controller
        .speak(
            speak_args(TextInput::from_text("Hello there."), ctx.path("x.wav"), SpeakMode::Auto),
            &mut std::io::sink(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Synthesis(_)));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn it_should_print_text_statistics() {
    let ctx = TestContext::new();
    let controller = StatsController::new(ctx.config.clone());
    let mut out = Vec::new();

    let stats = controller
        .stats(
            StatsArgs {
                input: TextInput::from_text("One two three. Four five!"),
            },
            &mut out,
        )
        .await
        .unwrap();

    assert_eq!(stats.words, 5);
    assert_eq!(stats.sentences, 2);
    assert_eq!(stats.estimated_chunks, 1);
    let printed = printed(out);
    assert!(printed.contains("Words:             5"));
    assert!(printed.contains("Speech duration:   0:02"));
    assert!(!printed.contains("Warning"));
}

#[tokio::test]
async fn it_should_warn_when_stats_exceed_the_length_limit() {
    let ctx = TestContext::with_config(|c| c.max_text_length = 5);
    let controller = StatsController::new(ctx.config.clone());
    let mut out = Vec::new();

    controller
        .stats(
            StatsArgs {
                input: TextInput::from_text("Far more than five characters."),
            },
            &mut out,
        )
        .await
        .unwrap();

    assert!(printed(out).contains("Warning: longer than the 5 character limit"));
}

#[tokio::test]
async fn it_should_list_voices_as_a_table() {
    let ctx = TestContext::new();
    let controller = VoicesController::new(ctx.tts_service.clone());
    let mut out = Vec::new();

    let count = controller.list_voices(&mut out).await.unwrap();

    assert_eq!(count, 2);
    let printed = printed(out);
    let lines: Vec<&str> = printed.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("VOICE"));
    assert!(lines[1].starts_with("af_heart"));
    assert!(lines[2].contains("George"));
    assert!(lines[2].contains("(grade A)"));
}

#[tokio::test]
async fn it_should_reuse_cached_previews() {
    let ctx = TestContext::with_config(|c| c.preview_cache_enabled = true);
    let controller = VoicesController::new(ctx.tts_service.clone());

    let first = controller.preview("bm_george", &mut std::io::sink()).await.unwrap();
    let second = controller.preview("bm_george", &mut std::io::sink()).await.unwrap();

    assert_eq!(ctx.engine.calls().len(), 1);
    assert_ne!(first, second);
    assert_eq!(ctx.files_starting_with("kokoro-voice-preview-").len(), 2);
    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[tokio::test]
async fn it_should_synthesize_every_preview_without_a_cache() {
    let ctx = TestContext::new();
    let controller = VoicesController::new(ctx.tts_service.clone());

    controller.preview("af_heart", &mut std::io::sink()).await.unwrap();
    controller.preview("af_heart", &mut std::io::sink()).await.unwrap();

    assert_eq!(ctx.engine.calls().len(), 2);
}

#[tokio::test]
async fn it_should_cancel_a_stream_from_a_command_line() {
    let ctx = TestContext::new();
    ctx.engine.set_stream_delay(Duration::from_millis(200));
    let controller = StreamController::new(ctx.stream_service.clone(), ctx.config.clone());
    let output = ctx.path("stream.wav");
    let mut out = Vec::new();

    let args = StreamArgs {
        input: TextInput::from_text("one two three"),
        voice: None,
        output: Some(output.clone()),
    };
    let state = controller.stream(args, &b"c\n"[..], &mut out).await.unwrap();

    assert_eq!(state, StreamState::Cancelled);
    assert!(printed(out).contains("Stream cancelled"));
    assert!(!output.exists());
}

#[tokio::test]
async fn it_should_stream_to_completion_without_commands() {
    let ctx = TestContext::new();
    let controller = StreamController::new(ctx.stream_service.clone(), ctx.config.clone());
    let output = ctx.path("stream.wav");
    let mut out = Vec::new();

    let args = StreamArgs {
        input: TextInput::from_text("Hello there."),
        voice: Some("bm_george".to_string()),
        output: Some(output.clone()),
    };
    let state = controller.stream(args, &b""[..], &mut out).await.unwrap();

    assert_eq!(state, StreamState::Completed);
    let printed = printed(out);
    assert!(printed.contains("chunk 0:"));
    assert!(printed.contains("chunk 1:"));
    assert!(printed.contains(&format!("Saved {}", output.display())));
    assert!(output.exists());
}

#[tokio::test]
async fn it_should_turn_a_failed_stream_into_an_error() {
    let ctx = TestContext::new();
    ctx.engine.fail_when("two");
    let controller = StreamController::new(ctx.stream_service.clone(), ctx.config.clone());

    let args = StreamArgs {
        input: TextInput::from_text("one two"),
        voice: None,
        output: Some(ctx.path("failed.wav")),
    };
    let err = controller
        .stream(args, &b""[..], &mut std::io::sink())
        .await
        .unwrap_err();

    match err {
        AppError::Synthesis(message) => assert!(message.starts_with("Streaming error:")),
        other => panic!("expected a synthesis error, got {other:?}"),
    }
}

#[tokio::test]
async fn it_should_refuse_a_stream_while_another_runs() {
    let ctx = TestContext::new();
    ctx.engine.set_stream_delay(Duration::from_millis(200));
    let controller = StreamController::new(ctx.stream_service.clone(), ctx.config.clone());

    let running = ctx
        .stream_service
        .start_stream(SynthesisRequest::new("one two"))
        .await
        .unwrap();

    let args = StreamArgs {
        input: TextInput::from_text("another"),
        voice: None,
        output: None,
    };
    let err = controller
        .stream(args, &b""[..], &mut std::io::sink())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    running.control().cancel();
    assert_eq!(running.join().await, StreamState::Cancelled);
}
