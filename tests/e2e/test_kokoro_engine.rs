use crate::e2e::helpers;

use futures::StreamExt;
use helpers::engine_mocks::wav_for;
use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use kokoro_speak::domain::text::tokenize;
use kokoro_speak::infrastructure::engine::{
    token_feed, EngineError, EngineFactory, EngineSettings, KokoroEngine, KokoroEngineFactory,
    SynthesisEngine,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn settings(base_url: String, api_key: Option<&str>) -> EngineSettings {
    EngineSettings {
        base_url,
        model_id: "kokoro".to_string(),
        api_key: api_key.map(str::to_string),
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn it_should_post_speech_requests_and_return_wav_audio() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/audio/speech")
                .header("authorization", "Bearer secret")
                .json_body(json!({
                    "model": "kokoro",
                    "input": "Hello there.",
                    "voice": "af_heart",
                    "response_format": "wav",
                    "stream": false
                }));
            then.status(200)
                .header("content-type", "audio/wav")
                .body(wav_for("Hello there."));
        })
        .await;

    let engine = KokoroEngine::new(&settings(server.base_url(), Some("secret"))).unwrap();
    let audio = engine.generate("Hello there.", "af_heart").await.unwrap();

    mock.assert_async().await;
    assert_eq!(audio.to_wav(), wav_for("Hello there.").as_slice());
    let info = audio.info().unwrap();
    assert_eq!(info.sample_rate, 24_000);
    assert_eq!(info.num_channels, 1);
}

#[tokio::test]
async fn it_should_surface_server_errors_with_status_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/audio/speech");
            then.status(500).body("model not loaded");
        })
        .await;

    let engine = KokoroEngine::new(&settings(server.base_url(), None)).unwrap();
    let err = engine.generate("Hello", "af_heart").await.unwrap_err();

    match err {
        EngineError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "model not loaded");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn it_should_reject_responses_that_are_not_wav() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/audio/speech");
            then.status(200).body("ID3 definitely an mp3");
        })
        .await;

    let engine = KokoroEngine::new(&settings(server.base_url(), None)).unwrap();
    let err = engine.generate("Hello", "af_heart").await.unwrap_err();

    assert!(matches!(err, EngineError::InvalidAudio(_)));
}

#[tokio::test]
async fn it_should_describe_voices_from_their_ids() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/audio/voices");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"voices": ["bm_george", "af_heart", "jf_alpha"]}"#);
        })
        .await;

    let engine = KokoroEngine::new(&settings(format!("{}/", server.base_url()), None)).unwrap();
    let voices = engine.list_voices().await.unwrap();

    assert_eq!(
        voices.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["af_heart", "bm_george", "jf_alpha"]
    );
    assert_eq!(voices["bm_george"].name, "George");
    assert_eq!(voices["bm_george"].gender, "Male");
    assert_eq!(voices["jf_alpha"].language, "ja");
}

#[tokio::test]
async fn it_should_stream_one_request_per_sentence() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/audio/speech")
                .body_contains("\"input\":\"Good morning.\"");
            then.status(200).body(wav_for("Good morning."));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/audio/speech")
                .body_contains("\"input\":\"Nice day\"");
            then.status(200).body(wav_for("Nice day"));
        })
        .await;

    let engine = Arc::new(KokoroEngine::new(&settings(server.base_url(), None)).unwrap());
    let (mut feed, source) = token_feed();
    let mut chunks = engine.stream(source, "af_heart".to_string());
    for token in tokenize("Good morning. Nice day") {
        feed.push(token).unwrap();
    }
    feed.close();

    let mut received = Vec::new();
    while let Some(chunk) = chunks.next().await {
        received.push(chunk.unwrap());
    }

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].audio.to_wav(), wav_for("Good morning.").as_slice());
    assert_eq!(received[1].sequence_index, 1);
}

#[tokio::test]
async fn it_should_probe_the_server_when_creating_an_engine() {
    let server = MockServer::start_async().await;
    let probe = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/audio/voices");
            then.status(200).body(r#"{"voices": ["af_heart"]}"#);
        })
        .await;

    let engine = KokoroEngineFactory
        .create(&settings(server.base_url(), None))
        .await
        .unwrap();

    probe.assert_async().await;
    assert!(engine.list_voices().await.unwrap().contains_key("af_heart"));
}

#[tokio::test]
async fn it_should_fail_initialization_when_the_server_is_unreachable() {
    let err = KokoroEngineFactory
        .create(&settings("http://127.0.0.1:1".to_string(), None))
        .await
        .err()
        .unwrap();

    assert!(matches!(err, EngineError::Init(_)));
    assert!(err.to_string().contains("127.0.0.1:1"));
}
