use fablespeak::catalog::{Language, VoiceName};
use fablespeak::config::Config;
use fablespeak::error::GenerationError;
use fablespeak::gemini::{FALLBACK_STORY, GeminiClient, StoryGenerator, StoryRequest};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

struct CapturedRequest {
    request_line: String,
    headers: String,
    body: Value,
}

/// Canned HTTP responder: answers each connection with the next (status, body) pair.
async fn stub_provider(responses: Vec<(u16, Value)>) -> (String, JoinHandle<Vec<CapturedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut captured = Vec::new();
        for (status, body) in responses {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let header_end = loop {
                let n = sock.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            while buf.len() < header_end + content_length {
                let n = sock.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending body");
                buf.extend_from_slice(&chunk[..n]);
            }

            let (request_line, headers) = head.split_once("\r\n").unwrap();
            captured.push(CapturedRequest {
                request_line: request_line.to_string(),
                headers: headers.to_ascii_lowercase(),
                body: serde_json::from_slice(&buf[header_end..header_end + content_length])
                    .unwrap(),
            });

            let payload = body.to_string();
            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                payload.len(),
                payload
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
        }
        captured
    });
    (base, handle)
}

fn client_for(base: &str) -> GeminiClient {
    let config = Config {
        api_base_url: base.to_string(),
        text_model: "text-model".to_string(),
        tts_model: "speech-model".to_string(),
        ..Config::default()
    };
    GeminiClient::new("test-key", &config).unwrap()
}

fn request() -> StoryRequest {
    StoryRequest {
        prompt: "a lantern that remembers".to_string(),
        voice: VoiceName::Zephyr,
        tone: "dreamy".to_string(),
        language: Language::Hi,
    }
}

fn text_reply(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

fn audio_reply(data: &str) -> Value {
    json!({ "candidates": [{ "content": { "parts": [
        { "inlineData": { "mimeType": "audio/L16;codec=pcm;rate=24000", "data": data } }
    ] } }] })
}

#[tokio::test]
async fn generates_text_then_speech() {
    let (base, server) = stub_provider(vec![
        (200, text_reply("The lantern glowed.")),
        (200, audio_reply("AACAAA==")),
    ])
    .await;

    let story = client_for(&base).generate(&request()).await.unwrap();
    assert_eq!(story.content, "The lantern glowed.");
    assert_eq!(story.audio_base64.as_deref(), Some("AACAAA=="));

    let captured = server.await.unwrap();
    assert_eq!(captured.len(), 2);

    let text = &captured[0];
    assert!(text
        .request_line
        .starts_with("POST /v1beta/models/text-model:generateContent"));
    assert!(text.headers.contains("x-goog-api-key: test-key"));
    assert_eq!(text.body["contents"][0]["parts"][0]["text"], "a lantern that remembers");
    let instruction = text.body["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap();
    assert!(instruction.contains("HINDI (Use Devanagari)"));

    let speech = &captured[1];
    assert!(speech
        .request_line
        .starts_with("POST /v1beta/models/speech-model:generateContent"));
    assert_eq!(
        speech.body["contents"][0]["parts"][0]["text"],
        "Speak in a dreamy tone: The lantern glowed."
    );
    assert_eq!(
        speech.body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
        "Zephyr"
    );
}

#[tokio::test]
async fn empty_text_falls_back_and_missing_audio_is_none() {
    let (base, server) = stub_provider(vec![
        (200, json!({ "candidates": [] })),
        (200, json!({ "candidates": [{ "content": { "parts": [] } }] })),
    ])
    .await;

    let story = client_for(&base).generate(&request()).await.unwrap();
    assert_eq!(story.content, FALLBACK_STORY);
    assert!(story.audio_base64.is_none());

    let captured = server.await.unwrap();
    assert_eq!(
        captured[1].body["contents"][0]["parts"][0]["text"],
        format!("Speak in a dreamy tone: {}", FALLBACK_STORY)
    );
}

#[tokio::test]
async fn error_status_is_reported_without_retry() {
    let (base, server) = stub_provider(vec![(
        403,
        json!({ "error": { "code": 403, "message": "API key not valid" } }),
    )])
    .await;

    let err = client_for(&base).generate(&request()).await.unwrap_err();
    match err {
        GenerationError::Status { status, body } => {
            assert_eq!(status.as_u16(), 403);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(server.await.unwrap().len(), 1);
}
