//! Tests for the OpenAI Responses adapter.

mod common;

use axum::{Json, Router, routing::post};
use common::{Recorder, error, prompt, serve, sse, stalled_sse};
use futures_util::StreamExt;
use reqwest::Client;
use sbcore::{Adapter, AdapterConfig, Attachment, Error, Message, Parameters, StreamOptions};
use serde_json::{Value, json};
use std::time::Duration;
use switchboard_model::{Responses, responses};

fn adapter(config: AdapterConfig) -> Responses {
    Responses::new(Client::new(), config).unwrap()
}

fn config() -> AdapterConfig {
    AdapterConfig::new("openai-responses", "k")
}

async fn local(router: Router) -> Responses {
    let base = serve(router).await;
    adapter(config().with_base_url(format!("{base}/v1")))
}

// --- request shape ---

#[test]
fn input_is_system_history_then_user() {
    let mut config = config();
    config.parameters = Parameters {
        temperature: Some(0.3),
        max_tokens: Some(900),
        ..Parameters::default()
    };
    let adapter = adapter(config);
    assert_eq!(adapter.endpoint(), responses::ENDPOINT);

    let prompt = prompt("next").with_history(vec![Message::ai("h1", "GPT", "earlier")]);
    let body = serde_json::to_value(adapter.request(&prompt, true)).unwrap();

    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["temperature"], 1.0);
    assert_eq!(body["max_output_tokens"], 900);
    assert_eq!(body["stream"], true);
    assert_eq!(
        body["input"],
        json!([
            { "role": "system", "content": sbcore::DEFAULT_PROMPT },
            { "role": "assistant", "content": "earlier" },
            { "role": "user", "content": "next" },
        ])
    );
}

#[test]
fn images_need_a_vision_model() {
    let image = vec![Attachment::image("image/png", "aW1n")];

    let vision = adapter(config());
    let body = serde_json::to_value(vision.request(&prompt("see").with_attachments(image.clone()), false))
        .unwrap();
    assert_eq!(
        body["input"][1]["content"],
        json!([
            { "type": "input_text", "text": "see" },
            { "type": "input_image", "image_url": "data:image/png;base64,aW1n" },
        ])
    );
    assert!(vision.capabilities().supports_images);

    let text_only = adapter(config().with_model("o1-mini"));
    let body = serde_json::to_value(text_only.request(&prompt("see").with_attachments(image), false))
        .unwrap();
    assert_eq!(body["input"][1]["content"], "see");
    assert!(!text_only.capabilities().attachments);
}

// --- send ---

#[tokio::test]
async fn send_collects_output_text() {
    let recorder = Recorder::default();
    let rec = recorder.clone();
    let router = Router::new().route(
        "/v1/responses",
        post(move |Json(body): Json<Value>| {
            let rec = rec.clone();
            async move {
                rec.push(body);
                Json(json!({
                    "id": "resp_1",
                    "model": "gpt-4o-2024-08-06",
                    "status": "completed",
                    "output": [{
                        "type": "message",
                        "role": "assistant",
                        "content": [
                            { "type": "output_text", "text": "Hello" },
                            { "type": "refusal", "refusal": "" },
                            { "type": "output_text", "text": " world" }
                        ]
                    }],
                    "usage": { "input_tokens": 8, "output_tokens": 2 }
                }))
            }
        }),
    );
    let adapter = local(router).await;

    let response = adapter.send(&prompt("hi")).await.unwrap();
    assert_eq!(response.text(), "Hello world");
    assert_eq!(response.model_used(), Some("gpt-4o-2024-08-06"));
    assert_eq!(response.usage().unwrap().total_tokens, 10);
    assert_eq!(recorder.last()["stream"], false);
}

#[tokio::test]
async fn send_error_is_wrapped() {
    let router = Router::new().route(
        "/v1/responses",
        post(|| async { error(404, json!({ "error": { "message": "model not found" } })) }),
    );
    let adapter = local(router).await;

    let err = adapter.send(&prompt("hi")).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "OpenAI Responses API error (404): model not found"
    );
}

// --- stream ---

#[tokio::test]
async fn stream_accepts_both_delta_shapes() {
    let router = Router::new().route(
        "/v1/responses",
        post(|| async {
            sse(&[
                r#"{"type":"response.created","response":{"model":"gpt-4o","status":"in_progress"}}"#,
                r#"{"type":"response.output_text.delta","delta":"Hel"}"#,
                r#"{"type":"response.in_progress"}"#,
                r#"{"type":"response.text.delta","delta":{"text":"lo"}}"#,
                r#"{"type":"response.completed","response":{"status":"completed","usage":{"input_tokens":1,"output_tokens":2}}}"#,
                r#"{"type":"response.output_text.delta","delta":"late"}"#,
            ])
        }),
    );
    let adapter = local(router).await;

    let chunks: Vec<String> = adapter
        .stream(prompt("hi"), StreamOptions::default())
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(chunks, vec!["Hel", "lo"]);
}

#[tokio::test]
async fn stream_error_event_fails() {
    let router = Router::new().route(
        "/v1/responses",
        post(|| async {
            sse(&[
                r#"{"type":"response.output_text.delta","delta":"Hi"}"#,
                r#"{"type":"error","message":"quota exceeded"}"#,
            ])
        }),
    );
    let adapter = local(router).await;

    let items: Vec<_> = adapter
        .stream(prompt("hi"), StreamOptions::default())
        .collect()
        .await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_deref().unwrap(), "Hi");
    assert_eq!(
        items[1].as_ref().unwrap_err().to_string(),
        "OpenAI Responses stream error: quota exceeded"
    );
}

#[tokio::test]
async fn stream_failed_response_fails() {
    let router = Router::new().route(
        "/v1/responses",
        post(|| async {
            sse(&[
                r#"{"type":"response.failed","response":{"status":"failed","error":{"code":"server_error","message":"try again"}}}"#,
            ])
        }),
    );
    let adapter = local(router).await;

    let items: Vec<_> = adapter
        .stream(prompt("hi"), StreamOptions::default())
        .collect()
        .await;
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].as_ref().unwrap_err().to_string(),
        "OpenAI Responses stream error: try again"
    );
}

#[tokio::test]
async fn stream_stops_at_the_ceiling() {
    let router = Router::new().route(
        "/v1/responses",
        post(|| async { stalled_sse(&[r#"{"type":"response.output_text.delta","delta":"Hi"}"#]) }),
    );
    let adapter = local(router)
        .await
        .with_ceiling(Duration::from_millis(100));
    assert_eq!(responses::STREAM_CEILING, Duration::from_secs(180));

    let items: Vec<_> = adapter
        .stream(prompt("hi"), StreamOptions::default())
        .collect()
        .await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_deref().unwrap(), "Hi");
    assert!(matches!(
        items[1],
        Err(Error::Timeout { ref provider, .. }) if provider == "OpenAI Responses"
    ));
}
