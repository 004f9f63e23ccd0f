//! Tests for the OpenAI-compatible adapter.

mod common;

use axum::{Json, Router, routing::post};
use common::{Recorder, error, prompt, serve, sse};
use futures_util::StreamExt;
use parking_lot::Mutex;
use reqwest::Client;
use sbcore::{
    Adapter, AdapterConfig, Attachment, Message, Parameters, Prompt, StreamEvent, StreamOptions,
};
use serde_json::{Value, json};
use std::sync::Arc;
use switchboard_model::openai::{self, OpenAI};

fn adapter(vendor: &'static openai::Vendor, model: &str) -> OpenAI {
    let config = AdapterConfig::new(vendor.id.as_str(), "k").with_model(model);
    OpenAI::new(Client::new(), vendor, config).unwrap()
}

fn body(adapter: &OpenAI, prompt: &Prompt) -> Value {
    serde_json::to_value(adapter.request(prompt, false)).unwrap()
}

fn with_image(text: &str) -> Prompt {
    let mut message = Message::user("u1", text);
    message
        .attachments
        .push(Attachment::image("image/png", "aGVsbG8="));
    Prompt::new(message)
}

// --- endpoints ---

#[test]
fn vendor_endpoints() {
    assert_eq!(
        adapter(&openai::OPENAI, "gpt-4o").endpoint(),
        "https://api.openai.com/v1/chat/completions"
    );
    assert_eq!(
        adapter(&openai::PERPLEXITY, "sonar").endpoint(),
        "https://api.perplexity.ai/chat/completions"
    );
}

#[test]
fn base_url_override() {
    let config = AdapterConfig::new("mistral", "k").with_base_url("http://localhost:9999/v1/");
    let adapter = OpenAI::new(Client::new(), &openai::MISTRAL, config).unwrap();
    assert_eq!(adapter.endpoint(), "http://localhost:9999/v1/chat/completions");
}

// --- request shape ---

#[test]
fn message_order() {
    let adapter = adapter(&openai::OPENAI, "gpt-4o");
    let prompt = prompt("third").with_history(vec![
        Message::user("h1", "first"),
        Message::ai("h2", "GPT", "second"),
    ]);
    let body = body(&adapter, &prompt);
    let roles: Vec<_> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    assert_eq!(body["messages"][3]["content"], "third");
    assert_eq!(body["temperature"], 0.7);
    assert!(body.get("max_tokens").is_none());
    assert!(body.get("top_p").is_none());
}

#[test]
fn reasoning_models_always_use_temperature_one() {
    for model in ["gpt-5", "o1", "o3-mini"] {
        let mut config = AdapterConfig::new("openai", "k").with_model(model);
        config.parameters = Parameters {
            temperature: Some(0.2),
            max_tokens: Some(500),
            ..Default::default()
        };
        let adapter = OpenAI::api(Client::new(), config).unwrap();
        let body = body(&adapter, &prompt("hi"));
        assert_eq!(body["temperature"], 1.0, "model: {model}");
        assert_eq!(body["max_completion_tokens"], 500, "model: {model}");
        assert!(body.get("max_tokens").is_none(), "model: {model}");
    }
}

#[test]
fn configured_parameters_are_sent() {
    let mut config = AdapterConfig::new("openai", "k");
    config.parameters = Parameters {
        temperature: Some(0.3),
        max_tokens: Some(256),
        top_p: Some(0.9),
        top_k: None,
    };
    let adapter = OpenAI::api(Client::new(), config).unwrap();
    let body = body(&adapter, &prompt("hi"));
    assert_eq!(body["temperature"], 0.3);
    assert_eq!(body["max_tokens"], 256);
    assert_eq!(body["top_p"], 0.9);
}

#[test]
fn models_without_vision_get_plain_string() {
    for (vendor, model) in [
        (&openai::OPENAI, "o1-mini"),
        (&openai::DEEPSEEK, "deepseek-chat"),
        (&openai::GROK, "grok-3"),
    ] {
        let adapter = adapter(vendor, model);
        let body = body(&adapter, &with_image("describe"));
        assert_eq!(body["messages"][1]["content"], "describe", "model: {model}");
        assert!(!adapter.capabilities().supports_images, "model: {model}");
    }
}

#[test]
fn images_become_data_uri_parts() {
    let adapter = adapter(&openai::OPENAI, "gpt-4o");
    let body = body(&adapter, &with_image("describe"));
    assert_eq!(
        body["messages"][1]["content"],
        json!([
            { "type": "text", "text": "describe" },
            { "type": "image_url", "image_url": { "url": "data:image/png;base64,aGVsbG8=" } },
        ])
    );
}

#[test]
fn documents_become_placeholder_text() {
    let adapter = adapter(&openai::OPENAI, "gpt-4o");
    let prompt = prompt("summarize").with_attachments(vec![Attachment::document(
        "report.pdf",
        "application/pdf",
        "aGVsbG8=",
    )]);
    let body = body(&adapter, &prompt);
    let parts = body["messages"][1]["content"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    let note = parts[1]["text"].as_str().unwrap();
    assert!(note.contains("report.pdf"));
    assert!(note.contains("OpenAI"));
}

#[test]
fn perplexity_always_requests_citations() {
    let perplexity = adapter(&openai::PERPLEXITY, "sonar-pro");
    assert_eq!(body(&perplexity, &prompt("hi"))["return_citations"], true);

    let plain = adapter(&openai::OPENAI, "gpt-4o");
    assert!(body(&plain, &prompt("hi")).get("return_citations").is_none());
}

// --- send ---

#[tokio::test]
async fn send_parses_completion() {
    let recorder = Recorder::default();
    let rec = recorder.clone();
    let router = Router::new().route(
        "/chat/completions",
        post(move |Json(body): Json<Value>| {
            let rec = rec.clone();
            async move {
                rec.push(body);
                Json(json!({
                    "model": "gpt-4o-2024-08-06",
                    "choices": [{ "message": { "role": "assistant", "content": "Hi there" }, "finish_reason": "stop" }],
                    "usage": { "prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7 }
                }))
            }
        }),
    );
    let base = serve(router).await;

    let config = AdapterConfig::new("openai", "k").with_base_url(&base);
    let adapter = OpenAI::api(Client::new(), config).unwrap();
    let response = adapter.send(&prompt("hello")).await.unwrap();

    assert_eq!(response.text(), "Hi there");
    assert_eq!(response.model_used(), Some("gpt-4o-2024-08-06"));
    assert_eq!(response.usage().unwrap().total_tokens, 7);
    assert_eq!(recorder.last()["stream"], false);
}

#[tokio::test]
async fn missing_total_saturates() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async {
            Json(json!({
                "choices": [{ "message": { "content": "ok" } }],
                "usage": { "prompt_tokens": u32::MAX, "completion_tokens": 9 }
            }))
        }),
    );
    let base = serve(router).await;

    let config = AdapterConfig::new("openai", "k").with_base_url(&base);
    let adapter = OpenAI::api(Client::new(), config).unwrap();
    let response = adapter.send(&prompt("hello")).await.unwrap();
    assert_eq!(response.usage().unwrap().total_tokens, u32::MAX);
}

#[tokio::test]
async fn perplexity_citations_are_one_indexed() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async {
            Json(json!({
                "model": "sonar-pro",
                "choices": [{ "message": { "content": "Answer [1][2]" } }],
                "search_results": [
                    { "url": "https://a.example", "title": "A", "snippet": "first" },
                    { "url": "https://b.example", "title": "B" }
                ]
            }))
        }),
    );
    let base = serve(router).await;

    let config = AdapterConfig::new("perplexity", "k").with_base_url(&base);
    let adapter = OpenAI::new(Client::new(), &openai::PERPLEXITY, config).unwrap();
    let response = adapter.send(&prompt("news")).await.unwrap();

    let citations = response.citations();
    assert_eq!(citations.len(), 2);
    assert_eq!(citations[0].index, 1);
    assert_eq!(citations[0].url, "https://a.example");
    assert_eq!(citations[0].snippet.as_deref(), Some("first"));
    assert_eq!(citations[1].index, 2);
    assert_eq!(citations[1].title.as_deref(), Some("B"));
}

#[tokio::test]
async fn error_response_is_wrapped() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { error(401, json!({ "error": { "message": "Invalid key" } })) }),
    );
    let base = serve(router).await;

    let config = AdapterConfig::new("openai", "bad").with_base_url(&base);
    let adapter = OpenAI::api(Client::new(), config).unwrap();
    let err = adapter.send(&prompt("hello")).await.unwrap_err();
    assert_eq!(err.to_string(), "OpenAI API error (401): Invalid key");
}

#[tokio::test]
async fn non_json_error_uses_status_text() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let base = serve(router).await;

    let config = AdapterConfig::new("mistral", "k").with_base_url(&base);
    let adapter = OpenAI::new(Client::new(), &openai::MISTRAL, config).unwrap();
    let err = adapter.send(&prompt("hello")).await.unwrap_err();
    assert_eq!(err.to_string(), "Mistral API error (502): Bad Gateway");
}

// --- stream ---

#[tokio::test]
async fn stream_yields_deltas_and_skips_malformed_frames() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async {
            sse(&[
                r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
                r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
                "{not json",
                r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
                r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
                r#"{"choices":[{"delta":{"content":"after finish"}}]}"#,
                "[DONE]",
            ])
        }),
    );
    let base = serve(router).await;

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let options = StreamOptions::default().on_event(move |event| sink.lock().push(event));

    let config = AdapterConfig::new("openai", "k").with_base_url(&base);
    let adapter = OpenAI::api(Client::new(), config).unwrap();
    let chunks: Vec<String> = adapter
        .stream(prompt("hello"), options)
        .map(Result::unwrap)
        .collect()
        .await;

    assert_eq!(chunks.concat(), "Hello");
    let events = events.lock();
    assert!(matches!(events.first(), Some(StreamEvent::Started { .. })));
    assert_eq!(
        events.last(),
        Some(&StreamEvent::Finished {
            reason: Some("stop".into())
        })
    );
}

#[tokio::test]
async fn stream_emits_perplexity_citations_once() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async {
            sse(&[
                r#"{"choices":[{"delta":{"content":"A"}}],"search_results":[{"url":"https://a.example"}]}"#,
                r#"{"choices":[{"delta":{"content":"B"}}],"search_results":[{"url":"https://a.example"}]}"#,
                "[DONE]",
            ])
        }),
    );
    let base = serve(router).await;

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let options = StreamOptions::default().on_event(move |event| sink.lock().push(event));

    let config = AdapterConfig::new("perplexity", "k").with_base_url(&base);
    let adapter = OpenAI::new(Client::new(), &openai::PERPLEXITY, config).unwrap();
    let chunks: Vec<String> = adapter
        .stream(prompt("news"), options)
        .map(Result::unwrap)
        .collect()
        .await;

    assert_eq!(chunks.concat(), "AB");
    let citations = events
        .lock()
        .iter()
        .filter(|event| matches!(event, StreamEvent::Citations(_)))
        .count();
    assert_eq!(citations, 1);
}

#[tokio::test]
async fn stream_error_status_is_yielded() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { error(429, json!({ "message": "Rate limited" })) }),
    );
    let base = serve(router).await;

    let config = AdapterConfig::new("grok", "k").with_base_url(&base);
    let adapter = OpenAI::new(Client::new(), &openai::GROK, config).unwrap();
    let items: Vec<_> = adapter
        .stream(prompt("hello"), StreamOptions::default())
        .collect()
        .await;

    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].as_ref().unwrap_err().to_string(),
        "Grok API error (429): Rate limited"
    );
}
