//! Local vendor stand-ins for adapter tests.
#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, Bytes},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures_util::{StreamExt, stream};
use parking_lot::Mutex;
use sbcore::{Message, Prompt};
use serde_json::Value;
use std::{convert::Infallible, sync::Arc};

/// Serve `router` on an ephemeral port and return its base url.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// An SSE body with one `data:` line per payload.
pub fn sse(payloads: &[&str]) -> Response {
    let body: String = payloads
        .iter()
        .map(|data| format!("data: {data}\n\n"))
        .collect();
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

/// An SSE body that sends `payloads` and then holds the connection open.
pub fn stalled_sse(payloads: &[&str]) -> Response {
    let frames: Vec<Result<Bytes, Infallible>> = payloads
        .iter()
        .map(|data| Ok(Bytes::from(format!("data: {data}\n\n"))))
        .collect();
    let body = Body::from_stream(stream::iter(frames).chain(stream::pending()));
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

/// A JSON error response.
pub fn error(status: u16, body: Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap();
    (status, axum::Json(body)).into_response()
}

/// Captured request bodies.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Value>>>);

impl Recorder {
    pub fn push(&self, body: Value) {
        self.0.lock().push(body);
    }

    pub fn count(&self) -> usize {
        self.0.lock().len()
    }

    pub fn last(&self) -> Value {
        self.0.lock().last().cloned().unwrap_or_default()
    }
}

/// A prompt with no history.
pub fn prompt(text: &str) -> Prompt {
    Prompt::new(Message::user("u1", text))
}
