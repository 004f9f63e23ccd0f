//! Adapter implementation for the Claude (Anthropic) provider.

use super::{
    Claude, Request, supports_documents,
    stream::{BlockDelta, ContentBlock as StreamBlock, CumulativeText, Event, StreamFailure},
};
use crate::http::HttpProvider;
use compact_str::CompactString;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::Response;
use sbcore::{
    Adapter, Capabilities, Completion, Error, Personality, Prompt, ResponseMetadata, Result,
    SendResponse, StreamEvent, StreamOptions, Usage, error_body, error_message,
    handoff::{self, Pacing, Producer},
    sse,
};
use serde::Deserialize;
use std::time::Duration;

/// Longest wait for the next transport event while streaming.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "Anthropic";

/// Raw Anthropic non-streaming response.
#[derive(Deserialize)]
struct AnthropicResponse {
    model: CompactString,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Turn a non-2xx response into [`Error::Claude`].
async fn claude_error(response: Response) -> Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    tracing::trace!("{PROVIDER} error body: {text}");
    let body = error_body(&text);
    Error::Claude {
        status: status.as_u16(),
        message: error_message(&body, status),
        kind: body
            .pointer("/error/type")
            .and_then(|kind| kind.as_str())
            .map(str::to_owned),
    }
}

/// Overloaded responses are worth another attempt.
fn retryable(error: &Error) -> bool {
    match error {
        Error::Claude { status, kind, .. } => {
            matches!(status, 503 | 529) || kind.as_deref() == Some("overloaded_error")
        }
        _ => false,
    }
}

/// Convert an Anthropic response to a normalized completion.
fn to_completion(raw: AnthropicResponse) -> Completion {
    let response = raw
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    Completion {
        response,
        model_used: Some(raw.model),
        usage: raw
            .usage
            .map(|usage| Usage::new(usage.input_tokens, usage.output_tokens)),
        metadata: raw.stop_reason.map(|reason| ResponseMetadata {
            citations: Vec::new(),
            provider_metadata: Some(serde_json::json!({ "stop_reason": reason })),
        }),
    }
}

impl Claude {
    async fn attempt(&self, body: &Request) -> Result<AnthropicResponse> {
        let response = self.http.send(body).await?;
        if !response.status().is_success() {
            return Err(claude_error(response).await);
        }

        let text = response.text().await?;
        tracing::trace!("response: {text}");
        Ok(serde_json::from_str(&text)?)
    }
}

impl Adapter for Claude {
    fn capabilities(&self) -> Capabilities {
        let documents = supports_documents(&self.base.configured_model());
        Capabilities {
            streaming: true,
            attachments: true,
            supports_images: true,
            supports_documents: documents,
            function_calling: false,
            system_prompt: true,
            max_tokens: 8_192,
            context_window: 200_000,
        }
    }

    fn set_personality(&mut self, personality: Option<Personality>) {
        self.base.set_personality(personality);
    }

    async fn send(&self, prompt: &Prompt) -> Result<SendResponse> {
        let body = self.request(prompt, false);
        let mut attempt = 1;
        loop {
            match self.attempt(&body).await {
                Ok(raw) => return Ok(to_completion(raw).into()),
                Err(e) if attempt < self.retry.attempts && retryable(&e) => {
                    let delay = self.retry.delay(attempt);
                    tracing::debug!("{PROVIDER} attempt {attempt} failed: {e}, retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn stream(
        &self,
        prompt: Prompt,
        options: StreamOptions,
    ) -> impl Stream<Item = Result<String>> + Send {
        let body = self.request(&prompt, true);
        let http = self.http.clone();
        let idle = self.event_timeout;
        handoff::spawn(
            Pacing::unbounded(PROVIDER),
            options.cancel.clone(),
            move |producer| pump(http, body, idle, options, producer),
        )
    }
}

/// Read typed events and feed new text to the consumer.
async fn pump(
    http: HttpProvider,
    body: Request,
    idle: Duration,
    options: StreamOptions,
    producer: Producer,
) {
    let response = match http.send_stream(&body).await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => return producer.fail(claude_error(response).await),
        Err(e) => {
            tracing::debug!("{PROVIDER} transport error: {e}");
            return producer.fail(StreamFailure::Network.into());
        }
    };
    options.emit(StreamEvent::Started {
        model: body.model.clone(),
    });

    let mut events = std::pin::pin!(sse::events(response.bytes_stream()));
    let mut text = CumulativeText::default();
    let mut input_tokens = 0;
    loop {
        let event = match tokio::time::timeout(idle, events.next()).await {
            Ok(Some(Ok(event))) => event,
            Ok(Some(Err(e))) => {
                tracing::debug!("{PROVIDER} transport error: {e}");
                return producer.fail(StreamFailure::Network.into());
            }
            Ok(None) => break,
            Err(_) if text.is_empty() => {
                return producer.fail(Error::Timeout {
                    provider: PROVIDER.into(),
                    secs: idle.as_secs(),
                });
            }
            Err(_) => {
                tracing::warn!("{PROVIDER} sent nothing for {idle:?}, ending stream");
                break;
            }
        };

        let event = match serde_json::from_str::<Event>(&event.data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("failed to parse anthropic event: {e}, data: {}", event.data);
                continue;
            }
        };

        match event {
            Event::MessageStart { message } => {
                tracing::debug!("{PROVIDER} streaming from {}", message.model);
                input_tokens = message.usage.map_or(0, |usage| usage.input_tokens);
            }
            Event::ContentBlockStart {
                content_block: StreamBlock::Text { text: chunk },
            }
            | Event::ContentBlockDelta {
                delta: BlockDelta::TextDelta { text: chunk },
            } => {
                if let Some(fresh) = text.push(&chunk) {
                    producer.push(fresh);
                }
            }
            Event::MessageDelta { delta, usage } => {
                if let Some(usage) = usage {
                    options.emit(StreamEvent::Usage(Usage::new(
                        input_tokens,
                        usage.output_tokens,
                    )));
                }
                options.emit(StreamEvent::Finished {
                    reason: delta.stop_reason,
                });
            }
            Event::MessageStop => break,
            Event::Error { error } => {
                let failure = StreamFailure::classify(error.kind.as_deref(), &error.message);
                tracing::error!("{PROVIDER} stream error: {}", error.message);
                return producer.fail(failure.into());
            }
            _ => {}
        }
    }
    producer.finish();
}
