//! Adapter implementation for the Responses API.

use super::{Request, Responses};
use crate::http::HttpProvider;
use compact_str::CompactString;
use futures_core::Stream;
use futures_util::StreamExt;
use sbcore::{
    Adapter, Capabilities, Completion, Error, Personality, Prompt, Result, SendResponse,
    StreamEvent, StreamOptions, Usage,
    handoff::{self, Pacing, Producer},
    sse,
};
use serde::Deserialize;
use std::time::Duration;

/// Hard ceiling for a whole streamed response.
pub const STREAM_CEILING: Duration = Duration::from_secs(180);

const PROVIDER: &str = "OpenAI Responses";

/// A response object, returned whole by a one-shot call and embedded in
/// lifecycle events.
#[derive(Debug, Default, Deserialize)]
struct ResponseObject {
    #[serde(default)]
    model: Option<CompactString>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    usage: Option<ResponsesUsage>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputContent {
    OutputText { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ResponsesUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl From<ResponsesUsage> for Usage {
    fn from(usage: ResponsesUsage) -> Self {
        Usage::new(usage.input_tokens, usage.output_tokens)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

impl ResponseObject {
    fn text(&self) -> String {
        self.output
            .iter()
            .flat_map(|item| &item.content)
            .filter_map(|content| match content {
                OutputContent::OutputText { text } => Some(text.as_str()),
                OutputContent::Other => None,
            })
            .collect()
    }
}

/// A semantic streaming event.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Event {
    #[serde(rename = "response.created")]
    Created {
        #[serde(default)]
        response: ResponseObject,
    },
    #[serde(rename = "response.output_text.delta", alias = "response.text.delta")]
    TextDelta { delta: Delta },
    #[serde(rename = "response.completed")]
    Completed {
        #[serde(default)]
        response: ResponseObject,
    },
    #[serde(rename = "response.failed")]
    Failed {
        #[serde(default)]
        response: ResponseObject,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<ErrorDetail>,
    },
    #[serde(other)]
    Other,
}

/// Text deltas arrive as a string, or as an object holding one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Delta {
    Text(String),
    Object {
        #[serde(default)]
        text: String,
    },
}

impl Delta {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) | Self::Object { text } => text,
        }
    }
}

fn stream_error(message: &str) -> Error {
    Error::Stream(format!("{PROVIDER} stream error: {message}"))
}

impl Adapter for Responses {
    fn capabilities(&self) -> Capabilities {
        let vision = sbcore::registry::profile(&self.base.configured_model()).vision;
        Capabilities {
            streaming: true,
            attachments: vision,
            supports_images: vision,
            supports_documents: false,
            function_calling: false,
            system_prompt: true,
            max_tokens: 16_384,
            context_window: 128_000,
        }
    }

    fn set_personality(&mut self, personality: Option<Personality>) {
        self.base.set_personality(personality);
    }

    async fn send(&self, prompt: &Prompt) -> Result<SendResponse> {
        let body = self.request(prompt, false);
        let raw: ResponseObject = self.http.json(PROVIDER, &body).await?;
        Ok(Completion {
            response: raw.text(),
            model_used: Some(raw.model.unwrap_or_else(|| body.model.as_str().into())),
            usage: raw.usage.map(Into::into),
            metadata: None,
        }
        .into())
    }

    fn stream(
        &self,
        prompt: Prompt,
        options: StreamOptions,
    ) -> impl Stream<Item = Result<String>> + Send {
        let body = self.request(&prompt, true);
        let http = self.http.clone();
        let pacing = Pacing {
            ceiling: Some(self.ceiling),
            ..Pacing::unbounded(PROVIDER)
        };
        handoff::spawn(pacing, options.cancel.clone(), move |producer| {
            pump(http, body, options, producer)
        })
    }
}

async fn pump(http: HttpProvider, body: Request, options: StreamOptions, producer: Producer) {
    let response = match http.open_stream(PROVIDER, &body).await {
        Ok(response) => response,
        Err(e) => return producer.fail(e),
    };

    let mut events = std::pin::pin!(sse::events(response.bytes_stream()));
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => return producer.fail(e),
        };
        if event.is_done() {
            break;
        }

        let event = match serde_json::from_str::<Event>(&event.data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("failed to parse responses event: {e}, data: {}", event.data);
                continue;
            }
        };

        match event {
            Event::Created { response } => options.emit(StreamEvent::Started {
                model: response
                    .model
                    .map_or_else(|| body.model.clone(), Into::into),
            }),
            Event::TextDelta { delta } => producer.push(delta.into_text()),
            Event::Completed { response } => {
                if let Some(usage) = response.usage {
                    options.emit(StreamEvent::Usage(usage.into()));
                }
                options.emit(StreamEvent::Finished {
                    reason: response.status,
                });
                break;
            }
            Event::Failed { response } => {
                let message = response
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "response failed".into());
                return producer.fail(stream_error(&message));
            }
            Event::Error { message, error } => {
                let message = message
                    .or(error.map(|e| e.message))
                    .unwrap_or_else(|| "unknown error".into());
                return producer.fail(stream_error(&message));
            }
            Event::Other => {}
        }
    }
    producer.finish();
}
