//! Adapter implementation for the Gemini provider.

use super::{Gemini, Request};
use crate::http::HttpProvider;
use compact_str::CompactString;
use futures_core::Stream;
use futures_util::StreamExt;
use sbcore::{
    Adapter, Capabilities, Completion, Personality, Prompt, Result, SendResponse, StreamEvent,
    StreamOptions, Usage,
    handoff::{self, Pacing, Producer},
    sse,
};
use serde::Deserialize;
use std::time::Duration;

/// Gap after the first token that force-ends a stream.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

const PROVIDER: &str = "Google";

/// A `generateContent` response, also the payload of each SSE event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<CompactString>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

impl From<UsageMetadata> for Usage {
    fn from(usage: UsageMetadata) -> Self {
        Usage::new(usage.prompt_token_count, usage.candidates_token_count)
    }
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .filter(|reason| !reason.is_empty())
    }
}

impl Adapter for Gemini {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            attachments: true,
            supports_images: true,
            supports_documents: true,
            function_calling: false,
            system_prompt: true,
            max_tokens: 8_192,
            context_window: 1_048_576,
        }
    }

    fn set_personality(&mut self, personality: Option<Personality>) {
        self.base.set_personality(personality);
    }

    async fn send(&self, prompt: &Prompt) -> Result<SendResponse> {
        let model = self.base.model(prompt.model.as_deref());
        let body = self.request(prompt);
        let raw: GenerateResponse = self
            .http
            .at(self.generate_url(&model))
            .json(PROVIDER, &body)
            .await?;

        Ok(Completion {
            response: raw.text(),
            model_used: Some(raw.model_version.unwrap_or_else(|| model.into())),
            usage: raw.usage_metadata.map(Into::into),
            metadata: None,
        }
        .into())
    }

    fn stream(
        &self,
        prompt: Prompt,
        options: StreamOptions,
    ) -> impl Stream<Item = Result<String>> + Send {
        let model = self.base.model(prompt.model.as_deref());
        let body = self.request(&prompt);
        let http = self.stream.at(self.stream_url(&model));
        let pacing = Pacing {
            provider: PROVIDER,
            first_chunk: None,
            idle: Some(IDLE_TIMEOUT),
            ceiling: None,
        };
        handoff::spawn(pacing, options.cancel.clone(), move |producer| {
            pump(http, model, body, options, producer)
        })
    }
}

async fn pump(
    http: HttpProvider,
    model: String,
    body: Request,
    options: StreamOptions,
    producer: Producer,
) {
    let response = match http.open_stream(PROVIDER, &body).await {
        Ok(response) => response,
        Err(e) => return producer.fail(e),
    };
    options.emit(StreamEvent::Started { model });

    let mut events = std::pin::pin!(sse::events(response.bytes_stream()));
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => return producer.fail(e),
        };

        let chunk = match serde_json::from_str::<GenerateResponse>(&event.data) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!("failed to parse gemini chunk: {e}, data: {}", event.data);
                continue;
            }
        };

        producer.push(chunk.text());
        if let Some(reason) = chunk.finish_reason() {
            let reason = reason.to_owned();
            if let Some(usage) = chunk.usage_metadata {
                options.emit(StreamEvent::Usage(usage.into()));
            }
            options.emit(StreamEvent::Finished {
                reason: Some(reason),
            });
            break;
        }
    }
    producer.finish();
}
