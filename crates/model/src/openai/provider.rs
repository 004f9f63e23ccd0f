//! Adapter implementation for the OpenAI-compatible provider.

use super::{OpenAI, Request, Vendor};
use crate::http::HttpProvider;
use compact_str::CompactString;
use futures_core::Stream;
use futures_util::StreamExt;
use sbcore::{
    Adapter, Capabilities, Citation, Completion, Personality, Prompt, ResponseMetadata, Result,
    SendResponse, StreamEvent, StreamOptions, Usage,
    handoff::{self, Pacing, Producer},
    registry, sse,
};
use serde::Deserialize;
use std::time::Duration;

/// Gap after the first token that force-ends a stream.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw non-streaming response.
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<CompactString>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    #[serde(default)]
    search_results: Vec<SearchResult>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Deserialize)]
struct ChatMessageOut {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: Option<u32>,
}

impl From<ChatUsage> for Usage {
    fn from(usage: ChatUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage
                .total_tokens
                .unwrap_or(usage.prompt_tokens.saturating_add(usage.completion_tokens)),
        }
    }
}

#[derive(Deserialize)]
struct SearchResult {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

/// A streaming chat completion chunk.
#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    #[serde(default)]
    search_results: Vec<SearchResult>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Search results become 1-indexed citations in result order; bare
/// citation urls are the fallback.
fn citations(results: Vec<SearchResult>, urls: Vec<String>) -> Vec<Citation> {
    if !results.is_empty() {
        return results
            .into_iter()
            .enumerate()
            .map(|(i, r)| Citation {
                index: i + 1,
                url: r.url,
                title: r.title,
                snippet: r.snippet,
            })
            .collect();
    }

    urls.into_iter()
        .enumerate()
        .map(|(i, url)| Citation {
            index: i + 1,
            url,
            title: None,
            snippet: None,
        })
        .collect()
}

fn to_completion(raw: ChatResponse, vendor: &Vendor, requested: &str) -> Completion {
    let response = raw
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    let metadata = if vendor.citations {
        let citations = citations(raw.search_results, raw.citations);
        (!citations.is_empty()).then(|| ResponseMetadata {
            citations,
            provider_metadata: None,
        })
    } else {
        None
    };

    Completion {
        response,
        model_used: Some(raw.model.unwrap_or_else(|| requested.into())),
        usage: raw.usage.map(Into::into),
        metadata,
    }
}

impl Adapter for OpenAI {
    fn capabilities(&self) -> Capabilities {
        let vision = self.vendor.attachments
            && registry::profile(&self.base.configured_model()).vision;
        Capabilities {
            streaming: true,
            attachments: vision,
            supports_images: vision,
            supports_documents: false,
            function_calling: false,
            system_prompt: true,
            max_tokens: self.vendor.max_tokens,
            context_window: self.vendor.context_window,
        }
    }

    fn set_personality(&mut self, personality: Option<Personality>) {
        self.base.set_personality(personality);
    }

    async fn send(&self, prompt: &Prompt) -> Result<SendResponse> {
        let body = self.request(prompt, false);
        let raw: ChatResponse = self.http.json(self.vendor.name(), &body).await?;
        Ok(to_completion(raw, self.vendor, &body.model).into())
    }

    fn stream(
        &self,
        prompt: Prompt,
        options: StreamOptions,
    ) -> impl Stream<Item = Result<String>> + Send {
        let body = self.request(&prompt, true);
        let http = self.http.clone();
        let vendor = self.vendor;
        let pacing = Pacing {
            provider: vendor.name(),
            first_chunk: None,
            idle: Some(IDLE_TIMEOUT),
            ceiling: None,
        };
        handoff::spawn(pacing, options.cancel.clone(), move |producer| {
            pump(http, vendor, body, options, producer)
        })
    }
}

/// Read the SSE response and feed `choices[0].delta.content` to the
/// consumer.
async fn pump(
    http: HttpProvider,
    vendor: &'static Vendor,
    body: Request,
    options: StreamOptions,
    producer: Producer,
) {
    let response = match http.open_stream(vendor.name(), &body).await {
        Ok(response) => response,
        Err(e) => return producer.fail(e),
    };
    options.emit(StreamEvent::Started {
        model: body.model.clone(),
    });

    let mut events = std::pin::pin!(sse::events(response.bytes_stream()));
    let mut cited = false;
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => return producer.fail(e),
        };
        if event.is_done() {
            break;
        }

        let chunk = match serde_json::from_str::<StreamChunk>(&event.data) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!("failed to parse chunk: {e}, data: {}", event.data);
                continue;
            }
        };

        if vendor.citations && !cited {
            let found = citations(chunk.search_results, chunk.citations);
            if !found.is_empty() {
                cited = true;
                options.emit(StreamEvent::Citations(found));
            }
        }
        if let Some(usage) = chunk.usage {
            options.emit(StreamEvent::Usage(usage.into()));
        }

        let Some(choice) = chunk.choices.into_iter().next() else {
            continue;
        };
        if let Some(content) = choice.delta.content {
            producer.push(content);
        }
        if let Some(reason) = choice.finish_reason.filter(|r| !r.is_empty()) {
            options.emit(StreamEvent::Finished {
                reason: Some(reason),
            });
            break;
        }
    }
    producer.finish();
}
