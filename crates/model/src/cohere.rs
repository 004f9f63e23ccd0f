//! Cohere provider.
//!
//! The v1 chat API keeps the new message apart from `chat_history`, puts
//! the system prompt in `preamble`, and streams newline-delimited JSON
//! rather than SSE.

use crate::http::{self, HttpProvider};
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::Client;
use sbcore::{
    Adapter, AdapterBase, AdapterConfig, Capabilities, Completion, Error, Personality, Prompt,
    ProviderId, Result, Role, SendResponse, StreamEvent, StreamOptions, Usage,
    handoff::{self, Pacing, Producer},
    sse::LineBuffer,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The Cohere chat endpoint.
pub const ENDPOINT: &str = "https://api.cohere.ai/v1/chat";

/// Temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Gap after the first token that force-ends a stream.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

const PROVIDER: &str = "Cohere";

/// The request body.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub model: String,
    pub message: String,
    pub chat_history: Vec<HistoryEntry>,
    pub preamble: String,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

/// A prior turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// `USER` or `ASSISTANT`.
    pub role: &'static str,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(default)]
    billed_units: Option<BilledUnits>,
}

#[derive(Debug, Deserialize)]
struct BilledUnits {
    #[serde(default)]
    input_tokens: f64,
    #[serde(default)]
    output_tokens: f64,
}

impl ChatResponse {
    fn usage(&self) -> Option<Usage> {
        let units = self.meta.as_ref()?.billed_units.as_ref()?;
        Some(Usage::new(units.input_tokens as u32, units.output_tokens as u32))
    }
}

/// A line of the streamed response.
#[derive(Debug, Deserialize)]
#[serde(tag = "event_type", rename_all = "kebab-case")]
enum Event {
    StreamStart {
        #[serde(default)]
        generation_id: Option<String>,
    },
    TextGeneration {
        text: String,
    },
    StreamEnd {
        #[serde(default)]
        finish_reason: Option<String>,
        #[serde(default)]
        response: Option<ChatResponse>,
    },
    #[serde(other)]
    Other,
}

/// The Cohere adapter.
#[derive(Clone, Debug)]
pub struct Cohere {
    base: AdapterBase,
    http: HttpProvider,
}

impl Cohere {
    /// Create an adapter targeting the Cohere API, or the configured root.
    pub fn new(client: Client, config: AdapterConfig) -> Result<Self> {
        let endpoint = match config.base_url.as_deref() {
            Some(base) => http::join(base, "chat"),
            None => ENDPOINT.to_owned(),
        };
        let http = HttpProvider::bearer(client, &config.api_key, &endpoint)?;
        Ok(Self {
            base: AdapterBase::new(ProviderId::Cohere, config),
            http,
        })
    }

    /// The shared adapter state.
    pub fn base(&self) -> &AdapterBase {
        &self.base
    }

    /// Build the request body for a turn.
    pub fn request(&self, prompt: &Prompt, stream: bool) -> Request {
        let params = self.base.parameters();
        let chat_history = self
            .base
            .format_history(&prompt.history, prompt.resumption.as_ref())
            .into_iter()
            .map(|turn| HistoryEntry {
                role: match turn.role {
                    Role::User => "USER",
                    Role::Assistant => "ASSISTANT",
                },
                message: turn.content,
            })
            .collect();

        if !prompt.attachments.is_empty() {
            tracing::debug!(
                "{PROVIDER} cannot read attachments, dropping {}",
                prompt.attachments.len()
            );
        }

        Request {
            model: self.base.model(prompt.model.as_deref()),
            message: prompt.message.content.clone(),
            chat_history,
            preamble: self.base.system_prompt().to_owned(),
            temperature: params.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            p: params.top_p,
            k: params.top_k,
            max_tokens: params.max_tokens,
            stream,
        }
    }
}

impl Adapter for Cohere {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            attachments: false,
            supports_images: false,
            supports_documents: false,
            function_calling: false,
            system_prompt: true,
            max_tokens: 4_096,
            context_window: 128_000,
        }
    }

    fn set_personality(&mut self, personality: Option<Personality>) {
        self.base.set_personality(personality);
    }

    async fn send(&self, prompt: &Prompt) -> Result<SendResponse> {
        let body = self.request(prompt, false);
        let raw: ChatResponse = self.http.json(PROVIDER, &body).await?;
        let usage = raw.usage();
        Ok(Completion {
            response: raw.text,
            model_used: Some(body.model.into()),
            usage,
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
            idle: Some(IDLE_TIMEOUT),
            ..Pacing::unbounded(PROVIDER)
        };
        handoff::spawn(pacing, options.cancel.clone(), move |producer| {
            pump(http, body, options, producer)
        })
    }
}

async fn pump(http: HttpProvider, body: Request, options: StreamOptions, producer: Producer) {
    let response = match http.send(&body).await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => return producer.fail(sbcore::api_error(PROVIDER, response).await),
        Err(e) => return producer.fail(e),
    };
    options.emit(StreamEvent::Started {
        model: body.model.clone(),
    });

    let mut bytes = response.bytes_stream();
    let mut lines = LineBuffer::default();
    while let Some(chunk) = bytes.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => return producer.fail(Error::from(e)),
        };
        for line in lines.feed(&chunk) {
            if handle(&line, &options, &producer) {
                return producer.finish();
            }
        }
    }
    if let Some(line) = lines.finish() {
        handle(&line, &options, &producer);
    }
    producer.finish();
}

/// Process one NDJSON line. Returns true once the stream has ended.
fn handle(line: &str, options: &StreamOptions, producer: &Producer) -> bool {
    if line.trim().is_empty() {
        return false;
    }
    let event = match serde_json::from_str::<Event>(line) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("failed to parse cohere event: {e}, data: {line}");
            return false;
        }
    };

    match event {
        Event::StreamStart { generation_id } => {
            tracing::trace!("{PROVIDER} generation {generation_id:?}");
            false
        }
        Event::TextGeneration { text } => {
            producer.push(text);
            false
        }
        Event::StreamEnd {
            finish_reason,
            response,
        } => {
            if let Some(usage) = response.as_ref().and_then(ChatResponse::usage) {
                options.emit(StreamEvent::Usage(usage));
            }
            let reason = finish_reason.or_else(|| response.and_then(|r| r.finish_reason));
            options.emit(StreamEvent::Finished { reason });
            true
        }
        Event::Other => false,
    }
}
