//! Server-Sent Events parsing.
//!
//! Vendors split events across network chunks arbitrarily, so the parser
//! buffers until a blank line closes an event. Both `\n` and `\r\n` line
//! endings are accepted.

use crate::Result;
use async_stream::try_stream;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;

/// A parsed SSE event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// The `event:` field, if present.
    pub event: Option<String>,
    /// The `data:` fields joined with newlines.
    pub data: String,
}

impl SseEvent {
    /// Whether this is the OpenAI-style `[DONE]` sentinel.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}

/// Splits a byte stream into complete lines.
///
/// Buffers raw bytes so multi-byte characters split across chunks decode
/// intact.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Feed a chunk, returning every line it completes (without endings).
    pub fn feed(&mut self, chunk: impl AsRef<[u8]>) -> Vec<String> {
        self.buf.extend_from_slice(chunk.as_ref());
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(decode(&line[..pos]));
        }
        lines
    }

    /// Take whatever is left once the stream ends.
    pub fn finish(&mut self) -> Option<String> {
        let rest = decode(&std::mem::take(&mut self.buf));
        (!rest.is_empty()).then_some(rest)
    }
}

fn decode(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// Incremental SSE parser.
#[derive(Debug, Default)]
pub struct SseParser {
    lines: LineBuffer,
    current: SseEvent,
    has_data: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the events it completes.
    pub fn feed(&mut self, chunk: impl AsRef<[u8]>) -> Vec<SseEvent> {
        let mut events = Vec::new();
        for line in self.lines.feed(chunk) {
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing event that was not closed by a blank line.
    pub fn flush(&mut self) -> Option<SseEvent> {
        if let Some(line) = self.lines.finish() {
            self.process_line(&line);
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.current.event = Some(value.to_owned()),
            "data" => {
                if self.has_data {
                    self.current.data.push('\n');
                }
                self.current.data.push_str(value);
                self.has_data = true;
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if !self.has_data {
            self.current.event = None;
            return None;
        }
        self.has_data = false;
        Some(std::mem::take(&mut self.current))
    }
}

/// Decode a response byte stream into SSE events.
pub fn events<S, E>(bytes: S) -> impl Stream<Item = Result<SseEvent>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send,
    E: Into<crate::Error> + Send,
{
    try_stream! {
        let mut parser = SseParser::new();
        let mut bytes = std::pin::pin!(bytes);
        while let Some(next) = bytes.next().await {
            let chunk = next.map_err(Into::into)?;
            tracing::trace!("chunk: {}", String::from_utf8_lossy(&chunk));
            for event in parser.feed(&chunk) {
                yield event;
            }
        }
        if let Some(event) = parser.flush() {
            yield event;
        }
    }
}
