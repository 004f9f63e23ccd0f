//! Single-producer/single-consumer handoff between a transport task and a
//! pull-based text stream.
//!
//! The transport task pushes decoded chunks. A chunk goes straight to the
//! consumer when it is already waiting, otherwise into a FIFO queue. At most
//! one consumer slot is outstanding at a time. Completion, failure, and
//! timeouts all resolve the slot with a terminal signal, so the consumer
//! never hangs.

use crate::{Error, Result};
use futures_core::Stream;
use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc, time::Duration};
use tokio::{sync::oneshot, task::AbortHandle, time::Instant};
use tokio_util::sync::CancellationToken;

/// What a waiting consumer receives.
enum Slot {
    Chunk(String),
    End,
    Failed(Error),
}

#[derive(Default)]
struct State {
    queue: VecDeque<String>,
    waiter: Option<oneshot::Sender<Slot>>,
    /// `Some(Ok)` once finished, `Some(Err)` while a failure is undelivered.
    terminal: Option<Result<()>>,
}

/// Create a connected producer/consumer pair.
pub fn channel() -> (Producer, Consumer) {
    let state = Arc::new(Mutex::new(State::default()));
    (
        Producer {
            state: state.clone(),
        },
        Consumer { state },
    )
}

/// The transport side of the handoff.
///
/// Dropping the producer finishes the stream.
pub struct Producer {
    state: Arc<Mutex<State>>,
}

impl Producer {
    /// Deliver a text chunk. Empty chunks and chunks after the end are
    /// ignored.
    pub fn push(&self, chunk: impl Into<String>) {
        let chunk = chunk.into();
        if chunk.is_empty() {
            return;
        }

        let mut state = self.state.lock();
        if state.terminal.is_some() {
            return;
        }
        match state.waiter.take() {
            Some(waiter) => {
                if let Err(Slot::Chunk(chunk)) = waiter.send(Slot::Chunk(chunk)) {
                    state.queue.push_back(chunk);
                }
            }
            None => state.queue.push_back(chunk),
        }
    }

    /// End the stream normally.
    pub fn finish(&self) {
        self.close(Ok(()));
    }

    /// End the stream with an error.
    pub fn fail(&self, error: Error) {
        self.close(Err(error));
    }

    /// Whether the stream was already closed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().terminal.is_some()
    }

    fn close(&self, outcome: Result<()>) {
        let mut state = self.state.lock();
        if state.terminal.is_some() {
            return;
        }

        let Some(waiter) = state.waiter.take() else {
            state.terminal = Some(outcome);
            return;
        };
        let slot = match outcome {
            Ok(()) => Slot::End,
            Err(e) => Slot::Failed(e),
        };
        state.terminal = match waiter.send(slot) {
            Ok(()) | Err(Slot::End) | Err(Slot::Chunk(_)) => Some(Ok(())),
            Err(Slot::Failed(e)) => Some(Err(e)),
        };
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.finish();
    }
}

/// What the consumer observed.
pub enum Next {
    /// A text chunk.
    Chunk(String),
    /// The producer finished.
    End,
    /// The producer failed.
    Failed(Error),
    /// Nothing arrived within the wait window.
    Idle,
}

/// The stream side of the handoff.
pub struct Consumer {
    state: Arc<Mutex<State>>,
}

impl Consumer {
    /// Take the next chunk or terminal signal, waiting at most `wait`.
    pub async fn next(&mut self, wait: Option<Duration>) -> Next {
        let mut rx = {
            let mut state = self.state.lock();
            if let Some(chunk) = state.queue.pop_front() {
                return Next::Chunk(chunk);
            }
            if let Some(outcome) = state.terminal.take() {
                state.terminal = Some(Ok(()));
                return match outcome {
                    Ok(()) => Next::End,
                    Err(e) => Next::Failed(e),
                };
            }
            let (tx, rx) = oneshot::channel();
            state.waiter = Some(tx);
            rx
        };

        let slot = match wait {
            None => (&mut rx).await.ok(),
            Some(wait) => match tokio::time::timeout(wait, &mut rx).await {
                Ok(slot) => slot.ok(),
                Err(_) => {
                    if self.state.lock().waiter.take().is_some() {
                        return Next::Idle;
                    }
                    // The producer resolved the slot as the timer fired.
                    rx.try_recv().ok()
                }
            },
        };

        match slot {
            Some(Slot::Chunk(chunk)) => Next::Chunk(chunk),
            Some(Slot::Failed(e)) => Next::Failed(e),
            Some(Slot::End) | None => Next::End,
        }
    }
}

/// Timing rules for a streamed call.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Vendor name for messages.
    pub provider: &'static str,
    /// Maximum wait for the first chunk; exceeding it is an error.
    pub first_chunk: Option<Duration>,
    /// Maximum gap between chunks once one arrived; exceeding it ends the
    /// stream quietly.
    pub idle: Option<Duration>,
    /// Hard ceiling for the whole stream; exceeding it is an error.
    pub ceiling: Option<Duration>,
}

impl Pacing {
    /// No timeouts at all.
    pub fn unbounded(provider: &'static str) -> Self {
        Self {
            provider,
            first_chunk: None,
            idle: None,
            ceiling: None,
        }
    }
}

/// Aborts the transport task when dropped.
pub struct AbortOnDrop(pub AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run `pump` as the transport task and expose its output as a stream.
///
/// The task starts on first poll. It is aborted, closing its connection,
/// whenever the stream ends: completion, failure, timeout, cancellation, or
/// the caller dropping the stream early.
pub fn spawn<F, Fut>(
    pacing: Pacing,
    cancel: Option<CancellationToken>,
    pump: F,
) -> impl Stream<Item = Result<String>> + Send
where
    F: FnOnce(Producer) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async_stream::stream! {
        let (producer, mut consumer) = channel();
        let _guard = AbortOnDrop(tokio::spawn(pump(producer)).abort_handle());
        let deadline = pacing.ceiling.map(|ceiling| Instant::now() + ceiling);
        let mut received = false;

        loop {
            let mut wait = if received { pacing.idle } else { pacing.first_chunk };
            if let Some(deadline) = deadline {
                let left = deadline.saturating_duration_since(Instant::now());
                wait = Some(wait.map_or(left, |w| w.min(left)));
            }

            let next = tokio::select! {
                biased;
                _ = cancelled(cancel.as_ref()) => {
                    tracing::debug!("{} stream cancelled", pacing.provider);
                    break;
                }
                next = consumer.next(wait) => next,
            };

            match next {
                Next::Chunk(chunk) => {
                    received = true;
                    yield Ok(chunk);
                }
                Next::End => break,
                Next::Failed(e) => {
                    tracing::error!("{} stream failed: {e}", pacing.provider);
                    yield Err(e);
                    break;
                }
                Next::Idle => {
                    if let (Some(deadline), Some(ceiling)) = (deadline, pacing.ceiling)
                        && Instant::now() >= deadline
                    {
                        yield Err(Error::Timeout {
                            provider: pacing.provider.into(),
                            secs: ceiling.as_secs(),
                        });
                        break;
                    }
                    if received {
                        tracing::warn!(
                            "{} sent nothing for {:?}, ending stream",
                            pacing.provider,
                            pacing.idle.unwrap_or_default()
                        );
                        break;
                    }
                    yield Err(Error::Timeout {
                        provider: pacing.provider.into(),
                        secs: pacing.first_chunk.unwrap_or_default().as_secs(),
                    });
                    break;
                }
            }
        }
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}
