//! Tests for the producer/consumer stream handoff.

use futures_util::StreamExt;
use switchboard_core::{
    CancellationToken, Error,
    handoff::{self, Next, Pacing},
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

/// Sets the flag when the transport task is torn down.
struct Teardown(Arc<AtomicBool>);

impl Drop for Teardown {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn pacing() -> Pacing {
    Pacing::unbounded("Test")
}

// --- channel ---

#[tokio::test]
async fn queued_chunks_arrive_in_order() {
    let (producer, mut consumer) = handoff::channel();
    producer.push("a");
    producer.push("");
    producer.push("b");
    producer.finish();

    assert!(matches!(consumer.next(None).await, Next::Chunk(c) if c == "a"));
    assert!(matches!(consumer.next(None).await, Next::Chunk(c) if c == "b"));
    assert!(matches!(consumer.next(None).await, Next::End));
    assert!(matches!(consumer.next(None).await, Next::End));
}

#[tokio::test]
async fn waiting_consumer_receives_chunk_directly() {
    let (producer, mut consumer) = handoff::channel();
    let task = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        producer.push("late");
    });
    assert!(matches!(consumer.next(None).await, Next::Chunk(c) if c == "late"));
    task.await.unwrap();
    assert!(matches!(consumer.next(None).await, Next::End));
}

#[tokio::test]
async fn failure_is_delivered_once() {
    let (producer, mut consumer) = handoff::channel();
    producer.fail(Error::Stream("boom".into()));
    producer.push("ignored");

    assert!(matches!(consumer.next(None).await, Next::Failed(Error::Stream(m)) if m == "boom"));
    assert!(matches!(consumer.next(None).await, Next::End));
}

#[tokio::test]
async fn idle_consumer_times_out() {
    let (producer, mut consumer) = handoff::channel();
    assert!(matches!(
        consumer.next(Some(Duration::from_millis(20))).await,
        Next::Idle
    ));
    producer.push("after");
    assert!(matches!(consumer.next(None).await, Next::Chunk(c) if c == "after"));
}

// --- spawn ---

#[tokio::test]
async fn stream_yields_pushed_chunks() {
    let stream = handoff::spawn(pacing(), None, |producer| async move {
        producer.push("Hello");
        producer.push(", world");
        producer.finish();
    });
    let chunks: Vec<String> = stream.map(Result::unwrap).collect().await;
    assert_eq!(chunks, vec!["Hello", ", world"]);
}

#[tokio::test]
async fn failure_ends_the_stream() {
    let stream = handoff::spawn(pacing(), None, |producer| async move {
        producer.push("partial");
        producer.fail(Error::Stream("lost connection".into()));
    });
    let items: Vec<_> = stream.collect().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_deref().unwrap(), "partial");
    assert_eq!(items[1].as_ref().unwrap_err().to_string(), "lost connection");
}

#[tokio::test]
async fn idle_after_first_chunk_ends_quietly() {
    let torn_down = Arc::new(AtomicBool::new(false));
    let flag = torn_down.clone();
    let pacing = Pacing {
        idle: Some(Duration::from_millis(50)),
        ..pacing()
    };
    let stream = handoff::spawn(pacing, None, move |producer| async move {
        let _teardown = Teardown(flag);
        producer.push("only");
        std::future::pending::<()>().await;
    });

    let items: Vec<_> = stream.collect().await;
    assert_eq!(items.len(), 1);
    assert!(items[0].is_ok());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(torn_down.load(Ordering::SeqCst));
}

#[tokio::test]
async fn no_first_chunk_is_a_timeout() {
    let pacing = Pacing {
        first_chunk: Some(Duration::from_millis(30)),
        ..pacing()
    };
    let stream = handoff::spawn(pacing, None, |producer| async move {
        let _producer = producer;
        std::future::pending::<()>().await;
    });
    let items: Vec<_> = stream.collect().await;
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(Error::Timeout { .. })));
}

#[tokio::test]
async fn ceiling_is_an_error_even_while_chunks_flow() {
    let pacing = Pacing {
        ceiling: Some(Duration::from_millis(80)),
        ..pacing()
    };
    let stream = handoff::spawn(pacing, None, |producer| async move {
        for _ in 0..1000 {
            producer.push("tick");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    });
    let items: Vec<_> = stream.collect().await;
    assert!(items.len() > 1);
    assert!(matches!(items.last(), Some(Err(Error::Timeout { .. }))));
}

#[tokio::test]
async fn cancellation_tears_down_transport() {
    let torn_down = Arc::new(AtomicBool::new(false));
    let flag = torn_down.clone();
    let cancel = CancellationToken::new();
    let stream = handoff::spawn(pacing(), Some(cancel.clone()), move |producer| async move {
        let _teardown = Teardown(flag);
        producer.push("first");
        std::future::pending::<()>().await;
    });

    let mut stream = std::pin::pin!(stream);
    assert_eq!(stream.next().await.unwrap().unwrap(), "first");
    cancel.cancel();
    assert!(stream.next().await.is_none());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(torn_down.load(Ordering::SeqCst));
}

#[tokio::test]
async fn dropping_the_stream_aborts_transport() {
    let torn_down = Arc::new(AtomicBool::new(false));
    let flag = torn_down.clone();
    {
        let stream = handoff::spawn(pacing(), None, move |producer| async move {
            let _teardown = Teardown(flag);
            producer.push("first");
            std::future::pending::<()>().await;
        });
        let mut stream = std::pin::pin!(stream);
        assert_eq!(stream.next().await.unwrap().unwrap(), "first");
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(torn_down.load(Ordering::SeqCst));
}
