//! Server-Sent Events handling for `tasks/sendSubscribe` responses.
//!
//! The response body is framed by `eventsource-stream` and each event's data
//! is decoded into a [`TaskUpdateEvent`] by a background task feeding a
//! bounded channel. Dropping the [`TaskEventStream`] aborts that task, which
//! drops the HTTP response and releases the connection.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use tokio::sync::mpsc;

use crate::error::{DispatchError, DispatchResult};
use crate::types::TaskUpdateEvent;

/// Channel capacity between the body reader and the consumer.
const EVENT_BUFFER: usize = 64;

/// A live, lazily consumed sequence of task update events.
///
/// Supports pull-based consumption through [`next()`](Self::next) and the
/// `futures::Stream` trait. The sequence ends when the server closes the
/// connection; it does not end by itself after a final event, so consumers
/// stop reading once they have what they need.
///
/// # Example
///
/// ```no_run
/// # async fn example(mut stream: a2a_dispatch::client::TaskEventStream) {
/// while let Some(event) = stream.next().await {
///     match event {
///         Ok(event) => println!("Got event: {:?}", event),
///         Err(e) => eprintln!("Stream error: {}", e),
///     }
/// }
/// # }
/// ```
pub struct TaskEventStream {
    receiver: mpsc::Receiver<DispatchResult<TaskUpdateEvent>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for TaskEventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskEventStream").finish_non_exhaustive()
    }
}

impl TaskEventStream {
    /// Wrap a raw event-stream response.
    ///
    /// `idle_timeout` bounds the gap between two events; when it elapses
    /// the stream yields [`DispatchError::Timeout`] and ends.
    pub(crate) fn from_response(response: reqwest::Response, idle_timeout: Option<Duration>) -> Self {
        Self::from_body(response.bytes_stream(), idle_timeout)
    }

    /// Decode any chunked `text/event-stream` body.
    pub(crate) fn from_body<S, B, E>(body: S, idle_timeout: Option<Duration>) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let task = tokio::spawn(async move {
            if let Err(e) = pump_events(body, &tx, idle_timeout).await {
                // Receiver may already be gone.
                let _ = tx.send(Err(e)).await;
            }
        });

        Self {
            receiver: rx,
            task: Some(task),
        }
    }

    /// Build a stream that replays the given items and then ends.
    ///
    /// Useful for custom [`Transport`](super::Transport) implementations and
    /// tests.
    pub fn from_events<I>(events: I) -> Self
    where
        I: IntoIterator<Item = DispatchResult<TaskUpdateEvent>>,
    {
        let events: Vec<_> = events.into_iter().collect();
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            // Capacity equals the item count, so this cannot fail.
            let _ = tx.try_send(event);
        }
        Self {
            receiver: rx,
            task: None,
        }
    }

    /// Get the next event from the stream.
    ///
    /// Returns `None` once the server has closed the connection. Returns
    /// `Some(Err(..))` on transport, timeout or decode errors; no items
    /// follow an error.
    pub async fn next(&mut self) -> Option<DispatchResult<TaskUpdateEvent>> {
        self.receiver.recv().await
    }

    /// Stop reading and release the connection.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for TaskEventStream {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Stream for TaskEventStream {
    type Item = DispatchResult<TaskUpdateEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Read events off the body, sending decoded updates to `tx`.
///
/// Comment lines never reach us; events with empty data become keep-alives.
/// Reading stops after the first error item.
async fn pump_events<S, B, E>(
    body: S,
    tx: &mpsc::Sender<DispatchResult<TaskUpdateEvent>>,
    idle_timeout: Option<Duration>,
) -> DispatchResult<()>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut events = Box::pin(body.eventsource());

    loop {
        let next = match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, events.next()).await.map_err(|_| {
                DispatchError::Timeout(format!("no event-stream data received for {limit:?}"))
            })?,
            None => events.next().await,
        };

        let event = match next {
            Some(Ok(message)) => TaskUpdateEvent::from_data(&message.data).map_err(|e| {
                DispatchError::InvalidJson(format!(
                    "failed to parse event data: {e} (data: {})",
                    message.data
                ))
            }),
            Some(Err(e)) => Err(DispatchError::Transport(format!("error reading event stream: {e}"))),
            None => return Ok(()),
        };

        let failed = event.is_err();
        if tx.send(event).await.is_err() || failed {
            // Receiver dropped, or nothing sensible follows an error.
            return Ok(());
        }
    }
}
