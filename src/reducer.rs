//! Folding task update events into one result.
//!
//! Status updates carry the *latest snapshot* of the agent's message, not a
//! delta: every text update replaces the previous content. The fold stops on
//! the first `final: true` status or the first error envelope; nothing after
//! that point is read.
//!
//! Three entry points share the same rules:
//!
//! - [`EventReducer`]: step-wise, one event at a time
//! - [`reduce()`]: drain an event stream into a final [`AggregatedResult`]
//! - [`ResultStream`]: a live sequence of snapshots for incremental display

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use futures::future::BoxFuture;
use futures::stream::{self, Stream, StreamExt};

use crate::error::{DispatchError, DispatchResult, ErrorKind};
use crate::types::{JsonRpcError, TaskUpdateEvent};

/// Completion state of an [`AggregatedResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    /// No final marker or error seen yet.
    Incomplete,
    /// The agent marked the task final (or the stream ended and the policy
    /// treats that as completion).
    Complete,
    /// An error envelope arrived, or the stream ended and the policy treats
    /// that as an error.
    Error,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultStatus::Incomplete => "incomplete",
            ResultStatus::Complete => "complete",
            ResultStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Why an [`AggregatedResult`] ended in [`ResultStatus::Error`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResultError {
    /// The agent sent an error envelope.
    Remote(JsonRpcError),
    /// The stream closed without a final marker under
    /// [`StreamEndPolicy::Terminated`].
    StreamTerminated,
}

impl ResultError {
    /// Returns the taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResultError::Remote(_) => ErrorKind::ProtocolFailure,
            ResultError::StreamTerminated => ErrorKind::StreamTerminated,
        }
    }
}

impl fmt::Display for ResultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultError::Remote(err) => write!(f, "agent error {}: {}", err.code, err.message),
            ResultError::StreamTerminated => f.write_str("stream closed without a final marker"),
        }
    }
}

/// The folded outcome of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedResult {
    /// Completion state.
    pub status: ResultStatus,
    /// Text of the most recent status message.
    pub content: String,
    /// Set when `status` is [`ResultStatus::Error`].
    pub error: Option<ResultError>,
}

impl AggregatedResult {
    /// A fresh, incomplete result with empty content.
    pub fn new() -> Self {
        Self {
            status: ResultStatus::Incomplete,
            content: String::new(),
            error: None,
        }
    }

    /// A completed result with the given content.
    pub fn complete(content: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Complete,
            content: content.into(),
            error: None,
        }
    }

    /// Whether the status has left `Incomplete`.
    pub fn is_terminal(&self) -> bool {
        self.status != ResultStatus::Incomplete
    }
}

impl Default for AggregatedResult {
    fn default() -> Self {
        Self::new()
    }
}

/// What a stream that ends without a final or error marker means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamEndPolicy {
    /// Treat the close as completion with whatever content was last seen.
    #[default]
    ImplicitComplete,
    /// Treat the close as an error ([`ResultError::StreamTerminated`]),
    /// keeping the last content.
    Terminated,
}

impl FromStr for StreamEndPolicy {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "implicit-complete" | "complete" => Ok(StreamEndPolicy::ImplicitComplete),
            "terminated" | "error" => Ok(StreamEndPolicy::Terminated),
            other => Err(DispatchError::Config(format!(
                "unknown stream end policy {other:?} (expected implicit-complete or terminated)"
            ))),
        }
    }
}

/// Whether the fold wants more events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    /// Keep reading.
    Continue,
    /// The result is terminal; stop reading.
    Done,
}

/// Step-wise event fold.
///
/// # Example
///
/// ```
/// use a2a_dispatch::reducer::{EventReducer, Fold, ResultStatus, StreamEndPolicy};
/// use a2a_dispatch::types::TaskUpdateEvent;
///
/// let mut reducer = EventReducer::new();
/// assert_eq!(reducer.apply(&TaskUpdateEvent::status_text("Generating...", false)), Fold::Continue);
/// assert_eq!(reducer.apply(&TaskUpdateEvent::status_text("SELECT 1", true)), Fold::Done);
///
/// let result = reducer.finish(StreamEndPolicy::default());
/// assert_eq!(result.status, ResultStatus::Complete);
/// assert_eq!(result.content, "SELECT 1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventReducer {
    result: AggregatedResult,
}

impl EventReducer {
    /// Start a fold with an incomplete, empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event. Once the result is terminal every further event is
    /// ignored and `Fold::Done` is returned.
    pub fn apply(&mut self, event: &TaskUpdateEvent) -> Fold {
        if self.result.is_terminal() {
            return Fold::Done;
        }

        match event {
            TaskUpdateEvent::KeepAlive => Fold::Continue,
            TaskUpdateEvent::Error(err) => {
                self.result.status = ResultStatus::Error;
                self.result.error = Some(ResultError::Remote(err.clone()));
                Fold::Done
            }
            TaskUpdateEvent::Status { message, r#final } => {
                if let Some(text) = message.as_ref().and_then(|m| m.first_text()) {
                    self.result.content.clear();
                    self.result.content.push_str(text);
                }
                if *r#final {
                    self.result.status = ResultStatus::Complete;
                    Fold::Done
                } else {
                    Fold::Continue
                }
            }
        }
    }

    /// The result as folded so far.
    pub fn result(&self) -> &AggregatedResult {
        &self.result
    }

    /// Close the fold. An incomplete result is resolved by `policy`.
    pub fn finish(mut self, policy: StreamEndPolicy) -> AggregatedResult {
        self.close(policy);
        self.result
    }

    fn close(&mut self, policy: StreamEndPolicy) {
        if self.result.is_terminal() {
            return;
        }
        match policy {
            StreamEndPolicy::ImplicitComplete => {
                self.result.status = ResultStatus::Complete;
            }
            StreamEndPolicy::Terminated => {
                self.result.status = ResultStatus::Error;
                self.result.error = Some(ResultError::StreamTerminated);
            }
        }
    }
}

/// Fold an already-buffered event sequence.
pub fn fold_events<I>(events: I, policy: StreamEndPolicy) -> AggregatedResult
where
    I: IntoIterator<Item = TaskUpdateEvent>,
{
    let mut reducer = EventReducer::new();
    for event in events {
        if reducer.apply(&event) == Fold::Done {
            break;
        }
    }
    reducer.finish(policy)
}

/// Drain an event stream into its final result.
///
/// Events are processed as they arrive. The stream is dropped as soon as
/// the fold terminates, which releases the underlying connection.
///
/// # Errors
///
/// The first `Err` item from the stream aborts the fold and is returned.
pub async fn reduce<S>(mut events: S, policy: StreamEndPolicy) -> DispatchResult<AggregatedResult>
where
    S: Stream<Item = DispatchResult<TaskUpdateEvent>> + Unpin,
{
    let mut reducer = EventReducer::new();
    while let Some(event) = events.next().await {
        if reducer.apply(&event?) == Fold::Done {
            break;
        }
    }
    drop(events);
    Ok(reducer.finish(policy))
}

type EventSource = Pin<Box<dyn Stream<Item = DispatchResult<TaskUpdateEvent>> + Send>>;
type Fallback = Box<dyn FnOnce() -> BoxFuture<'static, String> + Send>;

/// A live sequence of [`AggregatedResult`] snapshots.
///
/// Yields a snapshot every time the folded result changes: new content, or
/// a status change. The last snapshot is terminal. Dropping the
/// `ResultStream` early releases the underlying connection.
///
/// With a fallback installed (see [`with_fallback()`](Self::with_fallback))
/// a broken stream is answered by the fallback instead of an `Err` item.
///
/// # Example
///
/// ```no_run
/// # async fn example(mut live: a2a_dispatch::reducer::ResultStream) {
/// while let Some(snapshot) = live.next().await {
///     match snapshot {
///         Ok(result) => println!("[{}] {}", result.status, result.content),
///         Err(e) => eprintln!("stream failed: {}", e),
///     }
/// }
/// # }
/// ```
pub struct ResultStream {
    events: EventSource,
    reducer: EventReducer,
    policy: StreamEndPolicy,
    fallback: Option<Fallback>,
    fell_back: bool,
    finished: bool,
}

impl std::fmt::Debug for ResultStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStream")
            .field("snapshot", self.reducer.result())
            .field("policy", &self.policy)
            .field("fell_back", &self.fell_back)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl ResultStream {
    /// Wrap an event stream.
    pub fn new<S>(events: S, policy: StreamEndPolicy) -> Self
    where
        S: Stream<Item = DispatchResult<TaskUpdateEvent>> + Send + 'static,
    {
        Self {
            events: Box::pin(events),
            reducer: EventReducer::new(),
            policy,
            fallback: None,
            fell_back: false,
            finished: false,
        }
    }

    /// Answer a broken stream with `fallback` instead of an `Err` item.
    ///
    /// When the event stream yields an error, `fallback` is awaited and its
    /// text becomes the terminal, complete snapshot. Runs at most once.
    pub fn with_fallback<F, Fut>(mut self, fallback: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        self.fallback = Some(Box::new(move || -> BoxFuture<'static, String> {
            Box::pin(fallback())
        }));
        self
    }

    /// Whether the terminal snapshot came from the fallback.
    pub fn fell_back(&self) -> bool {
        self.fell_back
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> &AggregatedResult {
        self.reducer.result()
    }

    /// Pull events until the snapshot changes.
    ///
    /// Returns `None` once a terminal snapshot has been yielded. Without a
    /// fallback an `Err` item ends the sequence and the snapshot keeps
    /// whatever content was last recorded.
    pub async fn next(&mut self) -> Option<DispatchResult<AggregatedResult>> {
        if self.finished {
            return None;
        }

        loop {
            let before = self.reducer.result().clone();
            match self.events.next().await {
                Some(Ok(event)) => {
                    let fold = self.reducer.apply(&event);
                    if fold == Fold::Done {
                        self.release();
                        return Some(Ok(self.reducer.result().clone()));
                    }
                    if *self.reducer.result() != before {
                        return Some(Ok(self.reducer.result().clone()));
                    }
                }
                Some(Err(e)) => {
                    self.release();
                    let Some(fallback) = self.fallback.take() else {
                        return Some(Err(e));
                    };
                    tracing::info!(
                        kind = %e.kind(),
                        error = %e,
                        "stream broke, falling back to regular request"
                    );
                    self.reducer.result = AggregatedResult::complete(fallback().await);
                    self.fell_back = true;
                    return Some(Ok(self.reducer.result().clone()));
                }
                None => {
                    self.reducer.close(self.policy);
                    self.release();
                    return Some(Ok(self.reducer.result().clone()));
                }
            }
        }
    }

    /// Drain the remaining events and return the terminal result.
    pub async fn into_result(mut self) -> DispatchResult<AggregatedResult> {
        while let Some(snapshot) = self.next().await {
            snapshot?;
        }
        Ok(self.reducer.result().clone())
    }

    /// Convert into a `futures::Stream` of snapshots.
    pub fn into_stream(self) -> impl Stream<Item = DispatchResult<AggregatedResult>> + Send {
        stream::unfold(self, |mut live| async move {
            live.next().await.map(|item| (item, live))
        })
    }

    fn release(&mut self) {
        self.finished = true;
        self.events = Box::pin(stream::empty());
    }
}
