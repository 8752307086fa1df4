//! Query dispatch: classify, pick a target, stream or fall back.
//!
//! Per query the dispatcher moves through
//!
//! ```text
//! Classifying ──► Streaming ──► Answered / AnsweredWithError
//!      │              │
//!      │              └─(stream unavailable or broken)─► SingleShot ──► Answered
//!      └──► Local ──► Answered
//! ```
//!
//! Transport failures never reach the caller: a stream that cannot be opened
//! or breaks while being read is retried as `tasks/send` on the same agent,
//! and single-shot failures surface as empty text. The only error a caller sees is an agent's own error envelope,
//! reported inside the [`AggregatedResult`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::builders::DispatcherBuilder;
use crate::client::TaskClient;
use crate::reasoner::Reasoner;
use crate::reducer::{reduce, AggregatedResult, ResultStatus, ResultStream, StreamEndPolicy};
use crate::routing::{AgentKind, RoutingDecision};
use crate::types::AgentCard;

/// Reply used when the local answer path produces nothing.
pub const LOCAL_FALLBACK_REPLY: &str = "I couldn't process your query.";

/// Build the constrained classification prompt for `query`.
pub fn classification_prompt(query: &str) -> String {
    let labels = RoutingDecision::labels()
        .iter()
        .map(|l| format!("'{l}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Decide if this query should be handled by the SQL writer agent or the RAG agent: {query}. \
         You must answer with exactly one word, one of {labels}, and nothing else."
    )
}

/// What [`Dispatcher::route`] hands back.
#[derive(Debug)]
pub enum Reply {
    /// A complete text answer (single-shot or local).
    Text(String),
    /// A live sequence of result snapshots.
    Stream(ResultStream),
}

impl Reply {
    /// Drain to a final result. A `Text` reply is already complete.
    pub async fn into_result(self) -> crate::error::DispatchResult<AggregatedResult> {
        match self {
            Reply::Text(text) => Ok(AggregatedResult::complete(text)),
            Reply::Stream(live) => live.into_result().await,
        }
    }
}

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePath {
    /// Folded from a `tasks/sendSubscribe` stream.
    Streaming,
    /// One `tasks/send` call.
    SingleShot,
    /// Answered by the reasoner, no remote agent involved.
    Local,
}

/// Terminal outcome of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A text answer, possibly empty.
    Answered,
    /// An error was reported; `content` holds any best-effort text.
    AnsweredWithError,
}

/// The drained result of [`Dispatcher::answer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// What the classifier decided.
    pub decision: RoutingDecision,
    /// How the answer was produced.
    pub path: RoutePath,
    /// The final result.
    pub result: AggregatedResult,
}

impl Answer {
    /// `AnsweredWithError` when the result carries an error.
    pub fn outcome(&self) -> Outcome {
        if self.result.status == ResultStatus::Error {
            Outcome::AnsweredWithError
        } else {
            Outcome::Answered
        }
    }
}

/// Routes queries to specialized agents.
///
/// Owns one [`TaskClient`] per registered [`AgentKind`] and shares a
/// [`Reasoner`] for classification and local answers. Queries issued
/// concurrently share nothing mutable.
pub struct Dispatcher {
    agents: BTreeMap<AgentKind, Arc<TaskClient>>,
    reasoner: Arc<dyn Reasoner>,
    stream_end_policy: StreamEndPolicy,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("agents", &self.agents)
            .field("stream_end_policy", &self.stream_end_policy)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher from an explicit agent registry.
    pub fn new(reasoner: Arc<dyn Reasoner>, agents: BTreeMap<AgentKind, TaskClient>) -> Self {
        Self {
            agents: agents
                .into_iter()
                .map(|(kind, client)| (kind, Arc::new(client)))
                .collect(),
            reasoner,
            stream_end_policy: StreamEndPolicy::default(),
        }
    }

    /// Start a [`DispatcherBuilder`].
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Set how a stream closing without a final marker is interpreted.
    pub fn with_stream_end_policy(mut self, policy: StreamEndPolicy) -> Self {
        self.stream_end_policy = policy;
        self
    }

    /// The active stream end policy.
    pub fn stream_end_policy(&self) -> StreamEndPolicy {
        self.stream_end_policy
    }

    /// The client registered for `kind`.
    pub fn agent(&self, kind: AgentKind) -> Option<&TaskClient> {
        self.agents.get(&kind).map(Arc::as_ref)
    }

    /// Registered agents in label order.
    pub fn agents(&self) -> impl Iterator<Item = (AgentKind, &TaskClient)> {
        self.agents.iter().map(|(kind, client)| (*kind, client.as_ref()))
    }

    /// Ask the reasoner which target should handle `query`.
    ///
    /// Reasoner failures, empty replies and labels outside the closed set
    /// all yield [`RoutingDecision::Local`].
    pub async fn classify(&self, query: &str) -> RoutingDecision {
        let decision = match self.reasoner.reply(&classification_prompt(query)).await {
            Ok(Some(output)) => RoutingDecision::parse(&output),
            Ok(None) => RoutingDecision::Local,
            Err(e) => {
                tracing::warn!(error = %e, "classification failed, answering locally");
                RoutingDecision::Local
            }
        };
        tracing::info!(decision = %decision, "query classified");
        decision
    }

    /// Send `query` where `decision` says.
    ///
    /// An agent decision opens a stream; if that fails the same agent is
    /// asked with `tasks/send` and its text returned. A stream that breaks
    /// later is answered the same way, as its terminal snapshot. `Local` (or
    /// an agent that is not registered) is answered by the reasoner.
    pub async fn route(&self, query: &str, decision: RoutingDecision) -> Reply {
        let Some((kind, client)) = self.target(decision) else {
            return Reply::Text(self.answer_locally(query).await);
        };

        tracing::info!(agent = %kind, "routing to agent (streaming)");
        match client.try_send_task_subscribe(query).await {
            Ok(events) => {
                let client = Arc::clone(client);
                let query = query.to_string();
                let live = ResultStream::new(events, self.stream_end_policy)
                    .with_fallback(move || async move { client.send_task(&query).await });
                Reply::Stream(live)
            }
            Err(e) => {
                tracing::info!(
                    agent = %kind,
                    kind = %e.kind(),
                    error = %e,
                    "streaming not available, falling back to regular request"
                );
                Reply::Text(client.send_task(query).await)
            }
        }
    }

    /// Classify and route: the caller-facing entry point.
    pub async fn dispatch(&self, query: &str) -> (RoutingDecision, Reply) {
        let decision = self.classify(query).await;
        let reply = self.route(query, decision).await;
        (decision, reply)
    }

    /// Classify, route and drain to a final [`Answer`].
    ///
    /// A stream that cannot be opened or breaks while being read falls back
    /// to `tasks/send` on the same agent.
    pub async fn answer(&self, query: &str) -> Answer {
        let decision = self.classify(query).await;

        let Some((kind, client)) = self.target(decision) else {
            let text = self.answer_locally(query).await;
            return Answer {
                decision,
                path: RoutePath::Local,
                result: AggregatedResult::complete(text),
            };
        };

        tracing::info!(agent = %kind, "routing to agent (streaming)");
        let streamed = match client.try_send_task_subscribe(query).await {
            Ok(events) => reduce(events, self.stream_end_policy).await,
            Err(e) => Err(e),
        };

        match streamed {
            Ok(result) => Answer {
                decision,
                path: RoutePath::Streaming,
                result,
            },
            Err(e) => {
                tracing::info!(
                    agent = %kind,
                    kind = %e.kind(),
                    error = %e,
                    "streaming failed, falling back to regular request"
                );
                Answer {
                    decision,
                    path: RoutePath::SingleShot,
                    result: AggregatedResult::complete(client.send_task(query).await),
                }
            }
        }
    }

    /// Fetch every registered agent's card. Failures are logged and
    /// reported as `None`.
    pub async fn discover_agents(&self) -> Vec<(AgentKind, Option<AgentCard>)> {
        let mut cards = Vec::with_capacity(self.agents.len());
        for (kind, client) in &self.agents {
            cards.push((*kind, client.discover().await));
        }
        cards
    }

    fn target(&self, decision: RoutingDecision) -> Option<(AgentKind, &Arc<TaskClient>)> {
        match decision {
            RoutingDecision::Agent(kind) => match self.agents.get(&kind) {
                Some(client) => Some((kind, client)),
                None => {
                    tracing::warn!(agent = %kind, "no client registered for agent, answering locally");
                    None
                }
            },
            RoutingDecision::Local => None,
        }
    }

    async fn answer_locally(&self, query: &str) -> String {
        tracing::info!("handling query directly");
        match self.reasoner.reply(query).await {
            Ok(Some(text)) => text,
            Ok(None) => LOCAL_FALLBACK_REPLY.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "local answer failed");
                LOCAL_FALLBACK_REPLY.to_string()
            }
        }
    }
}
