//! # a2a-dispatch: route queries to specialized A2A agents
//!
//! This crate sits in front of a small fleet of remote agents speaking the
//! task-oriented A2A protocol (JSON-RPC 2.0 over HTTP, with Server-Sent Events
//! for streaming). For each incoming query it asks a language model which
//! agent should answer, opens a streaming task with that agent, folds the
//! stream of status updates into a single evolving result, and falls back to
//! a plain request (or a local answer) when streaming is not possible.
//!
//! ## Overview
//!
//! - **Protocol client** ([`client::TaskClient`]): `tasks/send`,
//!   `tasks/sendSubscribe` and agent card discovery against one agent
//! - **Event reducer** ([`reducer`]): turns task update events into an
//!   [`AggregatedResult`] with last-writer-wins content
//! - **Dispatcher** ([`Dispatcher`]): classification, routing, streaming with
//!   single-shot fallback, local answers
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | yes     | The `a2a-dispatch` terminal front-end (logging subscriber, `.env` loading) |
//!
//! ## Quick Start
//!
//! ```no_run
//! use a2a_dispatch::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DispatcherConfig::from_env()?;
//!     let dispatcher = DispatcherBuilder::from_config(&config).build()?;
//!
//!     let (decision, reply) = dispatcher.dispatch("show me total sales by region").await;
//!     println!("Routing to {decision}...");
//!     match reply {
//!         Reply::Text(text) => println!("{text}"),
//!         Reply::Stream(mut live) => {
//!             while let Some(snapshot) = live.next().await {
//!                 println!("{}", snapshot?.content);
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Protocol
//!
//! Supported JSON-RPC methods (sent to the agent's base URL):
//! - `tasks/send`: run a task, answer in one response
//! - `tasks/sendSubscribe`: run a task, answer as an SSE stream of status updates
//!
//! Agent cards are read from `GET /.well-known/agent.json`.

pub mod builders;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod reasoner;
pub mod reducer;
pub mod routing;
pub mod session;
pub mod types;
pub mod utils;

/// Prelude module that re-exports commonly used types and traits.
///
/// ```
/// use a2a_dispatch::prelude::*;
///
/// let decision = RoutingDecision::parse("sql");
/// assert_eq!(decision, RoutingDecision::Agent(AgentKind::Sql));
/// ```
pub mod prelude {
    pub use crate::builders::{DispatcherBuilder, TaskClientBuilder};
    pub use crate::client::{TaskClient, TaskEventStream, Transport, TransportConfig};
    pub use crate::config::DispatcherConfig;
    pub use crate::dispatcher::{Answer, Dispatcher, Outcome, Reply, RoutePath};
    pub use crate::error::{DispatchError, DispatchResult, ErrorKind};
    pub use crate::reasoner::{ChatCompletionsReasoner, Reasoner, ReasonerConfig};
    pub use crate::reducer::{AggregatedResult, ResultStatus, ResultStream, StreamEndPolicy};
    pub use crate::routing::{AgentKind, RoutingDecision};
    pub use crate::types::{AgentCard, Message, Part, TaskUpdateEvent};
}

pub use builders::{DispatcherBuilder, TaskClientBuilder};
pub use client::TaskClient;
pub use config::DispatcherConfig;
pub use dispatcher::{Answer, Dispatcher, Reply};
pub use error::{DispatchError, DispatchResult};
pub use reducer::{AggregatedResult, ResultStatus, StreamEndPolicy};
pub use routing::{AgentKind, RoutingDecision};
