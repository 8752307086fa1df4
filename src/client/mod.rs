//! Protocol client: talk to one remote agent.
//!
//! - [`TaskClient`]: `tasks/send`, `tasks/sendSubscribe` and discovery
//!   against one agent endpoint
//! - [`CardResolver`]: fetch `/.well-known/agent.json`
//! - [`Transport`] / [`JsonRpcTransport`]: pluggable transport layer
//! - [`TaskEventStream`]: decoded event stream of a subscribed task
//!
//! # Quick Start
//!
//! ```no_run
//! use a2a_dispatch::client::TaskClient;
//! use a2a_dispatch::reducer::reduce;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TaskClient::new("http://localhost:10002");
//!
//! match client.send_task_subscribe("show me sales by region").await {
//!     Some(stream) => {
//!         let result = reduce(stream, Default::default()).await?;
//!         println!("{}", result.content);
//!     }
//!     None => println!("{}", client.send_task("show me sales by region").await),
//! }
//! # Ok(())
//! # }
//! ```

mod card_resolver;
mod sse;
mod task_client;
mod transport;

pub use card_resolver::CardResolver;
pub use sse::TaskEventStream;
pub use task_client::TaskClient;
pub use transport::{JsonRpcTransport, Transport, TransportConfig};
