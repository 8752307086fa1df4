//! Builder patterns for ergonomic construction of clients and dispatchers.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{TaskClient, TransportConfig};
use crate::config::DispatcherConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{DispatchError, DispatchResult};
use crate::reasoner::{ChatCompletionsReasoner, Reasoner};
use crate::reducer::StreamEndPolicy;
use crate::routing::AgentKind;

/// Builder for a [`TaskClient`] with custom transport settings.
///
/// # Example
///
/// ```
/// use a2a_dispatch::builders::TaskClientBuilder;
/// use std::time::Duration;
///
/// let client = TaskClientBuilder::new("http://localhost:10002")
///     .with_request_timeout(Duration::from_secs(30))
///     .with_bearer_token("token")
///     .build();
/// assert_eq!(client.base_url(), "http://localhost:10002");
/// ```
#[derive(Debug, Clone)]
pub struct TaskClientBuilder {
    url: String,
    config: TransportConfig,
}

impl TaskClientBuilder {
    /// Create a new client builder for the given agent base URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            config: TransportConfig::default(),
        }
    }

    /// Replace the whole transport configuration.
    pub fn with_config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the single-shot request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the stream establishment timeout.
    pub fn with_stream_open_timeout(mut self, timeout: Duration) -> Self {
        self.config.stream_open_timeout = timeout;
        self
    }

    /// Set the stream idle timeout; `None` waits forever.
    pub fn with_stream_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.stream_idle_timeout = timeout;
        self
    }

    /// Add a custom HTTP header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(key.into(), value.into());
        self
    }

    /// Add an Authorization header with a bearer token.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.config.headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", token.into()),
        );
        self
    }

    /// Build the client.
    pub fn build(self) -> TaskClient {
        TaskClient::with_config(&self.url, self.config)
    }
}

/// Builder for a [`Dispatcher`].
///
/// # Example
///
/// ```no_run
/// use a2a_dispatch::builders::DispatcherBuilder;
/// use a2a_dispatch::client::TaskClient;
/// use a2a_dispatch::reasoner::{ChatCompletionsReasoner, ReasonerConfig};
/// use a2a_dispatch::routing::AgentKind;
///
/// let dispatcher = DispatcherBuilder::new()
///     .with_agent(AgentKind::Sql, TaskClient::new("http://localhost:10002"))
///     .with_agent(AgentKind::Rag, TaskClient::new("http://localhost:10001"))
///     .with_reasoner(ChatCompletionsReasoner::new(ReasonerConfig::new("gsk_...")))
///     .build()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct DispatcherBuilder {
    agents: BTreeMap<AgentKind, TaskClient>,
    reasoner: Option<Arc<dyn Reasoner>>,
    stream_end_policy: StreamEndPolicy,
}

impl DispatcherBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from configuration: one client per configured agent
    /// URL and a chat-completions reasoner.
    pub fn from_config(config: &DispatcherConfig) -> Self {
        let mut builder = Self::new()
            .with_reasoner(ChatCompletionsReasoner::new(config.reasoner.clone()))
            .with_stream_end_policy(config.stream_end_policy);
        for (kind, url) in &config.agents {
            builder = builder.with_agent(*kind, TaskClient::with_config(url, config.transport.clone()));
        }
        builder
    }

    /// Register (or replace) the client for `kind`.
    pub fn with_agent(mut self, kind: AgentKind, client: TaskClient) -> Self {
        self.agents.insert(kind, client);
        self
    }

    /// Set the reasoner.
    pub fn with_reasoner(self, reasoner: impl Reasoner + 'static) -> Self {
        self.with_shared_reasoner(Arc::new(reasoner))
    }

    /// Set a reasoner that is shared with other owners.
    pub fn with_shared_reasoner(mut self, reasoner: Arc<dyn Reasoner>) -> Self {
        self.reasoner = Some(reasoner);
        self
    }

    /// Set how a stream closing without a final marker is interpreted.
    pub fn with_stream_end_policy(mut self, policy: StreamEndPolicy) -> Self {
        self.stream_end_policy = policy;
        self
    }

    /// Build the dispatcher.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Config`] when no reasoner was set.
    pub fn build(self) -> DispatchResult<Dispatcher> {
        let reasoner = self
            .reasoner
            .ok_or_else(|| DispatchError::Config("dispatcher needs a reasoner".to_string()))?;
        if self.agents.is_empty() {
            tracing::warn!("dispatcher has no agents registered; every query is answered locally");
        }
        Ok(Dispatcher::new(reasoner, self.agents).with_stream_end_policy(self.stream_end_policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_client_builder_collects_settings() {
        let builder = TaskClientBuilder::new("http://localhost:8080")
            .with_request_timeout(Duration::from_secs(30))
            .with_stream_idle_timeout(None)
            .with_bearer_token("test-token");

        assert_eq!(builder.url, "http://localhost:8080");
        assert_eq!(builder.config.request_timeout, Duration::from_secs(30));
        assert_eq!(builder.config.stream_idle_timeout, None);
        assert_eq!(
            builder.config.headers.get("Authorization"),
            Some(&"Bearer test-token".to_string())
        );
    }

    #[test]
    fn dispatcher_builder_requires_reasoner() {
        let err = DispatcherBuilder::new()
            .with_agent(AgentKind::Sql, TaskClient::new("http://localhost:10002"))
            .build()
            .unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
    }
}
