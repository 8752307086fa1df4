//! Protocol client for one remote agent.
//!
//! [`TaskClient`] speaks `tasks/send`, `tasks/sendSubscribe` and card
//! discovery to exactly one endpoint. Each operation comes in two flavours:
//! `try_*` methods return the typed [`DispatchError`], while the plain
//! methods absorb failures into an empty or absent result and log them, which
//! is what the dispatcher relies on.

use serde::de::DeserializeOwned;

use crate::error::{DispatchError, DispatchResult};
use crate::session::Session;
use crate::types::{AgentCard, JsonRpcRequest, JsonRpcResponse, Message, Task, TaskSendParams};
use crate::utils::{
    ACCEPTED_OUTPUT_MODES, DEFAULT_RPC_PATH, METHOD_TASKS_SEND, METHOD_TASKS_SEND_SUBSCRIBE,
};

use super::card_resolver::CardResolver;
use super::sse::TaskEventStream;
use super::transport::{JsonRpcTransport, Transport, TransportConfig};

/// Client for one task-protocol agent.
///
/// Holds the agent's base URL, a [`Session`] created with the client, and the
/// transport. Calls share no mutable state and may run concurrently.
///
/// # Example
///
/// ```no_run
/// use a2a_dispatch::client::TaskClient;
///
/// # async fn example() {
/// let client = TaskClient::new("http://localhost:10002");
///
/// // Single-shot: empty string on failure.
/// let sql = client.send_task("show me sales by region").await;
///
/// // Streaming: `None` when the stream cannot be opened.
/// if let Some(mut stream) = client.send_task_subscribe("show me sales by region").await {
///     while let Some(event) = stream.next().await {
///         println!("{:?}", event);
///     }
/// }
/// # }
/// ```
pub struct TaskClient {
    base_url: String,
    session: Session,
    transport: Box<dyn Transport>,
    resolver: CardResolver,
}

impl std::fmt::Debug for TaskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl TaskClient {
    /// Create a client for the agent at `base_url` with default transport
    /// settings. Requests are posted to `{base_url}/`.
    pub fn new(base_url: &str) -> Self {
        Self::with_config(base_url, TransportConfig::default())
    }

    /// Create a client with custom transport settings.
    pub fn with_config(base_url: &str, config: TransportConfig) -> Self {
        let base_url = normalize_base(base_url);
        let client = config.http_client();
        let resolver = CardResolver::with_client(client.clone()).with_timeout(config.request_timeout);
        let transport = JsonRpcTransport::with_client(rpc_url(&base_url), client, config);
        Self {
            base_url,
            session: Session::new(),
            transport: Box::new(transport),
            resolver,
        }
    }

    /// Create a client with a custom transport.
    ///
    /// `base_url` is still used for discovery.
    pub fn with_transport(base_url: &str, transport: Box<dyn Transport>) -> Self {
        Self {
            base_url: normalize_base(base_url),
            session: Session::new(),
            transport,
            resolver: CardResolver::new(),
        }
    }

    /// The agent's base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session shared by every task this client issues.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Build a task request for `method` carrying `text` as a user message.
    ///
    /// A fresh task id is minted on every call. Streaming requests use
    /// `{task_id}-send` as their JSON-RPC id; single-shot requests reuse the
    /// task id.
    pub fn task_request(&self, method: &str, text: &str) -> DispatchResult<JsonRpcRequest> {
        let task_id = self.session.next_task_id();
        let params = TaskSendParams {
            id: task_id.clone(),
            session_id: self.session.id().to_string(),
            message: Message::user_text(text),
            accepted_output_modes: ACCEPTED_OUTPUT_MODES.iter().map(|m| m.to_string()).collect(),
            metadata: None,
        };
        let params = serde_json::to_value(&params).map_err(|e| {
            DispatchError::Transport(format!("failed to serialize request params: {e}"))
        })?;

        let rpc_id = if method == METHOD_TASKS_SEND_SUBSCRIBE {
            format!("{task_id}-send")
        } else {
            task_id
        };

        Ok(JsonRpcRequest::new(rpc_id, method, Some(params)))
    }

    // ──────────────────────────────────────────────────
    // Discovery
    // ──────────────────────────────────────────────────

    /// Fetch the agent card from `{base_url}/.well-known/agent.json`.
    pub async fn try_discover(&self) -> DispatchResult<AgentCard> {
        self.resolver.resolve(&self.base_url).await
    }

    /// Fetch the agent card, or `None` (logged) on any failure.
    pub async fn discover(&self) -> Option<AgentCard> {
        match self.try_discover().await {
            Ok(card) => Some(card),
            Err(e) => {
                tracing::warn!(agent = %self.base_url, error = %e, "agent discovery failed");
                None
            }
        }
    }

    // ──────────────────────────────────────────────────
    // Single-shot
    // ──────────────────────────────────────────────────

    /// Send `tasks/send` and return the first text part of the task's status
    /// message.
    ///
    /// # Errors
    ///
    /// Transport errors as returned by the transport, [`DispatchError::JsonRpc`]
    /// when the agent answers with an error, and [`DispatchError::InvalidJson`]
    /// when the result lacks `status.message` or a text part.
    pub async fn try_send_task(&self, text: &str) -> DispatchResult<String> {
        let request = self.task_request(METHOD_TASKS_SEND, text)?;
        tracing::debug!(agent = %self.base_url, id = ?request.id, "tasks/send");

        let response = self.transport.send(&request).await?;
        let task: Task = parse_result(response)?;

        let message = task.status.message.ok_or_else(|| {
            DispatchError::InvalidJson("task status carries no message".to_string())
        })?;

        message.first_text().map(str::to_string).ok_or_else(|| {
            DispatchError::InvalidJson("task status message has no text part".to_string())
        })
    }

    /// Send `tasks/send`; an empty string (logged) on any failure.
    pub async fn send_task(&self, text: &str) -> String {
        match self.try_send_task(text).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    agent = %self.base_url,
                    kind = %e.kind(),
                    error = %e,
                    "error sending task"
                );
                String::new()
            }
        }
    }

    // ──────────────────────────────────────────────────
    // Streaming
    // ──────────────────────────────────────────────────

    /// Send `tasks/sendSubscribe` and return the live event stream.
    pub async fn try_send_task_subscribe(&self, text: &str) -> DispatchResult<TaskEventStream> {
        let request = self.task_request(METHOD_TASKS_SEND_SUBSCRIBE, text)?;
        tracing::debug!(agent = %self.base_url, id = ?request.id, "tasks/sendSubscribe");
        self.transport.send_stream(&request).await
    }

    /// Send `tasks/sendSubscribe`; `None` (logged) when the stream cannot be
    /// established, signalling the caller to fall back to
    /// [`send_task()`](Self::send_task).
    pub async fn send_task_subscribe(&self, text: &str) -> Option<TaskEventStream> {
        match self.try_send_task_subscribe(text).await {
            Ok(stream) => Some(stream),
            Err(e) => {
                tracing::warn!(
                    agent = %self.base_url,
                    kind = %e.kind(),
                    error = %e,
                    "error sending task with subscription"
                );
                None
            }
        }
    }

    /// Close the client and release any held resources.
    pub async fn close(self) -> DispatchResult<()> {
        self.transport.close().await
    }
}

// ──────────────────────────────────────────────────
// Internal helpers
// ──────────────────────────────────────────────────

fn normalize_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

fn rpc_url(base_url: &str) -> String {
    format!("{base_url}{DEFAULT_RPC_PATH}")
}

/// Parse the `result` field from a JSON-RPC response into the expected type.
///
/// If the response contains an error, converts it into a
/// [`DispatchError::JsonRpc`].
fn parse_result<T: DeserializeOwned>(response: JsonRpcResponse) -> DispatchResult<T> {
    if let Some(error) = response.error {
        return Err(error.into());
    }

    let result = response.result.ok_or_else(|| {
        DispatchError::InvalidJson("JSON-RPC response has neither 'result' nor 'error'".to_string())
    })?;

    serde_json::from_value(result)
        .map_err(|e| DispatchError::InvalidJson(format!("failed to deserialize response result: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_url_posts_to_root() {
        let client = TaskClient::new("http://localhost:10002/");
        assert_eq!(client.base_url(), "http://localhost:10002");
        assert_eq!(rpc_url(client.base_url()), "http://localhost:10002/");
    }

    #[test]
    fn subscribe_request_id_has_send_suffix() {
        let client = TaskClient::new("http://localhost:10002");
        let request = client
            .task_request(METHOD_TASKS_SEND_SUBSCRIBE, "hi")
            .unwrap();
        let params = request.params.unwrap();
        let task_id = params["id"].as_str().unwrap();
        assert_eq!(
            request.id.unwrap().to_string(),
            format!("{task_id}-send")
        );
    }

    #[test]
    fn parse_result_without_result_or_error() {
        let response = JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id: None,
            result: None,
            error: None,
        };
        let err = parse_result::<Task>(response).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidJson(_)));
    }
}
