//! Transport layer for task protocol communication.
//!
//! Provides the `Transport` trait for abstracting over how JSON-RPC requests
//! reach an agent, and `JsonRpcTransport` for the standard JSON-RPC over HTTP
//! binding.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};

use crate::error::{DispatchError, DispatchResult};
use crate::types::{JsonRpcRequest, JsonRpcResponse};
use crate::utils::EVENT_STREAM_MIME;

use super::sse::TaskEventStream;

/// Transport abstraction for the task protocol.
///
/// Implementations handle the low-level details of sending JSON-RPC requests
/// and receiving responses (or event streams) over a particular binding.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a JSON-RPC request and receive a JSON-RPC response.
    async fn send(&self, request: &JsonRpcRequest) -> DispatchResult<JsonRpcResponse>;

    /// Send a JSON-RPC request and receive an event stream.
    ///
    /// Used for `tasks/sendSubscribe`.
    async fn send_stream(&self, request: &JsonRpcRequest) -> DispatchResult<TaskEventStream>;

    /// Close the transport and release any held resources.
    ///
    /// The default implementation is a no-op.
    async fn close(&self) -> DispatchResult<()> {
        Ok(())
    }
}

/// Configuration for [`JsonRpcTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    /// TCP/TLS connect timeout, for both request modes. Defaults to 10 seconds.
    pub connect_timeout: Duration,
    /// Total time allowed for a single-shot request. Defaults to 60 seconds.
    pub request_timeout: Duration,
    /// Time allowed until event-stream response headers arrive. Defaults to
    /// 30 seconds.
    pub stream_open_timeout: Duration,
    /// Maximum gap between two event-stream chunks. Defaults to 120 seconds;
    /// `None` waits forever.
    pub stream_idle_timeout: Option<Duration>,
    /// Additional HTTP headers to include on every request.
    pub headers: HashMap<String, String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            stream_open_timeout: Duration::from_secs(30),
            stream_idle_timeout: Some(Duration::from_secs(120)),
            headers: HashMap::new(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` honouring the connect timeout and headers.
    pub(crate) fn http_client(&self) -> reqwest::Client {
        let mut default_headers = HeaderMap::new();
        for (key, value) in &self.headers {
            if let (Ok(name), Ok(val)) = (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                default_headers.insert(name, val);
            } else {
                tracing::warn!(header = %key, "skipping invalid HTTP header");
            }
        }

        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .default_headers(default_headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    }
}

/// JSON-RPC over HTTP transport using `reqwest`.
///
/// Sends POST requests with `Content-Type: application/json` and parses the
/// response as a JSON-RPC result or error. Streaming requests additionally
/// send `Accept: text/event-stream` and hand the body to a
/// [`TaskEventStream`].
///
/// # Example
///
/// ```no_run
/// use a2a_dispatch::client::JsonRpcTransport;
///
/// let transport = JsonRpcTransport::new("http://localhost:10002/");
/// ```
#[derive(Debug, Clone)]
pub struct JsonRpcTransport {
    client: reqwest::Client,
    url: String,
    config: TransportConfig,
}

impl JsonRpcTransport {
    /// Create a new transport posting to the given URL with default
    /// configuration.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_config(url, TransportConfig::default())
    }

    /// Create a new transport with custom configuration.
    pub fn with_config(url: impl Into<String>, config: TransportConfig) -> Self {
        Self {
            client: config.http_client(),
            url: url.into(),
            config,
        }
    }

    /// Create a new transport with an existing `reqwest::Client`.
    ///
    /// The client's own settings win over the connect timeout and headers
    /// of `config`; request and stream timeouts still apply.
    pub fn with_client(url: impl Into<String>, client: reqwest::Client, config: TransportConfig) -> Self {
        Self {
            client,
            url: url.into(),
            config,
        }
    }

    /// Returns the URL this transport sends requests to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Set the single-shot request timeout (builder-style).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Add a custom header (builder-style).
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.config.headers.insert(key.to_string(), value.to_string());
        self.client = self.config.http_client();
        self
    }

    fn encode(request: &JsonRpcRequest) -> DispatchResult<Vec<u8>> {
        serde_json::to_vec(request).map_err(|e| {
            DispatchError::Transport(format!("failed to serialize JSON-RPC request: {e}"))
        })
    }
}

/// Turn a non-2xx response into [`DispatchError::Http`].
async fn check_status(response: reqwest::Response) -> DispatchResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DispatchError::Http {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl Transport for JsonRpcTransport {
    async fn send(&self, request: &JsonRpcRequest) -> DispatchResult<JsonRpcResponse> {
        let body = Self::encode(request)?;

        tracing::debug!(url = %self.url, method = %request.method, "sending JSON-RPC request");

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.config.request_timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| DispatchError::from_reqwest("request", e))?;

        let response = check_status(response).await?;

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                DispatchError::Timeout(format!("reading response body timed out: {e}"))
            } else {
                DispatchError::Transport(format!("failed to read response body: {e}"))
            }
        })?;

        let rpc_response: JsonRpcResponse = serde_json::from_slice(&bytes).map_err(|e| {
            DispatchError::InvalidJson(format!("failed to parse JSON-RPC response: {e}"))
        })?;

        Ok(rpc_response)
    }

    async fn send_stream(&self, request: &JsonRpcRequest) -> DispatchResult<TaskEventStream> {
        let body = Self::encode(request)?;

        tracing::debug!(url = %self.url, method = %request.method, "opening event stream");

        let pending = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, EVENT_STREAM_MIME)
            .body(body)
            .send();

        let limit = self.config.stream_open_timeout;
        let response = tokio::time::timeout(limit, pending)
            .await
            .map_err(|_| {
                DispatchError::Timeout(format!("event stream not established within {limit:?}"))
            })?
            .map_err(|e| DispatchError::from_reqwest("stream request", e))?;

        let response = check_status(response).await?;

        Ok(TaskEventStream::from_response(
            response,
            self.config.stream_idle_timeout,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.stream_open_timeout, Duration::from_secs(30));
        assert_eq!(config.stream_idle_timeout, Some(Duration::from_secs(120)));
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_builder_methods_keep_config() {
        let transport = JsonRpcTransport::new("http://example.com/")
            .with_timeout(Duration::from_secs(5))
            .with_header("Authorization", "Bearer t");
        assert_eq!(transport.url(), "http://example.com/");
        assert_eq!(transport.config().request_timeout, Duration::from_secs(5));
        assert_eq!(transport.config().headers["Authorization"], "Bearer t");
    }
}
