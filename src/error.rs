//! Error types for the dispatch layer.
//!
//! A single [`DispatchError`] enum covers every failure the protocol client,
//! event reducer and dispatcher can observe. [`DispatchError::kind()`] maps
//! each variant onto the coarse [`ErrorKind`] taxonomy the routing layer uses
//! to decide between falling back and absorbing the failure.

use std::fmt;

use crate::types::JsonRpcError;

/// Coarse failure categories used by the routing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection, DNS, TLS, timeout or non-2xx HTTP status.
    TransportFailure,
    /// Malformed or unexpected JSON shape, or a JSON-RPC error response.
    ProtocolFailure,
    /// The event stream closed without a final marker. Reported inside a
    /// result, see [`ResultError::kind`](crate::reducer::ResultError::kind).
    StreamTerminated,
    /// The classifier produced output outside the closed label set.
    ClassificationAmbiguous,
    /// Invalid configuration.
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::TransportFailure => "transport failure",
            ErrorKind::ProtocolFailure => "protocol failure",
            ErrorKind::StreamTerminated => "stream terminated",
            ErrorKind::ClassificationAmbiguous => "classification ambiguous",
            ErrorKind::Configuration => "configuration",
        };
        f.write_str(s)
    }
}

/// Unified error type for the dispatch layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    /// Transport-level error (connection failed, request failed, etc.).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Connection establishment, request or stream idle time exceeded.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// HTTP error with status code and response body.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Invalid JSON or an unexpected response shape.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// A JSON-RPC error response was received from the remote agent.
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
        /// Optional structured error data.
        data: Option<serde_json::Value>,
    },

    /// The classifier returned a label outside the closed set.
    #[error("unrecognized routing label: {0:?}")]
    UnknownLabel(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    /// Returns the taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Transport(_) | DispatchError::Timeout(_) | DispatchError::Http { .. } => {
                ErrorKind::TransportFailure
            }
            DispatchError::InvalidJson(_) | DispatchError::JsonRpc { .. } => {
                ErrorKind::ProtocolFailure
            }
            DispatchError::UnknownLabel(_) => ErrorKind::ClassificationAmbiguous,
            DispatchError::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Whether a streaming call that failed this way should be retried as a
    /// single-shot `tasks/send`.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TransportFailure | ErrorKind::ProtocolFailure
        )
    }

    /// Map a `reqwest` send error onto `Timeout` or `Transport`.
    pub(crate) fn from_reqwest(context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DispatchError::Timeout(format!("{context} timed out: {err}"))
        } else if err.is_connect() {
            DispatchError::Transport(format!("{context}: connection failed: {err}"))
        } else {
            DispatchError::Transport(format!("{context}: HTTP request failed: {err}"))
        }
    }
}

impl From<JsonRpcError> for DispatchError {
    fn from(err: JsonRpcError) -> Self {
        DispatchError::JsonRpc {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::InvalidJson(err.to_string())
    }
}
