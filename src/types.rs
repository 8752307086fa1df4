//! Wire types for the A2A task protocol (`tasks/send`, `tasks/sendSubscribe`).
//!
//! All types serialize to/from the camelCase JSON used on the wire. Parts
//! are discriminated by a `type` field:
//!
//! - Text: `{"type": "text", "text": "hello"}`
//! - File: `{"type": "file", "file": {...}}`
//! - Data: `{"type": "data", "data": {...}}`
//!
//! Deserialization tolerates fields this layer does not consume: unknown
//! part types decode as [`Part::Unknown`], unknown task
//! states as [`TaskState::Unknown`].

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Enums
// ============================================================================

/// Lifecycle state of a remote task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Received, not yet started.
    Submitted,
    /// Being processed.
    Working,
    /// Waiting on the caller.
    InputRequired,
    /// Finished successfully.
    Completed,
    /// Canceled by the caller.
    Canceled,
    /// Finished with an error.
    Failed,
    /// Any state this client does not know about.
    #[serde(other)]
    Unknown,
}

impl Default for TaskState {
    fn default() -> Self {
        TaskState::Unknown
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::InputRequired => "input-required",
            TaskState::Completed => "completed",
            TaskState::Canceled => "canceled",
            TaskState::Failed => "failed",
            TaskState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Sender role of a message.
///
/// Agents often leave the role out of their replies; a missing role reads
/// as [`Role::Agent`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the calling side.
    User,
    /// Message from the remote agent.
    #[default]
    Agent,
    /// A role this client does not understand.
    #[serde(other)]
    Unknown,
}

// ============================================================================
// Messages and parts
// ============================================================================

/// A typed content part of a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Part {
    /// A text content part. Discriminator: `"text"`.
    #[serde(rename = "text")]
    Text {
        /// The text content.
        text: String,
        /// Optional metadata associated with this part.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },
    /// A file part, carried through untouched. Discriminator: `"file"`.
    #[serde(rename = "file")]
    File {
        /// The file payload (bytes or URI object).
        file: serde_json::Value,
        /// Optional metadata associated with this part.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },
    /// A structured data part. Discriminator: `"data"`.
    #[serde(rename = "data")]
    Data {
        /// Arbitrary structured data.
        data: serde_json::Value,
        /// Optional metadata associated with this part.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },
    /// A part type this client does not understand.
    #[serde(other)]
    Unknown,
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            metadata: None,
        }
    }

    /// Returns the text if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// A message exchanged with an agent: a role and an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Who sent the message.
    #[serde(default)]
    pub role: Role,
    /// Ordered content parts.
    #[serde(default)]
    pub parts: Vec<Part>,
    /// Optional metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Message {
    /// A user message with a single text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
            metadata: None,
        }
    }

    /// The first text-typed part, if any.
    pub fn first_text(&self) -> Option<&str> {
        crate::utils::first_text_part(&self.parts)
    }
}

// ============================================================================
// Tasks
// ============================================================================

/// Status snapshot of a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    /// Current lifecycle state.
    #[serde(default)]
    pub state: TaskState,
    /// Latest agent message, replacing any previous one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// Timestamp as sent by the agent (not parsed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// The task object returned by `tasks/send`.
///
/// Only `status` is required; agents in the wild omit the rest freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task identifier echoed by the agent.
    #[serde(default)]
    pub id: String,
    /// Session the task belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Final (or current) status.
    pub status: TaskStatus,
    /// Optional metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Parameters shared by `tasks/send` and `tasks/sendSubscribe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSendParams {
    /// Fresh task identifier.
    pub id: String,
    /// Session identifier of the issuing client.
    pub session_id: String,
    /// The user message.
    pub message: Message,
    /// Output modes the caller accepts.
    pub accepted_output_modes: Vec<String>,
    /// Optional metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// The `result` member of one streamed envelope.
///
/// Status updates carry `status`; artifact updates carry other fields this
/// layer ignores. Either may carry `final`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateResult {
    /// Task identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// New status snapshot, when this is a status update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Final marker: no further events follow.
    #[serde(default, rename = "final")]
    pub r#final: bool,
}

/// One unit of the incoming update sequence of a subscribed task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskUpdateEvent {
    /// A keep-alive or otherwise payload-free event.
    KeepAlive,
    /// A status update: the latest message snapshot and the final marker.
    Status {
        /// The status message, if the update carried one.
        message: Option<Message>,
        /// Whether this is the last event for the task.
        r#final: bool,
    },
    /// An error envelope.
    Error(JsonRpcError),
}

impl TaskUpdateEvent {
    /// Decode one event-stream `data` payload.
    ///
    /// An empty payload is a keep-alive. A payload with an `error` member is
    /// an [`TaskUpdateEvent::Error`] regardless of any `result`. A payload
    /// with neither member decodes as a keep-alive.
    pub fn from_data(data: &str) -> Result<Self, serde_json::Error> {
        let data = data.trim();
        if data.is_empty() {
            return Ok(TaskUpdateEvent::KeepAlive);
        }

        let value: serde_json::Value = serde_json::from_str(data)?;

        if let Some(error) = value.get("error") {
            return Ok(TaskUpdateEvent::Error(JsonRpcError::from_value(error)));
        }

        match value.get("result") {
            Some(result) if !result.is_null() => {
                let update: TaskUpdateResult = serde_json::from_value(result.clone())?;
                Ok(TaskUpdateEvent::Status {
                    message: update.status.and_then(|s| s.message),
                    r#final: update.r#final,
                })
            }
            _ => Ok(TaskUpdateEvent::KeepAlive),
        }
    }

    /// Convenience constructor for a text status update.
    pub fn status_text(text: impl Into<String>, r#final: bool) -> Self {
        TaskUpdateEvent::Status {
            message: Some(Message {
                role: Role::Agent,
                parts: vec![Part::text(text)],
                metadata: None,
            }),
            r#final,
        }
    }
}

// ============================================================================
// Agent card
// ============================================================================

/// An agent's capability document from `/.well-known/agent.json`.
///
/// Kept as raw JSON: the dispatch layer only passes it through. The
/// accessors read the handful of fields worth showing a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentCard(pub serde_json::Value);

impl AgentCard {
    /// Agent display name.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(|v| v.as_str())
    }

    /// Agent description.
    pub fn description(&self) -> Option<&str> {
        self.0.get("description").and_then(|v| v.as_str())
    }

    /// Agent version string.
    pub fn version(&self) -> Option<&str> {
        self.0.get("version").and_then(|v| v.as_str())
    }

    /// Whether the card advertises `capabilities.streaming: true`.
    pub fn supports_streaming(&self) -> bool {
        self.0
            .pointer("/capabilities/streaming")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// The raw document.
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

// ============================================================================
// JSON-RPC Foundation
// ============================================================================

/// A JSON-RPC 2.0 request ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcId {
    /// String identifier.
    String(String),
    /// Numeric identifier.
    Number(i64),
    /// Null.
    Null,
}

impl fmt::Display for JsonRpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonRpcId::String(s) => write!(f, "{}", s),
            JsonRpcId::Number(n) => write!(f, "{}", n),
            JsonRpcId::Null => write!(f, "null"),
        }
    }
}

impl From<String> for JsonRpcId {
    fn from(s: String) -> Self {
        JsonRpcId::String(s)
    }
}

impl From<&str> for JsonRpcId {
    fn from(s: &str) -> Self {
        JsonRpcId::String(s.to_string())
    }
}

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonRpcRequest {
    /// Protocol version, always "2.0".
    pub jsonrpc: String,

    /// Request identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonRpcId>,

    /// Method name.
    pub method: String,

    /// Method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Create a request with the given id, method and params.
    pub fn new(
        id: impl Into<JsonRpcId>,
        method: impl Into<String>,
        params: Option<serde_json::Value>,
    ) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 response.
///
/// Exactly one of `result` or `error` should be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonRpcResponse {
    /// Protocol version, usually "2.0". Tolerated when absent.
    #[serde(default)]
    pub jsonrpc: String,

    /// Request identifier this response corresponds to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonRpcId>,

    /// Successful result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    /// Error result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create an error JSON-RPC response.
    pub fn error(id: Option<JsonRpcId>, error: JsonRpcError) -> Self {
        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,

    /// Human-readable error message.
    pub message: String,

    /// Optional structured error data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// Build an error object from whatever an agent put in `error`.
    ///
    /// Missing `code` becomes `-1`, missing `message` becomes
    /// `"unknown error"`, and a bare string is taken as the message.
    pub fn from_value(value: &serde_json::Value) -> Self {
        if let Some(message) = value.as_str() {
            return JsonRpcError {
                code: -1,
                message: message.to_string(),
                data: None,
            };
        }
        JsonRpcError {
            code: value.get("code").and_then(|c| c.as_i64()).unwrap_or(-1),
            message: value
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error")
                .to_string(),
            data: value.get("data").cloned(),
        }
    }
}
