//! Well-known paths, method names and defaults of the task protocol.

/// The well-known path of an agent's capability document.
pub const AGENT_CARD_WELL_KNOWN_PATH: &str = "/.well-known/agent.json";

/// The path JSON-RPC requests are posted to, relative to the agent base URL.
pub const DEFAULT_RPC_PATH: &str = "/";

/// Single-shot task method.
pub const METHOD_TASKS_SEND: &str = "tasks/send";

/// Streaming task method.
pub const METHOD_TASKS_SEND_SUBSCRIBE: &str = "tasks/sendSubscribe";

/// Output modes advertised on every task request.
pub const ACCEPTED_OUTPUT_MODES: &[&str] = &["text"];

/// MIME type requested for streaming responses.
pub const EVENT_STREAM_MIME: &str = "text/event-stream";
