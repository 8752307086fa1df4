//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use a2a_dispatch::client::{TaskEventStream, Transport};
use a2a_dispatch::error::{DispatchError, DispatchResult};
use a2a_dispatch::reasoner::Reasoner;
use a2a_dispatch::types::{JsonRpcRequest, JsonRpcResponse, TaskUpdateEvent};
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::{json, Value};

// ──────────────────────────────────────────────────
// Mock agent server
// ──────────────────────────────────────────────────

/// How the mock agent answers `tasks/sendSubscribe`.
#[derive(Debug, Clone)]
pub enum StreamMode {
    /// Reply with this raw `text/event-stream` body.
    Events(String),
    /// Send this body, then keep the connection open without sending more.
    Stall(String),
    /// Reply with 503.
    Unavailable,
}

/// Behaviour of a mock agent.
#[derive(Debug, Clone)]
pub struct MockAgent {
    /// Text returned by `tasks/send`.
    pub reply: String,
    /// Behaviour of `tasks/sendSubscribe`.
    pub stream: StreamMode,
    /// Served at `/.well-known/agent.json`.
    pub card: Value,
}

impl MockAgent {
    pub fn streaming(events: &[Value], reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            stream: StreamMode::Events(sse_body(events)),
            card: test_agent_card("Mock Agent", true),
        }
    }

    pub fn single_shot(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            stream: StreamMode::Unavailable,
            card: test_agent_card("Mock Agent", false),
        }
    }
}

/// Every JSON-RPC body the mock agent received.
#[derive(Debug, Clone, Default)]
pub struct Recorded(Arc<Mutex<Vec<Value>>>);

impl Recorded {
    fn push(&self, body: Value) {
        self.0.lock().unwrap().push(body);
    }

    pub fn requests(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

#[derive(Clone)]
struct AgentState {
    agent: MockAgent,
    recorded: Recorded,
}

async fn agent_rpc(State(state): State<AgentState>, Json(body): Json<Value>) -> Response {
    state.recorded.push(body.clone());
    let id = body["id"].clone();

    match body["method"].as_str() {
        Some("tasks/sendSubscribe") => match &state.agent.stream {
            StreamMode::Events(sse) => {
                ([(header::CONTENT_TYPE, "text/event-stream")], sse.clone()).into_response()
            }
            StreamMode::Stall(sse) => {
                let first = futures::stream::once(std::future::ready(Ok::<_, Infallible>(sse.clone())));
                let body = Body::from_stream(first.chain(futures::stream::pending()));
                ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
            }
            StreamMode::Unavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "streaming disabled").into_response()
            }
        },
        Some("tasks/send") => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "id": body["params"]["id"],
                "sessionId": body["params"]["sessionId"],
                "status": {
                    "state": "completed",
                    "message": {
                        "parts": [{"type": "text", "text": state.agent.reply}]
                    }
                }
            }
        }))
        .into_response(),
        _ => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32601, "message": "Method not found"}
        }))
        .into_response(),
    }
}

async fn agent_card(State(state): State<AgentState>) -> Json<Value> {
    Json(state.agent.card.clone())
}

/// Start a mock agent on a random port. Returns its base URL, the request
/// log and the server handle.
pub async fn start_mock_agent(agent: MockAgent) -> (String, Recorded, tokio::task::JoinHandle<()>) {
    let recorded = Recorded::default();
    let state = AgentState {
        agent,
        recorded: recorded.clone(),
    };
    let app = Router::new()
        .route("/", post(agent_rpc))
        .route("/.well-known/agent.json", get(agent_card))
        .with_state(state);

    let (base_url, handle) = serve(app).await;
    (base_url, recorded, handle)
}

/// Start a chat-completions server answering every prompt with `reply`
/// (`None` sends an empty `choices` array).
pub async fn start_mock_llm(reply: Option<&str>) -> (String, Recorded, tokio::task::JoinHandle<()>) {
    let recorded = Recorded::default();
    let reply = reply.map(str::to_string);
    let log = recorded.clone();

    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |headers: axum::http::HeaderMap, Json(body): Json<Value>| {
            let reply = reply.clone();
            let log = log.clone();
            async move {
                let auth = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                log.push(json!({"authorization": auth, "body": body}));
                let choices = match reply {
                    Some(text) => json!([{"index": 0, "message": {"role": "assistant", "content": text}}]),
                    None => json!([]),
                };
                Json(json!({"id": "chatcmpl-test", "choices": choices}))
            }
        }),
    );

    let (base_url, handle) = serve(app).await;
    (format!("{base_url}/v1"), recorded, handle)
}

async fn serve(app: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Brief wait for the server to start accepting connections.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    (base_url, handle)
}

/// An address nothing listens on.
pub async fn refused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// ──────────────────────────────────────────────────
// Event-stream fixtures
// ──────────────────────────────────────────────────

/// A status update envelope. Like most agents it leaves out the message role.
pub fn status_event(text: &str, r#final: bool) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": "task-1-send",
        "result": {
            "id": "task-1",
            "status": {
                "state": if r#final { "completed" } else { "working" },
                "message": {"parts": [{"type": "text", "text": text}]}
            },
            "final": r#final
        }
    })
}

/// An error envelope.
pub fn error_event(code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": "task-1-send",
        "error": {"code": code, "message": message}
    })
}

/// Encode envelopes as an event-stream body.
pub fn sse_body(events: &[Value]) -> String {
    events
        .iter()
        .map(|event| format!("data: {}\n\n", event))
        .collect()
}

pub fn test_agent_card(name: &str, streaming: bool) -> Value {
    json!({
        "name": name,
        "description": "An agent for testing",
        "url": "http://localhost",
        "version": "0.1.0",
        "capabilities": {"streaming": streaming},
        "skills": []
    })
}

// ──────────────────────────────────────────────────
// In-process doubles
// ──────────────────────────────────────────────────

/// A reasoner answering from a script, recording every prompt.
///
/// Replies are consumed in order; once the script runs out every prompt
/// gets `None`.
#[derive(Debug, Default)]
pub struct ScriptedReasoner {
    replies: Mutex<VecDeque<DispatchResult<Option<String>>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedReasoner {
    pub fn new<I>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = DispatchResult<Option<String>>>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Classify as `label`, then answer locally with `answer`.
    pub fn labels(label: &str, answer: &str) -> Arc<Self> {
        Self::new([Ok(Some(label.to_string())), Ok(Some(answer.to_string()))])
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn reply(&self, prompt: &str) -> DispatchResult<Option<String>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }
}

/// A transport that records requests and answers from fixtures.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub requests: Arc<Mutex<Vec<JsonRpcRequest>>>,
    pub response: Option<JsonRpcResponse>,
    pub events: Option<Vec<DispatchResult<TaskUpdateEvent>>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: &JsonRpcRequest) -> DispatchResult<JsonRpcResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.response
            .clone()
            .ok_or_else(|| DispatchError::Transport("connection refused".to_string()))
    }

    async fn send_stream(&self, request: &JsonRpcRequest) -> DispatchResult<TaskEventStream> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.events {
            Some(events) => Ok(TaskEventStream::from_events(events.clone())),
            None => Err(DispatchError::Http {
                status: 503,
                body: String::new(),
            }),
        }
    }
}
