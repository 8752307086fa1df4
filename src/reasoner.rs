//! The classification collaborator.
//!
//! The dispatcher needs one thing from a language model: given a prompt,
//! produce a textual reply. [`Reasoner`] is that seam;
//! [`ChatCompletionsReasoner`] implements it against any OpenAI-compatible
//! `/chat/completions` endpoint (Groq by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};

/// Default system prompt: routing policy for the SQL and RAG agents.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a dispatcher agent that decides which specialized agent should handle a user query.
For database queries about sales and customer data, SQL generation, or data analysis tasks, route to the SQL writer agent.
For information retrieval and document-based questions about Pinecone DB, route to the RAG agent.
If neither Pinecone DB nor sales and customer data is mentioned, do not route: answer the query yourself.
When you answer yourself, do not mention any other agent in your answer.";

/// Default OpenAI-compatible API base.
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Default model name.
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Something that can answer a prompt with text.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Generate a reply to `prompt`.
    ///
    /// `Ok(None)` means the model answered with no content.
    async fn reply(&self, prompt: &str) -> DispatchResult<Option<String>>;
}

/// Settings for [`ChatCompletionsReasoner`].
#[derive(Clone, PartialEq)]
pub struct ReasonerConfig {
    /// API base URL, e.g. `https://api.groq.com/openai/v1`.
    pub api_base: String,
    /// Bearer token.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// System message sent with every prompt.
    pub system_prompt: String,
    /// Total request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for ReasonerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasonerConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ReasonerConfig {
    /// Defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// [`Reasoner`] backed by an OpenAI-compatible chat-completions API.
#[derive(Debug, Clone)]
pub struct ChatCompletionsReasoner {
    client: reqwest::Client,
    config: ReasonerConfig,
}

impl ChatCompletionsReasoner {
    /// Create a reasoner with its own HTTP client.
    pub fn new(config: ReasonerConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a reasoner sharing an existing HTTP client.
    pub fn with_client(client: reqwest::Client, config: ReasonerConfig) -> Self {
        Self { client, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Reasoner for ChatCompletionsReasoner {
    async fn reply(&self, prompt: &str) -> DispatchResult<Option<String>> {
        let url = self.endpoint();
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        tracing::debug!(model = %self.config.model, prompt_len = prompt.len(), "sending prompt");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| DispatchError::from_reqwest("chat completion", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            DispatchError::InvalidJson(format!("failed to parse chat completion: {e}"))
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty()))
    }
}
