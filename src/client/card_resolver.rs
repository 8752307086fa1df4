//! Agent card discovery.
//!
//! Fetches an agent's capability document from the well-known URI. The
//! document is advisory: the dispatch layer never needs it to route.

use std::time::Duration;

use reqwest::header::ACCEPT;

use crate::error::{DispatchError, DispatchResult};
use crate::types::AgentCard;
use crate::utils::AGENT_CARD_WELL_KNOWN_PATH;

/// Resolves [`AgentCard`]s from agent base URLs.
///
/// # Example
///
/// ```no_run
/// use a2a_dispatch::client::CardResolver;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = CardResolver::new();
/// let card = resolver.resolve("http://localhost:10002").await?;
/// println!("Agent: {:?}", card.name());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CardResolver {
    client: reqwest::Client,
    card_path: String,
    timeout: Duration,
}

impl CardResolver {
    /// Create a new resolver with default settings.
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a new resolver with an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            card_path: AGENT_CARD_WELL_KNOWN_PATH.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Override the agent card path (instead of `/.well-known/agent.json`).
    pub fn with_card_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.card_path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    /// Set the total request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The URL the card is fetched from for `base_url`.
    pub fn card_url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.card_path)
    }

    /// Fetch and parse the agent card from the given base URL.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Transport`] or [`DispatchError::Timeout`] on
    /// connection failures, [`DispatchError::Http`] on non-2xx responses, and
    /// [`DispatchError::InvalidJson`] when the body is not a JSON object.
    pub async fn resolve(&self, base_url: &str) -> DispatchResult<AgentCard> {
        let url = self.card_url(base_url);

        tracing::debug!("resolving agent card from {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DispatchError::from_reqwest(&format!("fetching agent card from {url}"), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            DispatchError::Transport(format!("failed to read agent card response: {e}"))
        })?;

        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| DispatchError::InvalidJson(format!("failed to parse agent card: {e}")))?;

        if !value.is_object() {
            return Err(DispatchError::InvalidJson(
                "agent card is not a JSON object".to_string(),
            ));
        }

        let card = AgentCard(value);
        tracing::debug!(
            "resolved agent card: {} v{}",
            card.name().unwrap_or("<unnamed>"),
            card.version().unwrap_or("?")
        );

        Ok(card)
    }
}

impl Default for CardResolver {
    fn default() -> Self {
        Self::new()
    }
}
