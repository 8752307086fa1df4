//! Environment-driven configuration.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `SQL_AGENT_URL` | SQL agent base URL | unset: not registered |
//! | `RAG_AGENT_URL` | RAG agent base URL | unset: not registered |
//! | `LLM_API_KEY` / `GROQ_API_KEY` | reasoner API key | required |
//! | `LLM_API_BASE` | chat-completions base URL | Groq |
//! | `LLM_MODEL` | model name | [`DEFAULT_MODEL`](crate::reasoner::DEFAULT_MODEL) |
//! | `A2A_CONNECT_TIMEOUT_SECS` | connect timeout | 10 |
//! | `A2A_REQUEST_TIMEOUT_SECS` | single-shot timeout | 60 |
//! | `A2A_STREAM_OPEN_TIMEOUT_SECS` | stream establishment | 30 |
//! | `A2A_STREAM_IDLE_TIMEOUT_SECS` | gap between stream chunks, `0` disables | 120 |
//! | `A2A_STREAM_END_POLICY` | `implicit-complete` or `terminated` | `implicit-complete` |

use std::collections::BTreeMap;
use std::time::Duration;

use crate::client::TransportConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::reasoner::ReasonerConfig;
use crate::reducer::StreamEndPolicy;
use crate::routing::AgentKind;

/// Everything needed to assemble a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherConfig {
    /// Base URL per agent. Agents without a URL are not registered.
    pub agents: BTreeMap<AgentKind, String>,
    /// Reasoner endpoint and model.
    pub reasoner: ReasonerConfig,
    /// Timeouts and headers for every agent client.
    pub transport: TransportConfig,
    /// Interpretation of a stream that ends without a final marker.
    pub stream_end_policy: StreamEndPolicy,
}

impl DispatcherConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> DispatchResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Config`] when no API key is present or a value
    /// cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> DispatchResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut agents = BTreeMap::new();
        for kind in AgentKind::ALL {
            if let Some(url) = get(agent_url_var(kind)) {
                agents.insert(kind, url);
            }
        }

        let api_key = get("LLM_API_KEY")
            .or_else(|| get("GROQ_API_KEY"))
            .ok_or_else(|| DispatchError::Config("LLM_API_KEY (or GROQ_API_KEY) is not set".to_string()))?;
        let mut reasoner = ReasonerConfig::new(api_key);
        if let Some(base) = get("LLM_API_BASE") {
            reasoner.api_base = base;
        }
        if let Some(model) = get("LLM_MODEL") {
            reasoner.model = model;
        }

        let mut transport = TransportConfig::default();
        if let Some(secs) = parse_secs(&get, "A2A_CONNECT_TIMEOUT_SECS")? {
            transport.connect_timeout = secs;
        }
        if let Some(secs) = parse_secs(&get, "A2A_REQUEST_TIMEOUT_SECS")? {
            transport.request_timeout = secs;
        }
        if let Some(secs) = parse_secs(&get, "A2A_STREAM_OPEN_TIMEOUT_SECS")? {
            transport.stream_open_timeout = secs;
        }
        if let Some(secs) = parse_secs(&get, "A2A_STREAM_IDLE_TIMEOUT_SECS")? {
            transport.stream_idle_timeout = (!secs.is_zero()).then_some(secs);
        }

        let stream_end_policy = match get("A2A_STREAM_END_POLICY") {
            Some(value) => value.parse()?,
            None => StreamEndPolicy::default(),
        };

        Ok(Self {
            agents,
            reasoner,
            transport,
            stream_end_policy,
        })
    }
}

/// Environment variable holding the base URL of `kind`.
pub fn agent_url_var(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::Sql => "SQL_AGENT_URL",
        AgentKind::Rag => "RAG_AGENT_URL",
    }
}

fn parse_secs<G>(get: &G, key: &str) -> DispatchResult<Option<Duration>>
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| DispatchError::Config(format!("{key} must be a whole number of seconds, got {raw:?}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_with_only_a_key() {
        let config = DispatcherConfig::from_lookup(lookup(&[("GROQ_API_KEY", "gsk_test")])).unwrap();
        assert!(config.agents.is_empty());
        assert_eq!(config.reasoner.api_key, "gsk_test");
        assert_eq!(config.reasoner.api_base, crate::reasoner::DEFAULT_API_BASE);
        assert_eq!(config.transport, TransportConfig::default());
        assert_eq!(config.stream_end_policy, StreamEndPolicy::ImplicitComplete);
    }

    #[test]
    fn reads_agents_and_overrides() {
        let config = DispatcherConfig::from_lookup(lookup(&[
            ("LLM_API_KEY", "primary"),
            ("GROQ_API_KEY", "secondary"),
            ("SQL_AGENT_URL", "http://localhost:10002"),
            ("RAG_AGENT_URL", " "),
            ("LLM_MODEL", "tiny"),
            ("A2A_REQUEST_TIMEOUT_SECS", "5"),
            ("A2A_STREAM_IDLE_TIMEOUT_SECS", "0"),
            ("A2A_STREAM_END_POLICY", "terminated"),
        ]))
        .unwrap();

        assert_eq!(config.reasoner.api_key, "primary");
        assert_eq!(config.reasoner.model, "tiny");
        assert_eq!(config.agents.len(), 1);
        assert_eq!(config.agents[&AgentKind::Sql], "http://localhost:10002");
        assert_eq!(config.transport.request_timeout, Duration::from_secs(5));
        assert_eq!(config.transport.stream_idle_timeout, None);
        assert_eq!(config.stream_end_policy, StreamEndPolicy::Terminated);
    }

    #[test]
    fn missing_key_is_config_error() {
        let err = DispatcherConfig::from_lookup(lookup(&[("SQL_AGENT_URL", "http://x")])).unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for (key, value) in [
            ("A2A_CONNECT_TIMEOUT_SECS", "soon"),
            ("A2A_STREAM_END_POLICY", "whenever"),
        ] {
            let err = DispatcherConfig::from_lookup(lookup(&[("LLM_API_KEY", "k"), (key, value)])).unwrap_err();
            assert!(matches!(err, DispatchError::Config(_)), "{key}: {err:?}");
        }
    }
}
