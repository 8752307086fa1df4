//! Routing labels: the closed set of targets a query can be sent to.

use std::fmt;

use crate::error::{DispatchError, DispatchResult};

/// A specialized remote agent the dispatcher knows how to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgentKind {
    /// SQL writer: sales and customer data, query generation, data analysis.
    Sql,
    /// Retrieval-augmented answers over product documentation.
    Rag,
}

impl AgentKind {
    /// Every agent kind, in label order.
    pub const ALL: [AgentKind; 2] = [AgentKind::Sql, AgentKind::Rag];

    /// The wire label the classifier answers with.
    pub fn label(self) -> &'static str {
        match self {
            AgentKind::Sql => "sql",
            AgentKind::Rag => "rag",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where one query goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingDecision {
    /// Send to a specialized agent.
    Agent(AgentKind),
    /// Answer directly, without any remote agent.
    Local,
}

/// The label the classifier uses for [`RoutingDecision::Local`].
pub const LOCAL_LABEL: &str = "nothing";

impl RoutingDecision {
    /// The wire label of this decision.
    pub fn label(self) -> &'static str {
        match self {
            RoutingDecision::Agent(kind) => kind.label(),
            RoutingDecision::Local => LOCAL_LABEL,
        }
    }

    /// Every label in the closed set, for prompts.
    pub fn labels() -> Vec<&'static str> {
        let mut labels: Vec<_> = AgentKind::ALL.iter().map(|k| k.label()).collect();
        labels.push(LOCAL_LABEL);
        labels
    }

    /// Parse classifier output strictly.
    ///
    /// Only the first whitespace-separated token counts. Surrounding quotes,
    /// backticks and punctuation are trimmed and case is ignored, so
    /// `"SQL."` and `'rag' agent` parse. `none` is accepted as an alias of
    /// `nothing`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownLabel`] for anything else, including
    /// hyphenated look-alikes such as `maybe-sql`.
    pub fn parse_strict(output: &str) -> DispatchResult<Self> {
        let token = output
            .split_whitespace()
            .next()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '_'))
            .unwrap_or_default()
            .to_ascii_lowercase();

        match token.as_str() {
            "sql" => Ok(RoutingDecision::Agent(AgentKind::Sql)),
            "rag" => Ok(RoutingDecision::Agent(AgentKind::Rag)),
            "nothing" | "none" => Ok(RoutingDecision::Local),
            _ => Err(DispatchError::UnknownLabel(output.trim().to_string())),
        }
    }

    /// Parse classifier output, mapping anything unrecognized to `Local`.
    pub fn parse(output: &str) -> Self {
        Self::parse_strict(output).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "normalizing classifier output to local");
            RoutingDecision::Local
        })
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
