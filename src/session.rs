//! Session identity: one stable id per client instance, fresh task ids per call.

use uuid::Uuid;

/// A client's session.
///
/// The session id is generated once and never changes for the lifetime of
/// the value. Cloning a `Session` shares the id; constructing a new one
/// never reuses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
}

impl Session {
    /// Create a session with a random UUID v4 id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
        }
    }

    /// The session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Mint a fresh task id: `task-` followed by 16 lowercase hex digits.
    ///
    /// The two halves of a v4 UUID are folded together, so the fixed version
    /// and variant bits of one half are masked by random bits of the other.
    pub fn next_task_id(&self) -> String {
        let (high, low) = Uuid::new_v4().as_u64_pair();
        format!("task-{:016x}", high ^ low)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
