//! Utility functions for working with message parts.

use crate::types::Part;

/// Returns the first text-typed part, skipping file, data and unknown parts.
///
/// # Example
///
/// ```
/// use a2a_dispatch::types::Part;
/// use a2a_dispatch::utils::first_text_part;
///
/// let parts = vec![
///     Part::Data { data: serde_json::json!({"rows": 3}), metadata: None },
///     Part::text("SELECT 1"),
///     Part::text("ignored"),
/// ];
/// assert_eq!(first_text_part(&parts), Some("SELECT 1"));
/// ```
pub fn first_text_part(parts: &[Part]) -> Option<&str> {
    parts.iter().find_map(Part::as_text)
}
