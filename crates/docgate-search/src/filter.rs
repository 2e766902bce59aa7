//! ACL filter shared by all query shapes.

use serde_json::{Value, json};

/// A conjunction of ACL label requirements.
///
/// Each clause requires one label value on one attribute; a document must
/// satisfy every clause. The same attribute may appear more than once, in
/// which case the document's (possibly multi-valued) field must carry all
/// of the required values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclFilter {
    clauses: Vec<(String, i64)>,
}

impl AclFilter {
    /// Create an empty filter (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `value` on `field`.
    pub fn require(mut self, field: impl Into<String>, value: i64) -> Self {
        self.clauses.push((field.into(), value));
        self
    }

    /// Whether any clauses are present.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Render as compound `must` clauses for a `$search` stage.
    pub fn to_must_clauses(&self) -> Vec<Value> {
        self.clauses
            .iter()
            .map(|(field, value)| json!({"in": {"value": value, "path": field}}))
            .collect()
    }

    /// Render as a match-style filter for a `$vectorSearch` stage.
    ///
    /// Returns `None` when the filter is empty; an empty `$and` is invalid.
    pub fn to_match_filter(&self) -> Option<Value> {
        if self.clauses.is_empty() {
            return None;
        }
        let clauses: Vec<Value> = self
            .clauses
            .iter()
            .map(|(field, value)| json!({field.as_str(): {"$in": [value]}}))
            .collect();
        Some(json!({"$and": clauses}))
    }
}

// ============================================================================
// Tests
// ============================================================================
