//! Vector similarity search pipeline construction.

use serde_json::{Value, json};

use crate::filter::AclFilter;
use crate::text::projection;

/// ACL-filtered vector similarity search.
///
/// Renders to a `$vectorSearch` stage; the ACL filter becomes a match-style
/// pre-filter evaluated before candidate selection, so excluded documents
/// never consume candidate slots.
#[derive(Debug, Clone)]
pub struct VectorSearchQuery {
    index: String,
    path: String,
    query_vector: Vec<f64>,
    num_candidates: usize,
    limit: usize,
    filter: AclFilter,
    project: Vec<String>,
}

impl VectorSearchQuery {
    /// Create a query against the named index and embedding field.
    pub fn new(index: impl Into<String>, path: impl Into<String>, query_vector: Vec<f64>) -> Self {
        Self {
            index: index.into(),
            path: path.into(),
            query_vector,
            num_candidates: 100,
            limit: 5,
            filter: AclFilter::new(),
            project: Vec::new(),
        }
    }

    /// Restrict results to documents satisfying the ACL filter.
    pub fn with_filter(mut self, filter: AclFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Candidate pool size examined before ranking.
    pub fn with_num_candidates(mut self, n: usize) -> Self {
        self.num_candidates = n;
        self
    }

    /// Maximum number of results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Project only the named fields (plus `_id` and the similarity score).
    pub fn with_projected_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.project = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Render the `$vectorSearch` stage alone (used inside rank fusion).
    pub fn search_stage(&self) -> Value {
        let mut spec = json!({
            "index": self.index,
            "path": self.path,
            "queryVector": self.query_vector,
            "numCandidates": self.num_candidates,
            "limit": self.limit
        });
        if let Some(filter) = self.filter.to_match_filter() {
            spec["filter"] = filter;
        }
        json!({"$vectorSearch": spec})
    }

    /// Render the full aggregation pipeline.
    pub fn to_pipeline(&self) -> Vec<Value> {
        let mut pipeline = vec![self.search_stage()];
        if let Some(projection) = projection(&self.project, "vectorSearchScore") {
            pipeline.push(projection);
        }
        pipeline
    }
}

// ============================================================================
// Tests
// ============================================================================
