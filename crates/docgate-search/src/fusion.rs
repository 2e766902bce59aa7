//! Hybrid search via reciprocal-rank fusion.

use serde_json::{Value, json};

use crate::text::TextSearchQuery;
use crate::vector::VectorSearchQuery;

/// Hybrid query fusing a vector and a text sub-pipeline.
///
/// Renders to a `$rankFusion` stage whose named input pipelines are the
/// sub-queries' search stages, each capped at `input_limit` results. The
/// store owns the fusion arithmetic; both sub-queries should carry the same
/// ACL filter so the fused result set never widens access.
#[derive(Debug, Clone)]
pub struct RankFusionQuery {
    vector: VectorSearchQuery,
    text: TextSearchQuery,
    input_limit: usize,
    limit: usize,
}

impl RankFusionQuery {
    /// Combine a vector and a text query.
    pub fn new(vector: VectorSearchQuery, text: TextSearchQuery) -> Self {
        Self {
            vector,
            text,
            input_limit: 20,
            limit: 5,
        }
    }

    /// Per-pipeline result cap fed into fusion.
    pub fn with_input_limit(mut self, limit: usize) -> Self {
        self.input_limit = limit;
        self
    }

    /// Maximum number of fused results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Render the full aggregation pipeline.
    pub fn to_pipeline(&self) -> Vec<Value> {
        let vector_stage = self
            .vector
            .clone()
            .with_limit(self.input_limit)
            .search_stage();
        vec![
            json!({"$rankFusion": {
                "input": {
                    "pipelines": {
                        "vectorSearch": [vector_stage],
                        "textSearch": [
                            self.text.search_stage(),
                            {"$limit": self.input_limit}
                        ]
                    }
                }
            }}),
            json!({"$limit": self.limit}),
        ]
    }
}

// ============================================================================
// Tests
// ============================================================================
