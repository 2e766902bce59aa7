//! Full-text search pipeline construction.

use serde_json::{Value, json};

use docgate_core::SearchSettings;

use crate::filter::AclFilter;

/// Fuzzy matching options for the text operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyOptions {
    /// Maximum edit distance per term.
    pub max_edits: u8,
    /// Number of leading characters that must match exactly.
    pub prefix_length: u8,
    /// Maximum number of term variants generated.
    pub max_expansions: u16,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            max_edits: 2,
            prefix_length: 3,
            max_expansions: 50,
        }
    }
}

impl From<&SearchSettings> for FuzzyOptions {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            max_edits: settings.fuzzy_max_edits,
            prefix_length: settings.fuzzy_prefix_length,
            max_expansions: settings.fuzzy_max_expansions,
        }
    }
}

/// ACL-filtered full-text search over one document field.
///
/// Renders to a `$search` stage: with a filter, a compound query whose
/// `must` clauses carry the ACL requirements and whose `should` clause
/// carries the scored text operator; without one, a bare text operator.
#[derive(Debug, Clone)]
pub struct TextSearchQuery {
    index: String,
    path: String,
    query: String,
    filter: AclFilter,
    fuzzy: Option<FuzzyOptions>,
    limit: usize,
    project: Vec<String>,
}

impl TextSearchQuery {
    /// Create a query against the named index and field.
    pub fn new(index: impl Into<String>, path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            path: path.into(),
            query: query.into(),
            filter: AclFilter::new(),
            fuzzy: None,
            limit: 5,
            project: Vec::new(),
        }
    }

    /// Restrict results to documents satisfying the ACL filter.
    pub fn with_filter(mut self, filter: AclFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Enable fuzzy term matching.
    pub fn with_fuzzy(mut self, fuzzy: FuzzyOptions) -> Self {
        self.fuzzy = Some(fuzzy);
        self
    }

    /// Maximum number of results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Project only the named fields (plus `_id` and the search score).
    pub fn with_projected_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.project = fields.into_iter().map(Into::into).collect();
        self
    }

    fn text_operator(&self) -> Value {
        let mut text = json!({
            "query": self.query,
            "path": self.path
        });
        if let Some(fuzzy) = &self.fuzzy {
            text["fuzzy"] = json!({
                "maxEdits": fuzzy.max_edits,
                "prefixLength": fuzzy.prefix_length,
                "maxExpansions": fuzzy.max_expansions
            });
        }
        json!({"text": text})
    }

    /// Render the `$search` stage alone (used inside rank fusion).
    pub fn search_stage(&self) -> Value {
        let spec = if self.filter.is_empty() {
            let mut spec = json!({"index": self.index});
            spec["text"] = self.text_operator()["text"].clone();
            spec
        } else {
            json!({
                "index": self.index,
                "compound": {
                    "must": self.filter.to_must_clauses(),
                    "should": [self.text_operator()]
                }
            })
        };
        json!({"$search": spec})
    }

    /// Render the full aggregation pipeline.
    pub fn to_pipeline(&self) -> Vec<Value> {
        let mut pipeline = vec![self.search_stage()];
        if let Some(projection) = projection(&self.project, "searchScore") {
            pipeline.push(projection);
        }
        pipeline.push(json!({"$limit": self.limit}));
        pipeline
    }
}

/// Build a `$project` stage keeping `fields` plus a score meta column.
pub(crate) fn projection(fields: &[String], score_meta: &str) -> Option<Value> {
    if fields.is_empty() {
        return None;
    }
    let mut spec = serde_json::Map::new();
    for field in fields {
        spec.insert(field.clone(), Value::from(1));
    }
    spec.insert("score".to_string(), json!({"$meta": score_meta}));
    Some(json!({"$project": spec}))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_text_pipeline() {
        let pipeline = TextSearchQuery::new("search_acls", "content", "crime syndicate")
            .with_limit(3)
            .to_pipeline();

        assert_eq!(pipeline.len(), 2);
        assert_eq!(
            pipeline[0],
            json!({"$search": {
                "index": "search_acls",
                "text": {"query": "crime syndicate", "path": "content"}
            }})
        );
        assert_eq!(pipeline[1], json!({"$limit": 3}));
    }

    #[test]
    fn test_filtered_fuzzy_pipeline() {
        let filter = AclFilter::new().require("ACL1", 17).require("ACL2", 83);
        let pipeline = TextSearchQuery::new("search_acls", "content", "power struggle")
            .with_filter(filter)
            .with_fuzzy(FuzzyOptions::default())
            .with_projected_fields(["content", "ACL1", "ACL2", "ACL3"])
            .to_pipeline();

        assert_eq!(pipeline.len(), 3);
        assert_eq!(
            pipeline[0],
            json!({"$search": {
                "index": "search_acls",
                "compound": {
                    "must": [
                        {"in": {"value": 17, "path": "ACL1"}},
                        {"in": {"value": 83, "path": "ACL2"}}
                    ],
                    "should": [
                        {"text": {
                            "query": "power struggle",
                            "path": "content",
                            "fuzzy": {
                                "maxEdits": 2,
                                "prefixLength": 3,
                                "maxExpansions": 50
                            }
                        }}
                    ]
                }
            }})
        );
        assert_eq!(
            pipeline[1],
            json!({"$project": {
                "content": 1,
                "ACL1": 1,
                "ACL2": 1,
                "ACL3": 1,
                "score": {"$meta": "searchScore"}
            }})
        );
        assert_eq!(pipeline[2], json!({"$limit": 5}));
    }

    #[test]
    fn test_fuzzy_from_settings() {
        let mut settings = SearchSettings::default();
        settings.fuzzy_max_edits = 1;
        let fuzzy = FuzzyOptions::from(&settings);
        assert_eq!(fuzzy.max_edits, 1);
        assert_eq!(fuzzy.prefix_length, 3);
        assert_eq!(fuzzy.max_expansions, 50);
    }
}
