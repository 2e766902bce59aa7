//! High-level search client tying queries to a store and embedder.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use docgate_acl::ACL_FIELDS;
use docgate_core::{DocgateConfig, IndexSettings, Result, SearchSettings};
use docgate_store::DocumentStore;

use crate::embedding::EmbeddingProvider;
use crate::filter::AclFilter;
use crate::fusion::RankFusionQuery;
use crate::text::{FuzzyOptions, TextSearchQuery};
use crate::vector::VectorSearchQuery;

/// One search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Store-assigned document identifier, when returned.
    pub id: Option<String>,
    /// Relevance score, when the pipeline projected one.
    pub score: Option<f64>,
    /// Remaining projected fields.
    pub fields: Map<String, Value>,
}

impl SearchHit {
    fn from_value(value: Value) -> Self {
        let mut fields = value.as_object().cloned().unwrap_or_default();
        let id = fields
            .remove("_id")
            .and_then(|v| v.as_str().map(str::to_string));
        let score = fields.remove("score").and_then(|v| v.as_f64());
        Self { id, score, fields }
    }

    /// Get a projected field as a string slice.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Runs ACL-filtered searches against a document store.
///
/// Query construction happens here; ranking, fuzzy matching, and rank
/// fusion are executed by the store.
pub struct Searcher {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: IndexSettings,
    settings: SearchSettings,
}

impl Searcher {
    /// Create a searcher over the given store and embedding provider.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &DocgateConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            index: config.index.clone(),
            settings: config.search.clone(),
        }
    }

    fn projected_fields(&self) -> Vec<String> {
        let mut fields = vec![self.index.text_field.clone()];
        fields.extend(ACL_FIELDS.iter().map(|f| f.to_string()));
        fields
    }

    fn text_query(&self, query: &str, filter: AclFilter, limit: usize) -> TextSearchQuery {
        TextSearchQuery::new(&self.index.search_index, &self.index.text_field, query)
            .with_filter(filter)
            .with_fuzzy(FuzzyOptions::from(&self.settings))
            .with_limit(limit)
    }

    fn vector_query(&self, embedding: Vec<f64>, filter: AclFilter, limit: usize) -> VectorSearchQuery {
        VectorSearchQuery::new(&self.index.vector_index, &self.index.embedding_path, embedding)
            .with_num_candidates(self.settings.num_candidates)
            .with_filter(filter)
            .with_limit(limit)
    }

    /// Full-text search with fuzzy matching.
    pub async fn text(
        &self,
        query: &str,
        filter: AclFilter,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>> {
        let limit = limit.unwrap_or(self.settings.default_limit);
        let pipeline = self
            .text_query(query, filter.clone(), limit)
            .with_projected_fields(self.projected_fields())
            .to_pipeline();

        let results = self.store.aggregate(&pipeline).await?;
        info!(hits = results.len(), clauses = filter.len(), "text search");
        Ok(results.into_iter().map(SearchHit::from_value).collect())
    }

    /// Vector similarity search; the query text is embedded first.
    pub async fn vector(
        &self,
        query: &str,
        filter: AclFilter,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>> {
        let limit = limit.unwrap_or(self.settings.default_limit);
        let embedding = self.embedder.embed(query).await?;
        let pipeline = self
            .vector_query(embedding, filter.clone(), limit)
            .with_projected_fields(self.projected_fields())
            .to_pipeline();

        let results = self.store.aggregate(&pipeline).await?;
        info!(hits = results.len(), clauses = filter.len(), "vector search");
        Ok(results.into_iter().map(SearchHit::from_value).collect())
    }

    /// Hybrid search: vector and text sub-queries fused by the store.
    ///
    /// Both sub-queries carry the same ACL filter.
    pub async fn hybrid(
        &self,
        query: &str,
        filter: AclFilter,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>> {
        let limit = limit.unwrap_or(self.settings.default_limit);
        let embedding = self.embedder.embed(query).await?;
        let input_limit = self.settings.fusion_input_limit;

        let pipeline = RankFusionQuery::new(
            self.vector_query(embedding, filter.clone(), input_limit),
            self.text_query(query, filter.clone(), input_limit),
        )
        .with_input_limit(input_limit)
        .with_limit(limit)
        .to_pipeline();

        let results = self.store.aggregate(&pipeline).await?;
        info!(hits = results.len(), clauses = filter.len(), "hybrid search");
        Ok(results.into_iter().map(SearchHit::from_value).collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
