//! In-memory store backend.
//!
//! `MemoryStore` implements both [`DocumentStore`] and [`IndexAdmin`] over a
//! `BTreeMap`, making it a drop-in fake for tests and local demos. Fault
//! injection covers the store's failure modes: bulk writes can fail on a
//! schedule to exercise partial-write handling, pings can fail to exercise
//! connectivity aborts, and index builds can require a number of status
//! polls before becoming queryable.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use docgate_core::Result;

use crate::pipeline;
use crate::store::{DocumentStore, IndexAdmin};
use crate::types::{BulkWriteReport, DocumentId, FieldUpdate, IndexKind, IndexStatus, StoredDocument};

struct IndexEntry {
    name: String,
    kind: IndexKind,
    polls_remaining: u32,
}

/// In-memory document store and index registry.
pub struct MemoryStore {
    docs: RwLock<BTreeMap<DocumentId, Map<String, Value>>>,
    indexes: RwLock<Vec<IndexEntry>>,
    index_build_polls: u32,
    fail_every: Option<usize>,
    unreachable: bool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
            indexes: RwLock::new(Vec::new()),
            index_build_polls: 0,
            fail_every: None,
            unreachable: false,
        }
    }

    /// Make [`DocumentStore::ping`] fail with a connectivity error.
    ///
    /// Used to exercise the abort-before-anything path.
    pub fn with_ping_failure(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Reject every `n`-th update in bulk writes (1-based).
    ///
    /// Used to exercise partial-write reporting.
    pub fn with_write_failure_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    /// Require `n` status polls before a submitted index becomes queryable.
    pub fn with_index_build_polls(mut self, n: u32) -> Self {
        self.index_build_polls = n;
        self
    }

    /// Insert a document with a generated identifier; returns the id.
    pub fn insert_document(&self, fields: Map<String, Value>) -> DocumentId {
        let id = DocumentId::new(uuid::Uuid::new_v4().to_string());
        self.docs.write().insert(id.clone(), fields);
        id
    }

    /// Insert a document under an explicit identifier.
    pub fn insert_with_id(&self, id: DocumentId, fields: Map<String, Value>) {
        self.docs.write().insert(id, fields);
    }

    /// Snapshot a single document, if present.
    pub fn get_document(&self, id: &DocumentId) -> Option<StoredDocument> {
        self.docs.read().get(id).map(|fields| StoredDocument {
            id: id.clone(),
            fields: fields.clone(),
        })
    }

    /// Snapshot the whole collection (test helper).
    pub fn snapshot(&self) -> Vec<StoredDocument> {
        self.docs
            .read()
            .iter()
            .map(|(id, fields)| StoredDocument {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        if self.unreachable {
            return Err(docgate_core::Error::connectivity("memory store unreachable"));
        }
        Ok(())
    }

    async fn count_documents(&self) -> Result<u64> {
        Ok(self.docs.read().len() as u64)
    }

    async fn count_with_field(&self, field: &str) -> Result<u64> {
        Ok(self
            .docs
            .read()
            .values()
            .filter(|fields| fields.contains_key(field))
            .count() as u64)
    }

    async fn document_ids(&self) -> Result<Vec<DocumentId>> {
        Ok(self.docs.read().keys().cloned().collect())
    }

    async fn sample_documents(&self, n: usize) -> Result<Vec<StoredDocument>> {
        Ok(self
            .docs
            .read()
            .iter()
            .take(n)
            .map(|(id, fields)| StoredDocument {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect())
    }

    async fn bulk_set_fields(&self, updates: &[FieldUpdate]) -> Result<BulkWriteReport> {
        let mut docs = self.docs.write();
        let mut report = BulkWriteReport::default();

        for (i, update) in updates.iter().enumerate() {
            if self.fail_every.is_some_and(|n| n > 0 && (i + 1) % n == 0) {
                report.failed += 1;
                continue;
            }
            match docs.get_mut(&update.id) {
                Some(fields) => {
                    report.matched += 1;
                    for (key, value) in &update.set {
                        fields.insert(key.clone(), value.clone());
                    }
                    report.modified += 1;
                }
                None => report.failed += 1,
            }
        }

        tracing::debug!(
            matched = report.matched,
            modified = report.modified,
            failed = report.failed,
            "memory bulk write"
        );
        Ok(report)
    }

    async fn aggregate(&self, stages: &[Value]) -> Result<Vec<Value>> {
        let snapshot = self.docs.read().clone();
        pipeline::run(&snapshot, stages)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[async_trait]
impl IndexAdmin for MemoryStore {
    async fn create_search_index(
        &self,
        name: &str,
        kind: IndexKind,
        _definition: &Value,
    ) -> Result<String> {
        let mut indexes = self.indexes.write();
        if indexes.iter().any(|e| e.name == name) {
            return Err(docgate_core::Error::store(format!(
                "index '{name}' already exists"
            )));
        }
        indexes.push(IndexEntry {
            name: name.to_string(),
            kind,
            polls_remaining: self.index_build_polls,
        });
        Ok(name.to_string())
    }

    async fn list_search_indexes(&self) -> Result<Vec<IndexStatus>> {
        let mut indexes = self.indexes.write();
        let statuses = indexes
            .iter_mut()
            .map(|entry| {
                let ready = entry.polls_remaining == 0;
                if !ready {
                    entry.polls_remaining -= 1;
                }
                IndexStatus {
                    name: entry.name.clone(),
                    kind: entry.kind,
                    status: if ready { "READY" } else { "BUILDING" }.to_string(),
                    queryable: ready,
                }
            })
            .collect();
        Ok(statuses)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("documents", &self.docs.read().len())
            .field("indexes", &self.indexes.read().len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_count() {
        let store = MemoryStore::new();
        assert_eq!(store.count_documents().await.unwrap(), 0);

        store.insert_document(fields(json!({"title": "one"})));
        store.insert_document(fields(json!({"title": "two"})));
        assert_eq!(store.count_documents().await.unwrap(), 2);
        assert_eq!(store.document_ids().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_count_with_field() {
        let store = MemoryStore::new();
        store.insert_document(fields(json!({"ACL1": 3})));
        store.insert_document(fields(json!({"title": "no acl"})));

        assert_eq!(store.count_with_field("ACL1").await.unwrap(), 1);
        assert_eq!(store.count_with_field("ACL9").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bulk_set_overwrites() {
        let store = MemoryStore::new();
        let id = store.insert_document(fields(json!({"ACL1": 1, "title": "t"})));

        let update = FieldUpdate::new(id.clone(), fields(json!({"ACL1": 42, "ACL2": 7})));
        let report = store.bulk_set_fields(&[update]).await.unwrap();
        assert_eq!(report.matched, 1);
        assert_eq!(report.modified, 1);
        assert_eq!(report.failed, 0);

        let doc = store.get_document(&id).unwrap();
        assert_eq!(doc.int_field("ACL1"), Some(42));
        assert_eq!(doc.int_field("ACL2"), Some(7));
        // Untouched fields survive.
        assert_eq!(doc.fields.get("title"), Some(&json!("t")));
    }

    #[tokio::test]
    async fn test_bulk_set_unknown_id_counts_failed() {
        let store = MemoryStore::new();
        let update = FieldUpdate::new(DocumentId::new("ghost"), fields(json!({"ACL1": 1})));
        let report = store.bulk_set_fields(&[update]).await.unwrap();
        assert_eq!(report.matched, 0);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_scheduled_write_failures() {
        let store = MemoryStore::new().with_write_failure_every(2);
        let ids: Vec<DocumentId> = (0..4)
            .map(|i| store.insert_document(fields(json!({"n": i}))))
            .collect();

        let updates: Vec<FieldUpdate> = ids
            .iter()
            .map(|id| FieldUpdate::new(id.clone(), fields(json!({"ACL1": 1}))))
            .collect();
        let report = store.bulk_set_fields(&updates).await.unwrap();
        assert_eq!(report.modified, 2);
        assert_eq!(report.failed, 2);
    }

    #[tokio::test]
    async fn test_ping_failure_injection() {
        let store = MemoryStore::new();
        store.ping().await.unwrap();

        let unreachable = MemoryStore::new().with_ping_failure();
        let err = unreachable.ping().await.unwrap_err();
        assert!(err.is_connectivity());
    }

    #[tokio::test]
    async fn test_sample_documents() {
        let store = MemoryStore::new();
        for i in 0..10 {
            store.insert_document(fields(json!({"n": i})));
        }
        let sample = store.sample_documents(3).await.unwrap();
        assert_eq!(sample.len(), 3);
    }

    #[tokio::test]
    async fn test_index_lifecycle_immediate() {
        let store = MemoryStore::new();
        let name = store
            .create_search_index("search_acls", IndexKind::Search, &json!({}))
            .await
            .unwrap();
        assert_eq!(name, "search_acls");

        let statuses = store.list_search_indexes().await.unwrap();
        assert_eq!(statuses.len(), 1);
        assert!(statuses[0].queryable);
        assert_eq!(statuses[0].status, "READY");
    }

    #[tokio::test]
    async fn test_index_duplicate_rejected() {
        let store = MemoryStore::new();
        store
            .create_search_index("idx", IndexKind::Search, &json!({}))
            .await
            .unwrap();
        let err = store
            .create_search_index("idx", IndexKind::VectorSearch, &json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_index_builds_over_polls() {
        let store = MemoryStore::new().with_index_build_polls(2);
        store
            .create_search_index("idx", IndexKind::VectorSearch, &json!({}))
            .await
            .unwrap();

        let first = store.list_search_indexes().await.unwrap();
        assert!(!first[0].queryable);
        assert_eq!(first[0].status, "BUILDING");

        let second = store.list_search_indexes().await.unwrap();
        assert!(!second[0].queryable);

        let third = store.list_search_indexes().await.unwrap();
        assert!(third[0].queryable);
    }

    #[tokio::test]
    async fn test_aggregate_delegates_to_interpreter() {
        let store = MemoryStore::new();
        store.insert_document(fields(
            json!({"content": "crime story", "ACL1": 5, "embedding": [1.0, 0.0]}),
        ));

        let pipeline = vec![json!({"$search": {
            "index": "i",
            "text": {"query": "crime", "path": "content"}
        }})];
        let results = store.aggregate(&pipeline).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_debug_format() {
        let store = MemoryStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("MemoryStore"));
    }
}
