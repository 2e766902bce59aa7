//! Store collaborator traits and backend factory.
//!
//! The managed document store is consumed through these traits so that an
//! in-memory fake can stand in during tests. All methods are async: every
//! backend but [`MemoryStore`](crate::MemoryStore) does network I/O.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use docgate_core::{DocgateConfig, Error, Result};

use crate::http::HttpStore;
use crate::memory::MemoryStore;
use crate::types::{BulkWriteReport, DocumentId, FieldUpdate, IndexKind, IndexStatus, StoredDocument};

/// Read and bulk-write operations over a named collection.
///
/// Docgate relies on the store's own durability and isolation guarantees;
/// no additional consistency layer is added on top.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Verify connectivity and authentication.
    ///
    /// Fails with [`Error::Connectivity`] when the store is unreachable.
    async fn ping(&self) -> Result<()>;

    /// Count all documents in the collection.
    async fn count_documents(&self) -> Result<u64>;

    /// Count documents that carry the given field.
    async fn count_with_field(&self, field: &str) -> Result<u64>;

    /// Enumerate every document identifier in the collection.
    ///
    /// Collections are assumed bounded; identifiers fit in memory.
    async fn document_ids(&self) -> Result<Vec<DocumentId>>;

    /// Fetch up to `n` documents for inspection.
    async fn sample_documents(&self, n: usize) -> Result<Vec<StoredDocument>>;

    /// Apply per-document field updates in one round trip.
    ///
    /// Individual rejected updates are reported via
    /// [`BulkWriteReport::failed`], not as an `Err`.
    async fn bulk_set_fields(&self, updates: &[FieldUpdate]) -> Result<BulkWriteReport>;

    /// Run an aggregation pipeline and return the raw result documents.
    ///
    /// The pipeline is opaque to docgate; search ranking and rank fusion are
    /// executed by the store.
    async fn aggregate(&self, pipeline: &[Value]) -> Result<Vec<Value>>;

    /// Backend name for diagnostics.
    fn name(&self) -> &str;
}

/// Declarative search-index administration.
///
/// Index builds are asynchronous on the store; docgate's responsibility ends
/// at submitting the definition and optionally polling status.
#[async_trait]
pub trait IndexAdmin: Send + Sync {
    /// Submit a declarative index definition.
    ///
    /// Returns the index name acknowledged by the store. Fails with
    /// [`Error::Store`] if an index with the same name already exists.
    async fn create_search_index(
        &self,
        name: &str,
        kind: IndexKind,
        definition: &Value,
    ) -> Result<String>;

    /// List all search indexes on the collection with their build status.
    async fn list_search_indexes(&self) -> Result<Vec<IndexStatus>>;
}

/// Combined store capability: documents plus index administration.
///
/// Both backends implement both traits; this marker lets callers hold a
/// single trait object.
pub trait Store: DocumentStore + IndexAdmin {}

impl<T: DocumentStore + IndexAdmin> Store for T {}

/// Create a store backend from configuration.
///
/// Selection logic:
/// 1. `store.backend = "memory"` → [`MemoryStore`] (empty; for demos/tests)
/// 2. Otherwise → [`HttpStore`] using `store.url` and the API key from the
///    environment variable named by `store.api_key_env`.
pub fn create_store(config: &DocgateConfig) -> Result<Arc<dyn Store>> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "http" => {
            let api_key = std::env::var(&config.store.api_key_env).ok();
            let store = HttpStore::connect(
                &config.store.url,
                &config.store.database,
                &config.store.collection,
                api_key,
            )?;
            Ok(Arc::new(store))
        }
        other => Err(Error::config(format!(
            "unknown store backend '{other}' (expected \"http\" or \"memory\")"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================
