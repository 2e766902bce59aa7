//! Common types shared by all store backends.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque unique identifier of a document in the target collection.
///
/// The store assigns identifiers; docgate never interprets their contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wrap a store-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A document read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Store-assigned identifier.
    pub id: DocumentId,
    /// All remaining document fields.
    pub fields: Map<String, Value>,
}

impl StoredDocument {
    /// Get a field as an integer, if present and integral.
    pub fn int_field(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(Value::as_i64)
    }
}

/// A single per-document update inside a bulk write.
///
/// Fields in `set` overwrite any existing value; nothing is merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldUpdate {
    /// Target document.
    pub id: DocumentId,
    /// Fields to set, replacing prior values.
    pub set: Map<String, Value>,
}

impl FieldUpdate {
    /// Create an update setting the given fields on one document.
    pub fn new(id: DocumentId, set: Map<String, Value>) -> Self {
        Self { id, set }
    }
}

/// Outcome of a bulk write request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BulkWriteReport {
    /// Documents the store matched by identifier.
    pub matched: u64,
    /// Documents actually modified.
    pub modified: u64,
    /// Updates the store rejected.
    pub failed: u64,
}

impl BulkWriteReport {
    /// Fold another batch's report into this one.
    pub fn absorb(&mut self, other: BulkWriteReport) {
        self.matched += other.matched;
        self.modified += other.modified;
        self.failed += other.failed;
    }
}

/// Kind of search index on the managed store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    /// Full-text search index.
    #[serde(rename = "search")]
    Search,
    /// Vector similarity search index.
    #[serde(rename = "vectorSearch")]
    VectorSearch,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search => f.write_str("search"),
            Self::VectorSearch => f.write_str("vectorSearch"),
        }
    }
}

/// Status of a search index as reported by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    /// Index name.
    pub name: String,
    /// Index kind.
    #[serde(rename = "type")]
    pub kind: IndexKind,
    /// Store-specific build status (e.g. "BUILDING", "READY").
    pub status: String,
    /// Whether the index can serve queries.
    pub queryable: bool,
}

// ============================================================================
// Tests
// ============================================================================
