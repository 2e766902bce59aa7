//! Docgate Index — declarative search-index provisioning.
//!
//! Builds the JSON definitions the managed store expects for its full-text
//! and vector search indexes (number-typed and filter-typed ACL fields
//! included), submits them idempotently, and optionally polls until the
//! asynchronous builds become queryable. Docgate's responsibility ends
//! there; index build state is owned by the store.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod admin;
pub mod definition;

pub use admin::{EnsureOutcome, ensure_search_index, wait_until_queryable};
pub use definition::{SearchIndexDefinition, Similarity, VectorField, VectorIndexDefinition};
