//! Docgate Store — collaborator traits and backends for the managed
//! document store.
//!
//! The external store is modeled as two injected capabilities rather than
//! ambient global access:
//!
//! - [`DocumentStore`]: read-all, sampling, and bulk field updates over a
//!   named collection, plus opaque aggregation pass-through.
//! - [`IndexAdmin`]: declarative search-index submission and listing.
//!
//! # Backends
//!
//! - [`HttpStore`]: reqwest client for a REST-style managed store.
//! - [`MemoryStore`]: in-memory fake for tests and local demos. It
//!   interprets a crude subset of the aggregation pipeline; real scoring and
//!   rank fusion belong to the managed service.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod http;
pub mod memory;
mod pipeline;
pub mod store;
pub mod types;

pub use http::HttpStore;
pub use memory::MemoryStore;
pub use store::{DocumentStore, IndexAdmin, Store, create_store};
pub use types::{BulkWriteReport, DocumentId, FieldUpdate, IndexKind, IndexStatus, StoredDocument};
