//! Docgate Search — ACL-filtered query construction and execution.
//!
//! Builds the text, vector, and hybrid (rank fusion) aggregation pipelines
//! the managed store executes, with the ACL filter woven into each shape:
//! compound `must` clauses for full-text search and a match-style pre-filter
//! for vector search. Scoring, fuzzy matching, and rank fusion all run on
//! the store; this crate only constructs the queries and embeds the query
//! text.
//!
//! # Modules
//!
//! - [`filter`]: ACL filter and its two renderings
//! - [`text`]: `$search` pipeline construction
//! - [`vector`]: `$vectorSearch` pipeline construction
//! - [`fusion`]: `$rankFusion` hybrid pipelines
//! - [`embedding`]: embedding providers (mock and HTTP)
//! - [`client`]: high-level [`Searcher`] over a store and embedder

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod client;
pub mod embedding;
pub mod filter;
pub mod fusion;
pub mod text;
pub mod vector;

pub use client::{SearchHit, Searcher};
pub use embedding::{
    EmbeddingProvider, HttpEmbeddingProvider, MockEmbeddingProvider, create_embedding_provider,
};
pub use filter::AclFilter;
pub use fusion::RankFusionQuery;
pub use text::{FuzzyOptions, TextSearchQuery};
pub use vector::VectorSearchQuery;
