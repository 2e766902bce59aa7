//! Docgate Core — shared error types and configuration.
//!
//! This crate provides the foundational types used across all docgate crates.
//! It has no internal docgate dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`config`]: TOML configuration with env-var overrides

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;

// Re-export key types at crate root for convenience
pub use config::{
    AclSettings, DocgateConfig, EmbeddingSettings, IndexSettings, SearchSettings, StoreSettings,
};
pub use error::{Error, Result};
