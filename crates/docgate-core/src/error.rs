//! Error types for docgate.
//!
//! Every docgate crate shares this taxonomy. The variants map directly onto
//! the failure modes an operator can encounter:
//!
//! - [`Error::Connectivity`]: the managed store (or embedding endpoint)
//!   cannot be reached or refuses authentication. Fatal; callers abort.
//! - [`Error::ConfirmationDeclined`]: the operator did not confirm a
//!   mutating run. No documents were touched.
//! - [`Error::PartialWrite`]: a bulk write partially failed. Carries the
//!   succeeded/failed counts; already-written documents stay written and
//!   nothing is retried automatically.
//!
//! The remaining variants cover ambient concerns (config, parsing, I/O).

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for docgate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur across docgate crates.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Cannot reach or authenticate to the external store or a remote
    /// endpoint. Always fatal; the operation aborts immediately.
    #[error("connection failed: {message}")]
    Connectivity {
        /// Human-readable failure description.
        message: String,
    },

    /// The operator declined to confirm a mutating operation.
    /// Guaranteed: zero documents were modified.
    #[error("apply declined by operator; no documents were modified")]
    ConfirmationDeclined,

    /// A bulk write partially failed. Documents already updated remain
    /// updated; the operator must re-run or inspect state to resume.
    #[error("bulk write partially failed: {succeeded} succeeded, {failed} failed")]
    PartialWrite {
        /// Documents successfully updated before and around the failure.
        succeeded: u64,
        /// Documents whose update was rejected by the store.
        failed: u64,
    },

    /// Configuration problem (missing key, bad value, unusable path).
    #[error("configuration error: {0}")]
    Config(String),

    /// A store operation was rejected or returned an unusable response.
    #[error("store error: {0}")]
    Store(String),

    /// Embedding endpoint returned an error or a malformed vector.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Failed to parse data (JSON response, TOML document, ...).
    #[error("parse error: {0}")]
    Parse(String),

    /// Filesystem I/O failure with the offending path.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Underlying I/O error.
        source: std::io::Error,
        /// Path that was being read or written.
        path: PathBuf,
    },
}

impl Error {
    /// Create a [`Error::Connectivity`] from any displayable cause.
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
        }
    }

    /// Create a [`Error::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a [`Error::Store`].
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create a [`Error::Embedding`].
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a [`Error::Parse`].
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a [`Error::Io`] carrying the offending path.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::Io {
            source,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns `true` if the error is a connectivity failure.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }

    /// Returns `true` if the error guarantees no documents were modified.
    pub fn is_clean_abort(&self) -> bool {
        matches!(self, Self::ConfirmationDeclined)
    }
}

// ============================================================================
// Tests
// ============================================================================
