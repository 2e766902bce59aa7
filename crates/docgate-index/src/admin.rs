//! Idempotent index submission and build polling.

use std::time::Duration;

use serde_json::Value;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use docgate_core::Result;
use docgate_store::{IndexAdmin, IndexKind};

/// Result of [`ensure_search_index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The index was submitted; build runs asynchronously on the store.
    Created {
        /// Name acknowledged by the store.
        name: String,
    },
    /// An index with the same name and kind already exists; nothing done.
    AlreadyExists {
        /// Existing index name.
        name: String,
    },
}

impl EnsureOutcome {
    /// Index name regardless of outcome.
    pub fn name(&self) -> &str {
        match self {
            Self::Created { name } | Self::AlreadyExists { name } => name,
        }
    }
}

/// Submit an index definition unless one with the same name and kind exists.
///
/// The existence check and the create are two separate store calls, so a
/// concurrent creator can still win the race; in that case the store's
/// duplicate-name rejection surfaces as an error.
pub async fn ensure_search_index(
    admin: &dyn IndexAdmin,
    name: &str,
    kind: IndexKind,
    definition: &Value,
) -> Result<EnsureOutcome> {
    let existing = admin.list_search_indexes().await?;
    if let Some(found) = existing.iter().find(|ix| ix.name == name && ix.kind == kind) {
        info!(index = %name, status = %found.status, "index already exists, skipping");
        return Ok(EnsureOutcome::AlreadyExists {
            name: found.name.clone(),
        });
    }

    let acknowledged = admin.create_search_index(name, kind, definition).await?;
    info!(index = %acknowledged, %kind, "index submitted");
    Ok(EnsureOutcome::Created { name: acknowledged })
}

/// Poll until every named index reports queryable, or the timeout elapses.
///
/// Returns `Ok(true)` once all indexes are queryable, `Ok(false)` on timeout.
/// A timeout is not an error: builds continue on the store and callers may
/// check again later.
pub async fn wait_until_queryable(
    admin: &dyn IndexAdmin,
    names: &[&str],
    timeout: Duration,
    poll_interval: Duration,
) -> Result<bool> {
    let deadline = Instant::now() + timeout;
    loop {
        let statuses = admin.list_search_indexes().await?;
        let pending: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| {
                !statuses
                    .iter()
                    .any(|ix| ix.name == *name && ix.queryable)
            })
            .collect();
        if pending.is_empty() {
            info!(indexes = ?names, "all indexes queryable");
            return Ok(true);
        }
        if Instant::now() >= deadline {
            warn!(pending = ?pending, "indexes not queryable before timeout");
            return Ok(false);
        }
        debug!(pending = ?pending, "indexes still building");
        sleep(poll_interval.min(deadline - Instant::now())).await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::definition::{SearchIndexDefinition, Similarity, VectorField, VectorIndexDefinition};
    use docgate_store::MemoryStore;

    #[tokio::test]
    async fn test_ensure_creates_missing_index() {
        let store = MemoryStore::new();
        let def = SearchIndexDefinition::new("search_acls")
            .with_number_fields(["ACL1", "ACL2", "ACL3"]);

        let outcome = ensure_search_index(&store, def.name(), def.kind(), &def.to_definition())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            EnsureOutcome::Created {
                name: "search_acls".to_string()
            }
        );

        let listed = store.list_search_indexes().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "search_acls");
        assert_eq!(listed[0].kind, IndexKind::Search);
    }

    #[tokio::test]
    async fn test_ensure_skips_existing_index() {
        let store = MemoryStore::new();
        let def = VectorIndexDefinition::new("vector_acls")
            .with_vector(VectorField::new("embedding", 1536, Similarity::Cosine))
            .with_filter_fields(["ACL1", "ACL2", "ACL3"]);
        let rendered = def.to_definition();

        let first = ensure_search_index(&store, def.name(), def.kind(), &rendered)
            .await
            .unwrap();
        assert_eq!(first.name(), "vector_acls");

        let second = ensure_search_index(&store, def.name(), def.kind(), &rendered)
            .await
            .unwrap();
        assert_eq!(
            second,
            EnsureOutcome::AlreadyExists {
                name: "vector_acls".to_string()
            }
        );
        assert_eq!(store.list_search_indexes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_same_name_different_kind_errors() {
        let store = MemoryStore::new();
        store
            .create_search_index("acls", IndexKind::Search, &json!({"mappings": {}}))
            .await
            .unwrap();

        // Same name but vectorSearch kind: not treated as existing, and the
        // store rejects the duplicate name.
        let result =
            ensure_search_index(&store, "acls", IndexKind::VectorSearch, &json!({"fields": []}))
                .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_wait_until_queryable_immediate() {
        let store = MemoryStore::new();
        store
            .create_search_index("s", IndexKind::Search, &json!({"mappings": {}}))
            .await
            .unwrap();

        let ready = wait_until_queryable(
            &store,
            &["s"],
            Duration::from_secs(1),
            Duration::from_millis(1),
        )
        .await
        .unwrap();
        assert!(ready);
    }

    #[tokio::test]
    async fn test_wait_until_queryable_after_build_polls() {
        // Index reports BUILDING for the first two list calls, then READY.
        let store = MemoryStore::new().with_index_build_polls(2);
        store
            .create_search_index("s", IndexKind::Search, &json!({"mappings": {}}))
            .await
            .unwrap();

        let ready = wait_until_queryable(
            &store,
            &["s"],
            Duration::from_secs(5),
            Duration::from_millis(1),
        )
        .await
        .unwrap();
        assert!(ready);
    }

    #[tokio::test]
    async fn test_wait_until_queryable_times_out() {
        let store = MemoryStore::new().with_index_build_polls(1_000);
        store
            .create_search_index("s", IndexKind::Search, &json!({"mappings": {}}))
            .await
            .unwrap();

        let ready = wait_until_queryable(
            &store,
            &["s"],
            Duration::from_millis(20),
            Duration::from_millis(5),
        )
        .await
        .unwrap();
        assert!(!ready);
    }

    #[tokio::test]
    async fn test_wait_for_missing_index_times_out() {
        let store = MemoryStore::new();
        let ready = wait_until_queryable(
            &store,
            &["nonexistent"],
            Duration::from_millis(10),
            Duration::from_millis(2),
        )
        .await
        .unwrap();
        assert!(!ready);
    }
}
