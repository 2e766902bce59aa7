//! Docgate configuration.
//!
//! Configuration is a TOML file resolved from an explicit path, or from the
//! platform config directory (`<config_dir>/docgate/config.toml`). Every
//! field has a default so a missing file yields a usable configuration.
//!
//! Secrets never live in the file: the store URL can be overridden with the
//! `DOCGATE_STORE_URL` environment variable, and API keys are referenced by
//! the *name* of the environment variable that holds them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable that overrides `store.url` when set.
pub const STORE_URL_ENV: &str = "DOCGATE_STORE_URL";

/// Top-level docgate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocgateConfig {
    /// Document store connection settings.
    #[serde(default)]
    pub store: StoreSettings,

    /// ACL provisioning settings.
    #[serde(default)]
    pub acl: AclSettings,

    /// Search index names and vector field layout.
    #[serde(default)]
    pub index: IndexSettings,

    /// Search query defaults.
    #[serde(default)]
    pub search: SearchSettings,

    /// Embedding provider settings.
    #[serde(default)]
    pub embedding: EmbeddingSettings,
}

/// Document store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Backend type: "http" or "memory".
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Base URL of the managed store's data API.
    #[serde(default)]
    pub url: String,

    /// Database name on the store.
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection holding the documents to provision and search.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Name of the environment variable holding the store API key.
    #[serde(default = "default_store_key_env")]
    pub api_key_env: String,
}

/// ACL provisioning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclSettings {
    /// Smallest label value (inclusive).
    #[serde(default = "default_acl_min")]
    pub min: i64,

    /// Largest label value (inclusive).
    #[serde(default = "default_acl_max")]
    pub max: i64,

    /// Documents per bulk write.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Sample label sets shown in a dry run.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

/// Search index names and vector field layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Name of the full-text search index carrying ACL number fields.
    #[serde(default = "default_search_index")]
    pub search_index: String,

    /// Name of the vector search index carrying ACL filter fields.
    #[serde(default = "default_vector_index")]
    pub vector_index: String,

    /// Document field searched by full-text queries.
    #[serde(default = "default_text_field")]
    pub text_field: String,

    /// Document field holding the embedding vector.
    #[serde(default = "default_embedding_path")]
    pub embedding_path: String,

    /// Embedding dimensionality declared on the vector index.
    #[serde(default = "default_dimensions")]
    pub embedding_dimensions: usize,

    /// Similarity metric: "cosine", "euclidean", or "dotProduct".
    #[serde(default = "default_similarity")]
    pub similarity: String,
}

/// Search query defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Default result limit.
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Candidate pool size for vector search.
    #[serde(default = "default_num_candidates")]
    pub num_candidates: usize,

    /// Per-pipeline result limit inside rank fusion.
    #[serde(default = "default_fusion_input_limit")]
    pub fusion_input_limit: usize,

    /// Fuzzy matching: maximum edit distance.
    #[serde(default = "default_fuzzy_max_edits")]
    pub fuzzy_max_edits: u8,

    /// Fuzzy matching: exact-match prefix length.
    #[serde(default = "default_fuzzy_prefix_length")]
    pub fuzzy_prefix_length: u8,

    /// Fuzzy matching: maximum term expansions.
    #[serde(default = "default_fuzzy_max_expansions")]
    pub fuzzy_max_expansions: u16,
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider type: "mock" or "http".
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Endpoint for the HTTP provider.
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    /// Model name sent to the endpoint.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector dimensionality the provider returns.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Name of the environment variable holding the provider API key.
    #[serde(default = "default_embed_key_env")]
    pub api_key_env: String,
}

fn default_store_backend() -> String {
    "http".to_string()
}

fn default_database() -> String {
    "docgate".to_string()
}

fn default_collection() -> String {
    "documents".to_string()
}

fn default_store_key_env() -> String {
    "DOCGATE_STORE_API_KEY".to_string()
}

fn default_acl_min() -> i64 {
    1
}

fn default_acl_max() -> i64 {
    1000
}

fn default_batch_size() -> usize {
    1000
}

fn default_sample_size() -> usize {
    3
}

fn default_search_index() -> String {
    "search_acls".to_string()
}

fn default_vector_index() -> String {
    "vector_acls".to_string()
}

fn default_text_field() -> String {
    "content".to_string()
}

fn default_embedding_path() -> String {
    "embedding".to_string()
}

fn default_dimensions() -> usize {
    1536
}

fn default_similarity() -> String {
    "cosine".to_string()
}

fn default_limit() -> usize {
    5
}

fn default_num_candidates() -> usize {
    100
}

fn default_fusion_input_limit() -> usize {
    20
}

fn default_fuzzy_max_edits() -> u8 {
    2
}

fn default_fuzzy_prefix_length() -> u8 {
    3
}

fn default_fuzzy_max_expansions() -> u16 {
    50
}

fn default_embedding_provider() -> String {
    "mock".to_string()
}

fn default_embedding_endpoint() -> String {
    "https://api.openai.com/v1/embeddings".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_embed_key_env() -> String {
    "DOCGATE_EMBED_API_KEY".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            url: String::new(),
            database: default_database(),
            collection: default_collection(),
            api_key_env: default_store_key_env(),
        }
    }
}

impl Default for AclSettings {
    fn default() -> Self {
        Self {
            min: default_acl_min(),
            max: default_acl_max(),
            batch_size: default_batch_size(),
            sample_size: default_sample_size(),
        }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            search_index: default_search_index(),
            vector_index: default_vector_index(),
            text_field: default_text_field(),
            embedding_path: default_embedding_path(),
            embedding_dimensions: default_dimensions(),
            similarity: default_similarity(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            num_candidates: default_num_candidates(),
            fusion_input_limit: default_fusion_input_limit(),
            fuzzy_max_edits: default_fuzzy_max_edits(),
            fuzzy_prefix_length: default_fuzzy_prefix_length(),
            fuzzy_max_expansions: default_fuzzy_max_expansions(),
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            api_key_env: default_embed_key_env(),
        }
    }
}

impl DocgateConfig {
    /// Resolve the config file path.
    ///
    /// An explicit path wins; otherwise the platform config directory is
    /// used. Returns `None` only when the platform has no config directory.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        match explicit {
            Some(p) => Some(PathBuf::from(p)),
            None => dirs::config_dir().map(|d| d.join("docgate").join("config.toml")),
        }
    }

    /// Load configuration from the resolved path.
    ///
    /// A missing file yields the defaults. After loading, `DOCGATE_STORE_URL`
    /// overrides `store.url` when set.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
                toml::from_str(&content).map_err(|e| {
                    Error::config(format!("failed to parse {}: {e}", path.display()))
                })?
            }
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var(STORE_URL_ENV)
            && !url.is_empty()
        {
            config.store.url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.acl.min > self.acl.max {
            return Err(Error::config(format!(
                "acl.min ({}) must not exceed acl.max ({})",
                self.acl.min, self.acl.max
            )));
        }
        if self.acl.batch_size == 0 {
            return Err(Error::config("acl.batch_size must be at least 1"));
        }
        if self.index.embedding_dimensions == 0 {
            return Err(Error::config("index.embedding_dimensions must be at least 1"));
        }
        Ok(())
    }

    /// Serialize the configuration to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DocgateConfig::default();
        assert_eq!(config.store.backend, "http");
        assert_eq!(config.store.collection, "documents");
        assert_eq!(config.acl.min, 1);
        assert_eq!(config.acl.max, 1000);
        assert_eq!(config.acl.batch_size, 1000);
        assert_eq!(config.index.search_index, "search_acls");
        assert_eq!(config.index.vector_index, "vector_acls");
        assert_eq!(config.search.num_candidates, 100);
        assert_eq!(config.embedding.provider, "mock");
    }

    #[test]
    fn test_default_config_validates() {
        assert!(DocgateConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = DocgateConfig::default();
        config.acl.min = 10;
        config.acl.max = 5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("acl.min"));
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = DocgateConfig::default();
        config.acl.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = DocgateConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[acl]"));

        let parsed: DocgateConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.acl.max, config.acl.max);
        assert_eq!(parsed.index.search_index, config.index.search_index);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let config = DocgateConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.acl.batch_size, 1000);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[acl]\nmin = 1\nmax = 5\n").unwrap();

        let config = DocgateConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.acl.max, 5);
        assert_eq!(config.acl.batch_size, 1000);
        assert_eq!(config.store.collection, "documents");
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not [valid toml").unwrap();

        let result = DocgateConfig::load(Some(path.to_str().unwrap()));
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_explicit_path() {
        let path = DocgateConfig::resolve_config_path(Some("/x/y.toml")).unwrap();
        assert_eq!(path, PathBuf::from("/x/y.toml"));
    }
}
