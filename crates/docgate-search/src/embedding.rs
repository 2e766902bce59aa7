//! Embedding providers for vector and hybrid search.
//!
//! Embedding generation is delegated: the HTTP provider calls an external
//! embeddings API and passes the vector through unmodified, while the mock
//! provider produces deterministic vectors for tests and offline demos.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use docgate_core::{DocgateConfig, Error, Result};

/// Turns query text into an embedding vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text.
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;

    /// Dimensionality of returned vectors.
    fn dimensions(&self) -> usize;

    /// Provider name for diagnostics.
    fn name(&self) -> &str;
}

/// Create an embedding provider from configuration.
pub fn create_embedding_provider(config: &DocgateConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.embedding.provider.as_str() {
        "mock" => Ok(Arc::new(MockEmbeddingProvider::new(
            config.embedding.dimensions,
        ))),
        "http" => {
            let api_key = std::env::var(&config.embedding.api_key_env).ok();
            let provider = HttpEmbeddingProvider::new(
                &config.embedding.endpoint,
                &config.embedding.model,
                config.embedding.dimensions,
                api_key,
            )?;
            Ok(Arc::new(provider))
        }
        other => Err(Error::config(format!(
            "unknown embedding provider '{other}' (expected \"http\" or \"mock\")"
        ))),
    }
}

// ============================================================================
// Mock provider
// ============================================================================

/// Deterministic hash-based embedding provider.
///
/// The same text always embeds to the same unit vector, and different texts
/// almost always differ, which is all the query layers need under test.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    /// Create a provider emitting vectors of the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        if self.dimensions == 0 {
            return Err(Error::embedding("mock provider has zero dimensions"));
        }
        let mut vector = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            // Map the hash onto [-1, 1].
            let raw = hasher.finish() as f64 / u64::MAX as f64;
            vector.push(raw * 2.0 - 1.0);
        }
        let norm: f64 = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// HTTP provider
// ============================================================================

/// Client for an OpenAI-compatible embeddings endpoint.
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
    api_key: Option<String>,
}

impl HttpEmbeddingProvider {
    /// Create a client for the given endpoint and model.
    pub fn new(
        endpoint: &str,
        model: &str,
        dimensions: usize,
        api_key: Option<String>,
    ) -> Result<Self> {
        if endpoint.is_empty() {
            return Err(Error::config("embedding.endpoint is not set"));
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::connectivity(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            dimensions,
            api_key,
        })
    }

    fn parse_embedding(&self, body: &Value) -> Result<Vec<f64>> {
        let embedding = body
            .get("data")
            .and_then(Value::as_array)
            .and_then(|data| data.first())
            .and_then(|first| first.get("embedding"))
            .and_then(Value::as_array)
            .ok_or_else(|| Error::parse("embedding response missing data[0].embedding"))?;

        let vector: Vec<f64> = embedding.iter().filter_map(Value::as_f64).collect();
        if vector.len() != embedding.len() {
            return Err(Error::parse("embedding contains non-numeric entries"));
        }
        if vector.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "provider returned {} dimensions, expected {}",
                vector.len(),
                self.dimensions
            )));
        }
        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&json!({"input": text, "model": self.model}));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::connectivity(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "embedding request failed (HTTP {status}): {body}"
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| Error::parse(format!("invalid embedding response: {e}")))?;
        let vector = self.parse_embedding(&body)?;
        debug!(model = %self.model, dimensions = vector.len(), "embedded query text");
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "http"
    }
}

impl std::fmt::Debug for HttpEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbeddingProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("authenticated", &self.api_key.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_is_deterministic() {
        let provider = MockEmbeddingProvider::new(8);
        let a = provider.embed("crime syndicate").await.unwrap();
        let b = provider.embed("crime syndicate").await.unwrap();
        let c = provider.embed("quiet documentary").await.unwrap();

        assert_eq!(a.len(), 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_mock_vectors_are_normalized() {
        let provider = MockEmbeddingProvider::new(16);
        let vector = provider.embed("anything").await.unwrap();
        let norm: f64 = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_mock_zero_dimensions_errors() {
        let provider = MockEmbeddingProvider::new(0);
        assert!(provider.embed("x").await.is_err());
    }

    #[test]
    fn test_factory_mock() {
        let config = DocgateConfig::default();
        let provider = create_embedding_provider(&config).unwrap();
        assert_eq!(provider.name(), "mock");
        assert_eq!(provider.dimensions(), 1536);
    }

    #[test]
    fn test_factory_unknown_provider() {
        let mut config = DocgateConfig::default();
        config.embedding.provider = "telepathy".to_string();
        assert!(create_embedding_provider(&config).is_err());
    }

    #[test]
    fn test_http_provider_rejects_empty_endpoint() {
        assert!(HttpEmbeddingProvider::new("", "m", 4, None).is_err());
    }

    #[test]
    fn test_parse_embedding_shape() {
        let provider = HttpEmbeddingProvider::new("https://e.example.com", "m", 3, None).unwrap();
        let body = json!({"data": [{"embedding": [0.1, 0.2, 0.3]}]});
        assert_eq!(provider.parse_embedding(&body).unwrap(), vec![0.1, 0.2, 0.3]);

        assert!(provider.parse_embedding(&json!({})).is_err());
        assert!(provider
            .parse_embedding(&json!({"data": [{"embedding": [0.1]}]}))
            .is_err());
        assert!(provider
            .parse_embedding(&json!({"data": [{"embedding": [0.1, "x", 0.3]}]}))
            .is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let provider =
            HttpEmbeddingProvider::new("https://e.example.com", "m", 4, Some("secret".into()))
                .unwrap();
        let debug = format!("{provider:?}");
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_trait_object_safety() {
        fn _assert_object_safe(_: &dyn EmbeddingProvider) {}
    }
}
