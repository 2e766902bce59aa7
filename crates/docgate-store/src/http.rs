//! HTTP store backend.
//!
//! `HttpStore` talks to a managed document store's data API over REST.
//! Every operation is a single POST to a collection-scoped action endpoint
//! (`{base}/v1/{database}/{collection}:{action}`), authenticated with a
//! bearer token when one is configured.
//!
//! Error mapping: transport failures and authentication rejections become
//! [`Error::Connectivity`]; any other non-success response becomes
//! [`Error::Store`]; undecodable bodies become [`Error::Parse`].

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use docgate_core::{Error, Result};

use crate::store::{DocumentStore, IndexAdmin};
use crate::types::{BulkWriteReport, DocumentId, FieldUpdate, IndexKind, IndexStatus, StoredDocument};

/// REST client for a managed document store.
pub struct HttpStore {
    client: reqwest::Client,
    base: String,
    database: String,
    collection: String,
    api_key: Option<String>,
}

impl HttpStore {
    /// Create a client for the given data API base URL.
    ///
    /// No request is made here; use [`DocumentStore::ping`] to verify the
    /// connection.
    pub fn connect(
        url: &str,
        database: &str,
        collection: &str,
        api_key: Option<String>,
    ) -> Result<Self> {
        if url.is_empty() {
            return Err(Error::config(
                "store.url is not set (or set DOCGATE_STORE_URL)",
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::config(format!(
                "store.url must be an http(s) URL, got '{url}'"
            )));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::connectivity(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base: url.trim_end_matches('/').to_string(),
            database: database.to_string(),
            collection: collection.to_string(),
            api_key,
        })
    }

    fn action_url(&self, action: &str) -> String {
        format!(
            "{}/v1/{}/{}:{action}",
            self.base, self.database, self.collection
        )
    }

    async fn post(&self, action: &str, body: Value) -> Result<Value> {
        let mut request = self.client.post(self.action_url(action)).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::connectivity(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::connectivity(format!(
                "store rejected credentials (HTTP {status})"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::store(format!("{action} failed (HTTP {status}): {body}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::parse(format!("invalid {action} response: {e}")))
    }

    fn expect_u64(body: &Value, field: &str) -> Result<u64> {
        body.get(field)
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::parse(format!("response missing numeric '{field}'")))
    }
}

/// Split a raw store document into id and remaining fields.
fn parse_document(raw: &Value) -> Result<StoredDocument> {
    let obj = raw
        .as_object()
        .ok_or_else(|| Error::parse("document is not an object"))?;
    let id = obj
        .get("_id")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::parse("document missing string _id"))?;

    let mut fields = Map::new();
    for (key, value) in obj {
        if key != "_id" {
            fields.insert(key.clone(), value.clone());
        }
    }
    Ok(StoredDocument {
        id: DocumentId::new(id),
        fields,
    })
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn ping(&self) -> Result<()> {
        self.post("ping", json!({})).await.map(|_| ())
    }

    async fn count_documents(&self) -> Result<u64> {
        let body = self.post("count", json!({})).await?;
        Self::expect_u64(&body, "count")
    }

    async fn count_with_field(&self, field: &str) -> Result<u64> {
        let body = self
            .post("count", json!({"filter": {field: {"$exists": true}}}))
            .await?;
        Self::expect_u64(&body, "count")
    }

    async fn document_ids(&self) -> Result<Vec<DocumentId>> {
        let body = self.post("ids", json!({})).await?;
        let ids = body
            .get("ids")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::parse("response missing 'ids' array"))?;
        ids.iter()
            .map(|v| {
                v.as_str()
                    .map(DocumentId::new)
                    .ok_or_else(|| Error::parse("non-string document id"))
            })
            .collect()
    }

    async fn sample_documents(&self, n: usize) -> Result<Vec<StoredDocument>> {
        let body = self.post("sample", json!({"size": n})).await?;
        let docs = body
            .get("documents")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::parse("response missing 'documents' array"))?;
        docs.iter().map(parse_document).collect()
    }

    async fn bulk_set_fields(&self, updates: &[FieldUpdate]) -> Result<BulkWriteReport> {
        let body = self
            .post("bulkUpdate", json!({"updates": updates}))
            .await?;
        serde_json::from_value(body)
            .map_err(|e| Error::parse(format!("invalid bulk write report: {e}")))
    }

    async fn aggregate(&self, pipeline: &[Value]) -> Result<Vec<Value>> {
        let body = self
            .post("aggregate", json!({"pipeline": pipeline}))
            .await?;
        body.get("documents")
            .and_then(Value::as_array)
            .map(|a| a.to_vec())
            .ok_or_else(|| Error::parse("response missing 'documents' array"))
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[async_trait]
impl IndexAdmin for HttpStore {
    async fn create_search_index(
        &self,
        name: &str,
        kind: IndexKind,
        definition: &Value,
    ) -> Result<String> {
        let body = self
            .post(
                "createSearchIndex",
                json!({"name": name, "type": kind, "definition": definition}),
            )
            .await?;
        body.get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::parse("response missing index 'name'"))
    }

    async fn list_search_indexes(&self) -> Result<Vec<IndexStatus>> {
        let body = self.post("listSearchIndexes", json!({})).await?;
        let indexes = body
            .get("indexes")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::parse("response missing 'indexes' array"))?;
        indexes
            .iter()
            .map(|raw| {
                serde_json::from_value(raw.clone())
                    .map_err(|e| Error::parse(format!("invalid index status: {e}")))
            })
            .collect()
    }
}

impl std::fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStore")
            .field("base", &self.base)
            .field("database", &self.database)
            .field("collection", &self.collection)
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

    fn store() -> HttpStore {
        HttpStore::connect("https://store.example.com/", "mflix", "movies", None).unwrap()
    }

    #[test]
    fn test_connect_rejects_empty_url() {
        let err = HttpStore::connect("", "db", "coll", None).unwrap_err();
        assert!(err.to_string().contains("store.url"));
    }

    #[test]
    fn test_connect_rejects_non_http_url() {
        let err = HttpStore::connect("ftp://x", "db", "coll", None).unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn test_action_url_format() {
        let store = store();
        assert_eq!(
            store.action_url("bulkUpdate"),
            "https://store.example.com/v1/mflix/movies:bulkUpdate"
        );
    }

    #[test]
    fn test_parse_document_splits_id() {
        let raw = json!({"_id": "abc", "title": "T", "ACL1": 9});
        let doc = parse_document(&raw).unwrap();
        assert_eq!(doc.id.as_str(), "abc");
        assert_eq!(doc.int_field("ACL1"), Some(9));
        assert!(!doc.fields.contains_key("_id"));
    }

    #[test]
    fn test_parse_document_requires_id() {
        assert!(parse_document(&json!({"title": "T"})).is_err());
        assert!(parse_document(&json!("not an object")).is_err());
    }

    #[test]
    fn test_bulk_report_deserializes() {
        let body = json!({"matched": 10, "modified": 9, "failed": 1});
        let report: BulkWriteReport = serde_json::from_value(body).unwrap();
        assert_eq!(report.matched, 10);
        assert_eq!(report.modified, 9);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_expect_u64() {
        assert_eq!(HttpStore::expect_u64(&json!({"count": 3}), "count").unwrap(), 3);
        assert!(HttpStore::expect_u64(&json!({"count": "3"}), "count").is_err());
        assert!(HttpStore::expect_u64(&json!({}), "count").is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let store =
            HttpStore::connect("https://x.example.com", "db", "coll", Some("secret".into()))
                .unwrap();
        let debug = format!("{store:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("authenticated: true"));
    }
}
