//! Typed index definitions rendered to the store's declarative JSON.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use docgate_core::{Error, Result};
use docgate_store::IndexKind;

/// Vector similarity metric supported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Similarity {
    /// Cosine similarity.
    #[default]
    #[serde(rename = "cosine")]
    Cosine,
    /// Euclidean distance.
    #[serde(rename = "euclidean")]
    Euclidean,
    /// Dot product.
    #[serde(rename = "dotProduct")]
    DotProduct,
}

impl FromStr for Similarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cosine" => Ok(Self::Cosine),
            "euclidean" => Ok(Self::Euclidean),
            "dotProduct" => Ok(Self::DotProduct),
            other => Err(Error::config(format!(
                "unknown similarity '{other}' (expected cosine, euclidean, or dotProduct)"
            ))),
        }
    }
}

/// Full-text search index with filterable number fields.
///
/// Mappings stay dynamic so text fields remain searchable; the listed
/// fields (the ACL attributes) are declared as numbers so they can be used
/// in compound `must` clauses.
#[derive(Debug, Clone)]
pub struct SearchIndexDefinition {
    name: String,
    dynamic: bool,
    number_fields: Vec<String>,
}

impl SearchIndexDefinition {
    /// Create a definition with dynamic mappings and no declared fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dynamic: true,
            number_fields: Vec::new(),
        }
    }

    /// Declare number-typed fields (filterable in compound queries).
    pub fn with_number_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.number_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Disable dynamic mappings.
    pub fn static_mappings(mut self) -> Self {
        self.dynamic = false;
        self
    }

    /// Index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind submitted to the store.
    pub fn kind(&self) -> IndexKind {
        IndexKind::Search
    }

    /// Render the declarative JSON definition.
    pub fn to_definition(&self) -> Value {
        let mut fields = serde_json::Map::new();
        for field in &self.number_fields {
            fields.insert(field.clone(), json!({"type": "number"}));
        }
        json!({
            "mappings": {
                "dynamic": self.dynamic,
                "fields": fields
            }
        })
    }
}

/// One vector field inside a vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorField {
    /// Document path holding the embedding.
    pub path: String,
    /// Embedding dimensionality.
    pub num_dimensions: usize,
    /// Similarity metric.
    pub similarity: Similarity,
}

impl VectorField {
    /// Create a vector field.
    pub fn new(path: impl Into<String>, num_dimensions: usize, similarity: Similarity) -> Self {
        Self {
            path: path.into(),
            num_dimensions,
            similarity,
        }
    }
}

/// Vector search index with filter-typed ACL fields.
#[derive(Debug, Clone)]
pub struct VectorIndexDefinition {
    name: String,
    vectors: Vec<VectorField>,
    filter_fields: Vec<String>,
}

impl VectorIndexDefinition {
    /// Create an empty vector index definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vectors: Vec::new(),
            filter_fields: Vec::new(),
        }
    }

    /// Add a vector field.
    pub fn with_vector(mut self, field: VectorField) -> Self {
        self.vectors.push(field);
        self
    }

    /// Declare filter-typed fields usable in `$vectorSearch` filters.
    pub fn with_filter_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind submitted to the store.
    pub fn kind(&self) -> IndexKind {
        IndexKind::VectorSearch
    }

    /// Validate the definition: at least one vector field, nonzero dims.
    pub fn validate(&self) -> Result<()> {
        if self.vectors.is_empty() {
            return Err(Error::config(format!(
                "vector index '{}' declares no vector fields",
                self.name
            )));
        }
        for vector in &self.vectors {
            if vector.num_dimensions == 0 {
                return Err(Error::config(format!(
                    "vector field '{}' has zero dimensions",
                    vector.path
                )));
            }
        }
        Ok(())
    }

    /// Render the declarative JSON definition.
    pub fn to_definition(&self) -> Value {
        let mut fields: Vec<Value> = self
            .vectors
            .iter()
            .map(|v| {
                json!({
                    "type": "vector",
                    "path": v.path,
                    "numDimensions": v.num_dimensions,
                    "similarity": v.similarity
                })
            })
            .collect();
        for filter in &self.filter_fields {
            fields.push(json!({"type": "filter", "path": filter}));
        }
        json!({"fields": fields})
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_serde() {
        assert_eq!(
            serde_json::to_string(&Similarity::DotProduct).unwrap(),
            "\"dotProduct\""
        );
        assert_eq!(
            serde_json::to_string(&Similarity::Cosine).unwrap(),
            "\"cosine\""
        );
    }

    #[test]
    fn test_similarity_from_str() {
        assert_eq!("cosine".parse::<Similarity>().unwrap(), Similarity::Cosine);
        assert_eq!(
            "euclidean".parse::<Similarity>().unwrap(),
            Similarity::Euclidean
        );
        assert!("manhattan".parse::<Similarity>().is_err());
    }

    #[test]
    fn test_search_index_definition_json() {
        let def = SearchIndexDefinition::new("search_acls")
            .with_number_fields(["ACL1", "ACL2", "ACL3"]);
        assert_eq!(def.name(), "search_acls");
        assert_eq!(def.kind(), IndexKind::Search);

        let json = def.to_definition();
        assert_eq!(json["mappings"]["dynamic"], true);
        assert_eq!(json["mappings"]["fields"]["ACL1"]["type"], "number");
        assert_eq!(json["mappings"]["fields"]["ACL3"]["type"], "number");
    }

    #[test]
    fn test_search_index_static_mappings() {
        let def = SearchIndexDefinition::new("s").static_mappings();
        assert_eq!(def.to_definition()["mappings"]["dynamic"], false);
    }

    #[test]
    fn test_vector_index_definition_json() {
        let def = VectorIndexDefinition::new("vector_acls")
            .with_vector(VectorField::new("embedding", 1536, Similarity::Cosine))
            .with_filter_fields(["ACL1", "ACL2", "ACL3"]);
        assert_eq!(def.kind(), IndexKind::VectorSearch);
        def.validate().unwrap();

        let json = def.to_definition();
        let fields = json["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0]["type"], "vector");
        assert_eq!(fields[0]["numDimensions"], 1536);
        assert_eq!(fields[0]["similarity"], "cosine");
        assert_eq!(fields[1]["type"], "filter");
        assert_eq!(fields[1]["path"], "ACL1");
    }

    #[test]
    fn test_vector_index_multiple_embeddings() {
        let def = VectorIndexDefinition::new("v")
            .with_vector(VectorField::new("embedding", 1536, Similarity::Cosine))
            .with_vector(VectorField::new("embedding_large", 2048, Similarity::Cosine));
        let fields = def.to_definition()["fields"].as_array().unwrap().clone();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1]["numDimensions"], 2048);
    }

    #[test]
    fn test_vector_index_validation() {
        assert!(VectorIndexDefinition::new("v").validate().is_err());
        let zero_dims = VectorIndexDefinition::new("v")
            .with_vector(VectorField::new("e", 0, Similarity::Cosine));
        assert!(zero_dims.validate().is_err());
    }
}
