//! Crude aggregation-pipeline interpreter for the in-memory store.
//!
//! Supports only the pipeline shapes docgate itself constructs: a leading
//! `$search`, `$vectorSearch`, or `$rankFusion` stage followed by `$limit`
//! and `$project`. Scoring here is deliberately naive (token overlap,
//! brute-force cosine, reciprocal-rank fusion with k=60); the managed store
//! owns real ranking. This exists so the provisioning and query layers can
//! be exercised end to end without a live service.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use docgate_core::{Error, Result};

use crate::types::DocumentId;

/// Reciprocal-rank-fusion constant.
const RRF_K: f64 = 60.0;

type Docs = BTreeMap<DocumentId, Map<String, Value>>;

struct Scored {
    id: DocumentId,
    fields: Map<String, Value>,
    score: f64,
}

/// Run a supported pipeline against a snapshot of the collection.
pub(crate) fn run(docs: &Docs, pipeline: &[Value]) -> Result<Vec<Value>> {
    let (first, rest) = pipeline
        .split_first()
        .ok_or_else(|| Error::store("empty aggregation pipeline"))?;

    let first = first
        .as_object()
        .ok_or_else(|| Error::store("pipeline stage must be an object"))?;

    let mut scored = if let Some(spec) = first.get("$search") {
        run_search(docs, spec)?
    } else if let Some(spec) = first.get("$vectorSearch") {
        run_vector(docs, spec)?
    } else if let Some(spec) = first.get("$rankFusion") {
        run_fusion(docs, spec)?
    } else {
        let stage = first.keys().next().cloned().unwrap_or_default();
        return Err(Error::store(format!(
            "memory store does not support leading stage '{stage}'"
        )));
    };

    let mut projection: Option<Map<String, Value>> = None;
    for stage in rest {
        let stage = stage
            .as_object()
            .ok_or_else(|| Error::store("pipeline stage must be an object"))?;
        if let Some(limit) = stage.get("$limit") {
            let n = limit
                .as_u64()
                .ok_or_else(|| Error::store("$limit must be a positive integer"))?;
            scored.truncate(n as usize);
        } else if let Some(proj) = stage.get("$project") {
            projection = Some(
                proj.as_object()
                    .ok_or_else(|| Error::store("$project must be an object"))?
                    .clone(),
            );
        } else {
            let name = stage.keys().next().cloned().unwrap_or_default();
            return Err(Error::store(format!(
                "memory store does not support stage '{name}'"
            )));
        }
    }

    Ok(scored.into_iter().map(|s| render(s, projection.as_ref())).collect())
}

fn render(doc: Scored, projection: Option<&Map<String, Value>>) -> Value {
    let mut out = Map::new();
    match projection {
        Some(proj) => {
            let keep_id = proj.get("_id").and_then(Value::as_i64) != Some(0);
            if keep_id {
                out.insert("_id".to_string(), Value::from(doc.id.as_str()));
            }
            for (key, spec) in proj {
                if key == "_id" {
                    continue;
                }
                if spec.as_object().is_some_and(|o| o.contains_key("$meta")) {
                    out.insert(key.clone(), Value::from(doc.score));
                } else if spec.as_i64() == Some(1) || spec.as_bool() == Some(true) {
                    if let Some(value) = doc.fields.get(key) {
                        out.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        None => {
            out.insert("_id".to_string(), Value::from(doc.id.as_str()));
            for (key, value) in &doc.fields {
                out.insert(key.clone(), value.clone());
            }
            out.insert("score".to_string(), Value::from(doc.score));
        }
    }
    Value::Object(out)
}

// ============================================================================
// $search
// ============================================================================

fn run_search(docs: &Docs, spec: &Value) -> Result<Vec<Scored>> {
    // Either a bare text operator or a compound of ACL musts + text shoulds.
    let (musts, texts) = if let Some(compound) = spec.get("compound") {
        let musts = clause_array(compound.get("must"));
        let texts = clause_array(compound.get("should"));
        (musts, texts)
    } else if spec.get("text").is_some() {
        (Vec::new(), vec![spec.clone()])
    } else {
        return Err(Error::store("unsupported $search operator"));
    };

    let mut scored = Vec::new();
    for (id, fields) in docs {
        if !musts.iter().all(|clause| must_matches(fields, clause)) {
            continue;
        }
        let mut score = if texts.is_empty() { 1.0 } else { 0.0 };
        for clause in &texts {
            if let Some(text) = clause.get("text") {
                score += text_score(fields, text);
            }
        }
        scored.push(Scored {
            id: id.clone(),
            fields: fields.clone(),
            score,
        });
    }

    sort_by_score(&mut scored);
    Ok(scored)
}

fn clause_array(value: Option<&Value>) -> Vec<Value> {
    value
        .and_then(Value::as_array)
        .map(|a| a.to_vec())
        .unwrap_or_default()
}

/// Evaluate a compound `must` clause: `in` or `equals` over a document path.
fn must_matches(fields: &Map<String, Value>, clause: &Value) -> bool {
    let spec = match clause.get("in").or_else(|| clause.get("equals")) {
        Some(s) => s,
        None => return false,
    };
    let (path, value) = match (spec.get("path").and_then(Value::as_str), spec.get("value")) {
        (Some(p), Some(v)) => (p, v),
        _ => return false,
    };
    field_contains(fields.get(path), value)
}

/// Scalar equality, or membership when the document field is an array.
fn field_contains(field: Option<&Value>, value: &Value) -> bool {
    match field {
        Some(Value::Array(items)) => items.contains(value),
        Some(other) => other == value,
        None => false,
    }
}

/// Count distinct query tokens present in the document's text field.
fn text_score(fields: &Map<String, Value>, text_spec: &Value) -> f64 {
    let query = text_spec.get("query").and_then(Value::as_str).unwrap_or("");
    let path = text_spec.get("path").and_then(Value::as_str).unwrap_or("");
    let haystack = match fields.get(path).and_then(Value::as_str) {
        Some(s) => s.to_lowercase(),
        None => return 0.0,
    };

    let mut tokens: Vec<String> = query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_string)
        .collect();
    tokens.sort();
    tokens.dedup();

    tokens.iter().filter(|t| haystack.contains(t.as_str())).count() as f64
}

// ============================================================================
// $vectorSearch
// ============================================================================

fn run_vector(docs: &Docs, spec: &Value) -> Result<Vec<Scored>> {
    let path = spec
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::store("$vectorSearch requires a path"))?;
    let query = spec
        .get("queryVector")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::store("$vectorSearch requires a queryVector"))?;
    let query: Vec<f64> = query.iter().filter_map(Value::as_f64).collect();
    let limit = spec.get("limit").and_then(Value::as_u64).unwrap_or(10) as usize;
    let filter = spec.get("filter");

    let mut scored = Vec::new();
    for (id, fields) in docs {
        if let Some(filter) = filter
            && !match_filter(fields, filter)
        {
            continue;
        }
        let embedding: Vec<f64> = match fields.get(path).and_then(Value::as_array) {
            Some(values) => values.iter().filter_map(Value::as_f64).collect(),
            None => continue,
        };
        if embedding.len() != query.len() {
            continue;
        }
        scored.push(Scored {
            id: id.clone(),
            fields: fields.clone(),
            score: cosine(&query, &embedding),
        });
    }

    sort_by_score(&mut scored);
    scored.truncate(limit);
    Ok(scored)
}

/// Evaluate a match-style filter: `{"$and": [...]}` or a single
/// `{field: {"$in": [...]}}` clause.
fn match_filter(fields: &Map<String, Value>, filter: &Value) -> bool {
    if let Some(clauses) = filter.get("$and").and_then(Value::as_array) {
        return clauses.iter().all(|c| match_filter(fields, c));
    }
    let obj = match filter.as_object() {
        Some(o) => o,
        None => return false,
    };
    obj.iter().all(|(field, cond)| {
        match cond.get("$in").and_then(Value::as_array) {
            Some(allowed) => allowed.iter().any(|v| field_contains(fields.get(field), v)),
            // Bare value means equality.
            None => field_contains(fields.get(field), cond),
        }
    })
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// ============================================================================
// $rankFusion
// ============================================================================

fn run_fusion(docs: &Docs, spec: &Value) -> Result<Vec<Scored>> {
    let pipelines = spec
        .get("input")
        .and_then(|i| i.get("pipelines"))
        .and_then(Value::as_object)
        .ok_or_else(|| Error::store("$rankFusion requires input.pipelines"))?;

    let mut fused: BTreeMap<DocumentId, f64> = BTreeMap::new();
    for sub in pipelines.values() {
        let stages = sub
            .as_array()
            .ok_or_else(|| Error::store("rank fusion sub-pipeline must be an array"))?;
        let results = run(docs, stages)?;
        for (rank, result) in results.iter().enumerate() {
            let id = result
                .get("_id")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::store("sub-pipeline result missing _id"))?;
            *fused.entry(DocumentId::new(id)).or_insert(0.0) +=
                1.0 / (RRF_K + rank as f64 + 1.0);
        }
    }

    let mut scored: Vec<Scored> = fused
        .into_iter()
        .filter_map(|(id, score)| {
            docs.get(&id).map(|fields| Scored {
                id,
                fields: fields.clone(),
                score,
            })
        })
        .collect();

    sort_by_score(&mut scored);
    Ok(scored)
}

fn sort_by_score(scored: &mut [Scored]) {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}

// ============================================================================
// Tests
// ============================================================================
