use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Aggregation name to aggregation result
pub type Aggregations = Map<String, Value>;

/// Suggester name to suggestion entries
pub type Suggests = Map<String, Value>;

/// Per-call request options for a backend search (`routing`, `preference`, ...)
pub type SearchOptions = Map<String, Value>;

/// A single ranked hit returned by a search backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Document identifier
    pub id: String,
    /// Index the document lives in (if reported)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    /// Relevance score
    #[serde(default)]
    pub score: f64,
    /// Source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

impl Hit {
    pub fn new(id: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            index: None,
            score,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Value) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }
}

/// One backend response: a page of hits plus the metadata reported with it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub hits: Vec<Hit>,
    /// Total matching documents (may be more than returned hits)
    pub total_hits: u64,
    #[serde(default)]
    pub aggregations: Aggregations,
    #[serde(default)]
    pub suggests: Suggests,
    #[serde(default)]
    pub max_score: f64,
    /// Time taken by the search engine (if reported), in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub took_ms: Option<u64>,
}

impl ResultSet {
    pub fn new(hits: Vec<Hit>, total_hits: u64) -> Self {
        Self {
            hits,
            total_hits,
            ..Default::default()
        }
    }

    pub fn with_aggregations(mut self, aggregations: Aggregations) -> Self {
        self.aggregations = aggregations;
        self
    }

    pub fn with_suggests(mut self, suggests: Suggests) -> Self {
        self.suggests = suggests;
        self
    }

    pub fn with_max_score(mut self, max_score: f64) -> Self {
        self.max_score = max_score;
        self
    }

    pub fn with_took(mut self, took_ms: u64) -> Self {
        self.took_ms = Some(took_ms);
        self
    }

    /// Get hit IDs in rank order
    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// A hit paired with the domain object it was hydrated into
#[derive(Debug, Clone, PartialEq)]
pub struct HybridResult<T> {
    pub hit: Hit,
    pub object: T,
}

impl<T> HybridResult<T> {
    pub fn new(hit: Hit, object: T) -> Self {
        Self { hit, object }
    }
}
