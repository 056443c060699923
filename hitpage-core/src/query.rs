use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Accepted query shapes, normalized into a [`Query`] by [`Query::create`]
#[derive(Debug, Clone)]
pub enum QueryInput {
    /// Free text, run as a `query_string` query
    Text(String),
    /// A full request body (`query`, `aggs`, `size`, ...)
    Body(Map<String, Value>),
    /// An already built query
    Query(Query),
}

impl From<&str> for QueryInput {
    fn from(text: &str) -> Self {
        QueryInput::Text(text.to_owned())
    }
}

impl From<String> for QueryInput {
    fn from(text: String) -> Self {
        QueryInput::Text(text)
    }
}

impl From<Map<String, Value>> for QueryInput {
    fn from(body: Map<String, Value>) -> Self {
        QueryInput::Body(body)
    }
}

impl From<Query> for QueryInput {
    fn from(query: Query) -> Self {
        QueryInput::Query(query)
    }
}

/// A structured search request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query {
    body: Map<String, Value>,
}

impl Query {
    /// Normalize any accepted input shape into a query
    pub fn create(input: impl Into<QueryInput>) -> Self {
        match input.into() {
            QueryInput::Text(text) => Self::query_string(&text),
            QueryInput::Body(body) => Self { body },
            QueryInput::Query(query) => query,
        }
    }

    /// Query matching every document
    pub fn match_all() -> Self {
        Self::from_clause(json!({ "match_all": {} }))
    }

    pub fn query_string(text: &str) -> Self {
        Self::from_clause(json!({ "query_string": { "query": text } }))
    }

    /// Wrap a single query clause (`{"term": {...}}`, `{"bool": {...}}`, ...)
    pub fn from_clause(clause: Value) -> Self {
        let mut body = Map::new();
        body.insert("query".to_owned(), clause);
        Self { body }
    }

    /// The query clause, if the body has one
    pub fn clause(&self) -> Option<&Value> {
        self.body.get("query")
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.body.get(name).is_some_and(|v| !v.is_null())
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.body.insert(name.into(), value);
        self
    }

    /// Size cap declared by the query.
    ///
    /// Floats and numeric strings are truncated to an integer; a value that is
    /// not a number caps the query at zero rather than lifting the cap.
    pub fn size(&self) -> Option<usize> {
        self.count_param("size")
    }

    pub fn set_size(&mut self, size: usize) -> &mut Self {
        self.set_param("size", json!(size))
    }

    /// Offset of the first hit (`from`)
    pub fn offset(&self) -> Option<usize> {
        self.count_param("from")
    }

    pub fn set_offset(&mut self, offset: usize) -> &mut Self {
        self.set_param("from", json!(offset))
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.set_size(size);
        self
    }

    pub fn with_aggregation(mut self, name: &str, aggregation: Value) -> Self {
        let aggs = self
            .body
            .entry("aggs")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(aggs) = aggs {
            aggs.insert(name.to_owned(), aggregation);
        }
        self
    }

    fn count_param(&self, name: &str) -> Option<usize> {
        let value = self.body.get(name).filter(|v| !v.is_null())?;
        let count = match value {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(truncate)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<u64>().ok().or_else(|| s.parse::<f64>().ok().map(truncate))
            }
            _ => None,
        };
        Some(count.map_or(0, |count| usize::try_from(count).unwrap_or(usize::MAX)))
    }

    /// Request body as sent to the backend
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.body.clone())
    }
}

/// Float to count; negative and NaN become zero, the `as` cast saturates
fn truncate(value: f64) -> u64 {
    value.trunc().max(0.0) as u64
}
