use crate::types::{Aggregations, ResultSet, Suggests};

/// Memoized result metadata; `None` means not fetched yet
#[derive(Debug, Clone, Default)]
pub(crate) struct MetadataCache {
    pub total_hits: Option<u64>,
    pub aggregations: Option<Aggregations>,
    pub suggests: Option<Suggests>,
    pub max_score: Option<f64>,
}

impl MetadataCache {
    /// Overwrite every field with the values reported by `results`
    pub fn capture(&mut self, results: &ResultSet) {
        self.total_hits = Some(results.total_hits);
        self.aggregations = Some(results.aggregations.clone());
        self.suggests = Some(results.suggests.clone());
        self.max_score = Some(results.max_score);
    }
}
