use crate::error::Result;
use crate::transformer::ResultTransformer;
use crate::types::{Aggregations, Hit, HybridResult, ResultSet, Suggests};

/// One page of items together with the backend response it came from
#[derive(Debug, Clone)]
pub struct PartialResults<T> {
    items: Vec<T>,
    results: ResultSet,
}

impl PartialResults<Hit> {
    /// Raw view: the items are the hits themselves
    pub fn raw(results: ResultSet) -> Self {
        Self {
            items: results.hits.clone(),
            results,
        }
    }
}

impl<T> PartialResults<T> {
    /// Domain objects mapped from the page's hits
    pub async fn transformed<R>(results: ResultSet, transformer: &R) -> Result<Self>
    where
        R: ResultTransformer<Object = T> + ?Sized,
    {
        let items = transformer.transform(&results.hits).await?;
        Ok(Self { items, results })
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hits of the underlying response, before any transformation
    pub fn raw_hits(&self) -> &[Hit] {
        &self.results.hits
    }

    pub fn result_set(&self) -> &ResultSet {
        &self.results
    }

    pub fn into_result_set(self) -> ResultSet {
        self.results
    }

    pub fn total_hits(&self) -> u64 {
        self.results.total_hits
    }

    pub fn aggregations(&self) -> &Aggregations {
        &self.results.aggregations
    }

    pub fn suggests(&self) -> &Suggests {
        &self.results.suggests
    }

    pub fn max_score(&self) -> f64 {
        self.results.max_score
    }
}

impl<O> PartialResults<HybridResult<O>> {
    /// Hits paired with their objects; unresolved hits are dropped
    pub async fn hybrid<R>(results: ResultSet, transformer: &R) -> Result<Self>
    where
        R: ResultTransformer<Object = O> + ?Sized,
    {
        let items = transformer.hybrid_transform(&results.hits).await?;
        Ok(Self { items, results })
    }
}

impl<T> IntoIterator for PartialResults<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
