use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::metadata::MetadataCache;
use super::{PaginatorAdapter, PartialResults, capped_total, effective_length};
use crate::error::Result;
use crate::provider::SearchBackend;
use crate::query::Query;
use crate::types::{Aggregations, Hit, ResultSet, SearchOptions, Suggests};

/// Offset-based adapter: every page is a fresh `from`/`size` search
pub struct RawPaginatorAdapter {
    backend: Arc<dyn SearchBackend>,
    query: Query,
    options: SearchOptions,
    metadata: MetadataCache,
}

impl RawPaginatorAdapter {
    pub fn new(backend: Arc<dyn SearchBackend>, query: Query) -> Self {
        Self {
            backend,
            query,
            options: SearchOptions::new(),
            metadata: MetadataCache::default(),
        }
    }

    /// Request options sent with every search this adapter runs
    pub fn with_search_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn search_options(&self) -> &SearchOptions {
        &self.options
    }

    async fn search(&self, query: &Query) -> Result<ResultSet> {
        self.backend.search_with_options(query, &self.options).await
    }

    async fn fetch(&mut self, offset: usize, length: usize) -> Result<ResultSet> {
        let length = effective_length(&self.query, offset, length)?;

        let mut query = self.query.clone();
        query.set_offset(offset).set_size(length);

        let results = self.search(&query).await?;
        debug!(
            backend = self.backend.name(),
            offset,
            length,
            hits = results.len(),
            "Fetched page"
        );

        self.metadata.capture(&results);
        Ok(results)
    }
}

#[async_trait]
impl PaginatorAdapter for RawPaginatorAdapter {
    type Item = Hit;

    async fn results(&mut self, offset: usize, length: usize) -> Result<PartialResults<Hit>> {
        let results = self.fetch(offset, length).await?;
        Ok(PartialResults::raw(results))
    }

    async fn total_hits(&mut self, genuine_total: bool) -> Result<u64> {
        let total = match self.metadata.total_hits {
            Some(total) => total,
            None => {
                let total = self.backend.count(&self.query).await?;
                self.metadata.total_hits = Some(total);
                total
            }
        };

        Ok(capped_total(total, &self.query, genuine_total))
    }

    async fn aggregations(&mut self) -> Result<Aggregations> {
        if let Some(aggregations) = &self.metadata.aggregations {
            return Ok(aggregations.clone());
        }

        let aggregations = self.search(&self.query).await?.aggregations;
        self.metadata.aggregations = Some(aggregations.clone());
        Ok(aggregations)
    }

    async fn suggests(&mut self) -> Result<Suggests> {
        if let Some(suggests) = &self.metadata.suggests {
            return Ok(suggests.clone());
        }

        let suggests = self.search(&self.query).await?.suggests;
        self.metadata.suggests = Some(suggests.clone());
        Ok(suggests)
    }

    async fn max_score(&mut self) -> Result<f64> {
        if let Some(max_score) = self.metadata.max_score {
            return Ok(max_score);
        }

        let max_score = self.search(&self.query).await?.max_score;
        self.metadata.max_score = Some(max_score);
        Ok(max_score)
    }

    fn query(&self) -> &Query {
        &self.query
    }
}
