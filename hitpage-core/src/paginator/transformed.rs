use std::sync::Arc;

use async_trait::async_trait;

use super::{PaginatorAdapter, PartialResults, RawPaginatorAdapter, RawScrollPaginatorAdapter};
use crate::error::Result;
use crate::query::Query;
use crate::transformer::ResultTransformer;
use crate::types::{Aggregations, Hit, HybridResult, Suggests};

/// Maps every page of a raw adapter to domain objects
pub struct TransformedPaginatorAdapter<O, A = RawPaginatorAdapter> {
    inner: A,
    transformer: Arc<dyn ResultTransformer<Object = O>>,
}

/// Scroll-cursor adapter yielding domain objects
pub type TransformedScrollPaginatorAdapter<O> =
    TransformedPaginatorAdapter<O, RawScrollPaginatorAdapter>;

impl<O, A> TransformedPaginatorAdapter<O, A> {
    pub fn new(inner: A, transformer: Arc<dyn ResultTransformer<Object = O>>) -> Self {
        Self { inner, transformer }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<O, A> PaginatorAdapter for TransformedPaginatorAdapter<O, A>
where
    O: Send + 'static,
    A: PaginatorAdapter<Item = Hit>,
{
    type Item = O;

    async fn results(&mut self, offset: usize, length: usize) -> Result<PartialResults<O>> {
        let page = self.inner.results(offset, length).await?;
        PartialResults::transformed(page.into_result_set(), self.transformer.as_ref()).await
    }

    async fn total_hits(&mut self, genuine_total: bool) -> Result<u64> {
        self.inner.total_hits(genuine_total).await
    }

    async fn aggregations(&mut self) -> Result<Aggregations> {
        self.inner.aggregations().await
    }

    async fn suggests(&mut self) -> Result<Suggests> {
        self.inner.suggests().await
    }

    async fn max_score(&mut self) -> Result<f64> {
        self.inner.max_score().await
    }

    fn query(&self) -> &Query {
        self.inner.query()
    }
}

/// Pairs every hit of a raw adapter's pages with its domain object
pub struct HybridPaginatorAdapter<O, A = RawPaginatorAdapter> {
    inner: A,
    transformer: Arc<dyn ResultTransformer<Object = O>>,
}

impl<O, A> HybridPaginatorAdapter<O, A> {
    pub fn new(inner: A, transformer: Arc<dyn ResultTransformer<Object = O>>) -> Self {
        Self { inner, transformer }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<O, A> PaginatorAdapter for HybridPaginatorAdapter<O, A>
where
    O: Send + 'static,
    A: PaginatorAdapter<Item = Hit>,
{
    type Item = HybridResult<O>;

    async fn results(
        &mut self,
        offset: usize,
        length: usize,
    ) -> Result<PartialResults<HybridResult<O>>> {
        let page = self.inner.results(offset, length).await?;
        PartialResults::hybrid(page.into_result_set(), self.transformer.as_ref()).await
    }

    async fn total_hits(&mut self, genuine_total: bool) -> Result<u64> {
        self.inner.total_hits(genuine_total).await
    }

    async fn aggregations(&mut self) -> Result<Aggregations> {
        self.inner.aggregations().await
    }

    async fn suggests(&mut self) -> Result<Suggests> {
        self.inner.suggests().await
    }

    async fn max_score(&mut self) -> Result<f64> {
        self.inner.max_score().await
    }

    fn query(&self) -> &Query {
        self.inner.query()
    }
}
