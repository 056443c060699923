mod metadata;
mod offset;
mod partial;
mod scroll;
mod transformed;

pub use offset::RawPaginatorAdapter;
pub use partial::PartialResults;
pub use scroll::{RawScrollPaginatorAdapter, ScrollCursorController};
pub use transformed::{
    HybridPaginatorAdapter, TransformedPaginatorAdapter, TransformedScrollPaginatorAdapter,
};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::query::Query;
use crate::types::{Aggregations, Suggests};

/// Offset/length access to a query's results plus lazily memoized metadata.
///
/// Adapters are single-owner: every method that may reach the backend takes
/// `&mut self`, and each call awaits at most one backend round trip.
#[async_trait]
pub trait PaginatorAdapter: Send {
    type Item: Send;

    /// Fetch `length` items starting at `offset`.
    ///
    /// Fails with [`Error::InvalidArgument`] when the query's size cap leaves
    /// fewer than one item to return.
    async fn results(&mut self, offset: usize, length: usize) -> Result<PartialResults<Self::Item>>;

    /// Total hits, capped by the query's `size` unless `genuine_total` is set
    async fn total_hits(&mut self, genuine_total: bool) -> Result<u64>;

    async fn aggregations(&mut self) -> Result<Aggregations>;

    async fn suggests(&mut self) -> Result<Suggests>;

    async fn max_score(&mut self) -> Result<f64>;

    fn query(&self) -> &Query;
}

/// Clamp a page length so it never reaches past the query's size cap
pub(crate) fn effective_length(query: &Query, offset: usize, length: usize) -> Result<usize> {
    let mut length = length;
    if let Some(size) = query.size() {
        if size < offset.saturating_add(length) {
            length = size.saturating_sub(offset);
        }
    }

    if length < 1 {
        return Err(Error::InvalidArgument(
            "item count per page must be greater than zero".into(),
        ));
    }

    Ok(length)
}

pub(crate) fn capped_total(total: u64, query: &Query, genuine_total: bool) -> u64 {
    match query.size() {
        Some(size) if !genuine_total => total.min(size as u64),
        _ => total,
    }
}
