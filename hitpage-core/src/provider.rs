use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::query::Query;
use crate::types::{ResultSet, SearchOptions};

/// Capabilities advertised by a search backend
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub scroll: bool,
    pub aggregations: bool,
    pub suggest: bool,
}

/// Trait for search backends
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Human-readable name for this backend instance
    fn name(&self) -> &str;

    /// What capabilities this backend supports
    fn capabilities(&self) -> Capabilities;

    /// Establish connection to the search engine
    async fn connect(&mut self) -> Result<()>;

    /// Close connection gracefully
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if the backend is healthy and connected
    async fn health_check(&self) -> Result<bool>;

    /// Execute a query and return one page of hits with its metadata
    async fn search(&self, query: &Query) -> Result<ResultSet>;

    /// Execute a query with per-call request options.
    ///
    /// Backends that take no request options reject a non-empty map.
    async fn search_with_options(
        &self,
        query: &Query,
        options: &SearchOptions,
    ) -> Result<ResultSet> {
        if let Some(name) = options.keys().next() {
            return Err(Error::Unsupported(format!(
                "Backend '{}' does not accept search option '{}'",
                self.name(),
                name
            )));
        }
        self.search(query).await
    }

    /// Count documents matching the query, ignoring `from` and `size`
    async fn count(&self, query: &Query) -> Result<u64>;

    /// Open a scroll session over the query, pages sized by the query's `size`.
    ///
    /// No page is fetched until the cursor is first advanced.
    async fn open_scroll(&self, _query: &Query, _expiry: &str) -> Result<Box<dyn ScrollCursor>> {
        Err(Error::Unsupported(format!(
            "Backend '{}' does not support scroll cursors",
            self.name()
        )))
    }
}

/// Forward-only handle over a backend scroll session
#[async_trait]
pub trait ScrollCursor: Send + Sync {
    /// Fetch the next page.
    ///
    /// Fails with [`Error::EndOfScroll`] once an empty page has been returned.
    async fn advance(&mut self) -> Result<ResultSet>;
}
