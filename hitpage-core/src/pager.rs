use crate::error::{Error, Result};
use crate::paginator::PaginatorAdapter;
use crate::types::{Aggregations, Suggests};

const DEFAULT_MAX_PER_PAGE: usize = 10;

/// Page-number pagination over a [`PaginatorAdapter`].
///
/// Pages are 1-based; page `n` is fetched as offset `(n - 1) * max_per_page`.
/// Over a scroll adapter, pages must be visited in order starting at page 1.
pub struct Pager<A> {
    adapter: A,
    max_per_page: usize,
    current_page: usize,
}

impl<A: PaginatorAdapter> Pager<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            max_per_page: DEFAULT_MAX_PER_PAGE,
            current_page: 1,
        }
    }

    pub fn max_per_page(&self) -> usize {
        self.max_per_page
    }

    pub fn set_max_per_page(&mut self, max_per_page: usize) -> Result<()> {
        if max_per_page < 1 {
            return Err(Error::InvalidArgument(
                "max per page must be greater than zero".into(),
            ));
        }
        self.max_per_page = max_per_page;
        Ok(())
    }

    pub fn with_max_per_page(mut self, max_per_page: usize) -> Result<Self> {
        self.set_max_per_page(max_per_page)?;
        Ok(self)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Move to `page`, failing if it lies outside `1..=nb_pages`
    pub async fn set_current_page(&mut self, page: usize) -> Result<()> {
        let pages = self.nb_pages().await?;
        if page < 1 || page > pages {
            return Err(Error::PageOutOfRange { page, pages });
        }
        self.current_page = page;
        Ok(())
    }

    /// Number of results, capped by the query's size
    pub async fn nb_results(&mut self) -> Result<u64> {
        self.adapter.total_hits(false).await
    }

    /// Number of pages; an empty result still has one (empty) page
    pub async fn nb_pages(&mut self) -> Result<usize> {
        let results = self.nb_results().await? as usize;
        Ok(results.div_ceil(self.max_per_page).max(1))
    }

    pub async fn has_next_page(&mut self) -> Result<bool> {
        Ok(self.current_page < self.nb_pages().await?)
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_page > 1
    }

    /// Advance to the next page and return its number
    pub async fn next_page(&mut self) -> Result<usize> {
        let page = self.current_page + 1;
        self.set_current_page(page).await?;
        Ok(page)
    }

    /// Step back to the previous page and return its number
    pub async fn previous_page(&mut self) -> Result<usize> {
        let page = self.current_page.saturating_sub(1);
        self.set_current_page(page).await?;
        Ok(page)
    }

    /// Items of the current page; fetched from the adapter on every call
    pub async fn current_page_results(&mut self) -> Result<Vec<A::Item>> {
        let offset = (self.current_page - 1) * self.max_per_page;
        let page = self.adapter.results(offset, self.max_per_page).await?;
        Ok(page.into_items())
    }

    pub async fn aggregations(&mut self) -> Result<Aggregations> {
        self.adapter.aggregations().await
    }

    pub async fn suggests(&mut self) -> Result<Suggests> {
        self.adapter.suggests().await
    }

    pub async fn max_score(&mut self) -> Result<f64> {
        self.adapter.max_score().await
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }
}
