use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::metadata::MetadataCache;
use super::{PaginatorAdapter, PartialResults, capped_total, effective_length};
use crate::config::{PaginatorOptions, ScrollMetadata};
use crate::error::Result;
use crate::provider::{ScrollCursor, SearchBackend};
use crate::query::Query;
use crate::types::{Aggregations, Hit, ResultSet, Suggests};

/// Owns one forward-only scroll session over a query.
///
/// The session is opened by the first [`next_page`](Self::next_page) call and
/// advanced by every later call; it is never rewound or reopened. Pages must
/// be requested sequentially from offset 0: the requested offset only feeds
/// the size-cap check, the cursor position decides which page comes back.
pub struct ScrollCursorController {
    backend: Arc<dyn SearchBackend>,
    query: Query,
    options: PaginatorOptions,
    cursor: Option<Box<dyn ScrollCursor>>,
    next_offset: usize,
    metadata: MetadataCache,
}

impl ScrollCursorController {
    pub fn new(backend: Arc<dyn SearchBackend>, query: Query, options: PaginatorOptions) -> Self {
        Self {
            backend,
            query,
            options,
            cursor: None,
            next_offset: 0,
            metadata: MetadataCache::default(),
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn options(&self) -> &PaginatorOptions {
        &self.options
    }

    pub fn is_open(&self) -> bool {
        self.cursor.is_some()
    }

    /// Fetch the next page of the scroll session, opening it on first use
    pub async fn next_page(&mut self, offset: usize, length: usize) -> Result<ResultSet> {
        let length = effective_length(&self.query, offset, length)?;
        if offset != self.next_offset {
            warn!(
                offset,
                expected = self.next_offset,
                "Scroll page requested out of sequence, returning the next page"
            );
        }

        let opening = self.cursor.is_none();
        let cursor = match self.cursor {
            Some(ref mut cursor) => cursor,
            None => {
                let cursor = self.open(length).await?;
                self.cursor.insert(cursor)
            }
        };

        let mut results = cursor.advance().await?;
        // the session page size is fixed at open; a capped last page is shorter
        results.hits.truncate(length);
        debug!(offset, length, hits = results.len(), "Advanced scroll");

        if opening || self.options.scroll_metadata == ScrollMetadata::EveryPage {
            self.metadata.capture(&results);
        }
        self.next_offset = offset.saturating_add(length);

        Ok(results)
    }

    async fn open(&self, length: usize) -> Result<Box<dyn ScrollCursor>> {
        // reject a malformed expiry before the backend sees it
        self.options.expiry()?;

        let mut query = self.query.clone();
        query.set_size(length);

        debug!(
            backend = self.backend.name(),
            expiry = %self.options.expiry_time,
            page_size = length,
            "Opening scroll"
        );
        self.backend
            .open_scroll(&query, &self.options.expiry_time)
            .await
    }

    /// One search of the unmodified query, outside the scroll session
    async fn first_page(&self) -> Result<ResultSet> {
        debug!(
            backend = self.backend.name(),
            "Fetching first page for scroll metadata"
        );
        self.backend.search(&self.query).await
    }

    pub async fn total_hits(&mut self, genuine_total: bool) -> Result<u64> {
        let total = match self.metadata.total_hits {
            Some(total) => total,
            None => {
                let total = self.first_page().await?.total_hits;
                self.metadata.total_hits = Some(total);
                total
            }
        };

        Ok(capped_total(total, &self.query, genuine_total))
    }

    pub async fn aggregations(&mut self) -> Result<Aggregations> {
        if let Some(aggregations) = &self.metadata.aggregations {
            return Ok(aggregations.clone());
        }

        let aggregations = self.first_page().await?.aggregations;
        self.metadata.aggregations = Some(aggregations.clone());
        Ok(aggregations)
    }

    pub async fn suggests(&mut self) -> Result<Suggests> {
        if let Some(suggests) = &self.metadata.suggests {
            return Ok(suggests.clone());
        }

        let suggests = self.first_page().await?.suggests;
        self.metadata.suggests = Some(suggests.clone());
        Ok(suggests)
    }

    pub async fn max_score(&mut self) -> Result<f64> {
        if let Some(max_score) = self.metadata.max_score {
            return Ok(max_score);
        }

        let max_score = self.first_page().await?.max_score;
        self.metadata.max_score = Some(max_score);
        Ok(max_score)
    }
}

/// Scroll-cursor adapter yielding raw hits
pub struct RawScrollPaginatorAdapter {
    controller: ScrollCursorController,
}

impl RawScrollPaginatorAdapter {
    pub fn new(backend: Arc<dyn SearchBackend>, query: Query, options: PaginatorOptions) -> Self {
        Self {
            controller: ScrollCursorController::new(backend, query, options),
        }
    }

    pub fn controller(&self) -> &ScrollCursorController {
        &self.controller
    }
}

#[async_trait]
impl PaginatorAdapter for RawScrollPaginatorAdapter {
    type Item = Hit;

    async fn results(&mut self, offset: usize, length: usize) -> Result<PartialResults<Hit>> {
        let results = self.controller.next_page(offset, length).await?;
        Ok(PartialResults::raw(results))
    }

    async fn total_hits(&mut self, genuine_total: bool) -> Result<u64> {
        self.controller.total_hits(genuine_total).await
    }

    async fn aggregations(&mut self) -> Result<Aggregations> {
        self.controller.aggregations().await
    }

    async fn suggests(&mut self) -> Result<Suggests> {
        self.controller.suggests().await
    }

    async fn max_score(&mut self) -> Result<f64> {
        self.controller.max_score().await
    }

    fn query(&self) -> &Query {
        self.controller.query()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::Error;
    use crate::providers::MemoryBackend;

    fn backend(count: usize) -> MemoryBackend {
        let hits = (0..count)
            .map(|i| Hit::new(format!("doc-{}", i), 50.0 - i as f64))
            .collect();
        MemoryBackend::new("memory", hits)
    }

    fn adapter(
        backend: &MemoryBackend,
        query: Query,
        options: PaginatorOptions,
    ) -> RawScrollPaginatorAdapter {
        RawScrollPaginatorAdapter::new(Arc::new(backend.clone()), query, options)
    }

    #[tokio::test]
    async fn test_sequential_pages_visit_each_hit_once() {
        let backend = backend(25);
        let mut adapter = adapter(&backend, Query::match_all(), PaginatorOptions::default());

        let mut seen = Vec::new();
        for page in 0..3 {
            let results = adapter.results(page * 10, 10).await.unwrap();
            seen.extend(results.into_iter().map(|hit| hit.id));
        }

        let expected: Vec<String> = (0..25).map(|i| format!("doc-{}", i)).collect();
        assert_eq!(seen, expected);
        let calls = backend.call_counts();
        assert_eq!((calls.scroll_opens, calls.scroll_advances), (1, 3));
        assert_eq!(calls.searches, 0);
    }

    #[tokio::test]
    async fn test_repeated_offset_still_advances() {
        let backend = backend(25);
        let mut adapter = adapter(&backend, Query::match_all(), PaginatorOptions::default());

        let first = adapter.results(0, 10).await.unwrap();
        let again = adapter.results(0, 10).await.unwrap();
        assert_eq!(first.items()[0].id, "doc-0");
        assert_eq!(again.items()[0].id, "doc-10");
    }

    #[tokio::test]
    async fn test_default_expiry_is_one_minute() {
        let backend = backend(5);
        let mut adapter = adapter(&backend, Query::match_all(), PaginatorOptions::default());

        assert!(!adapter.controller().is_open());
        adapter.results(0, 5).await.unwrap();
        assert!(adapter.controller().is_open());
        assert_eq!(backend.last_scroll_expiry().as_deref(), Some("1m"));
    }

    #[tokio::test]
    async fn test_configured_expiry_is_used() {
        let backend = backend(5);
        let options = PaginatorOptions::default().with_expiry_time("5m");
        let mut adapter = adapter(&backend, Query::match_all(), options);

        assert_eq!(adapter.controller().options().expiry_time, "5m");
        adapter.results(0, 5).await.unwrap();
        assert_eq!(backend.last_scroll_expiry().as_deref(), Some("5m"));
    }

    #[tokio::test]
    async fn test_huge_offset_does_not_overflow() {
        let backend = backend(5);
        let mut adapter = adapter(&backend, Query::match_all(), PaginatorOptions::default());

        let page = adapter.results(usize::MAX, 1).await.unwrap();
        assert_eq!(page.result_set().ids(), vec!["doc-0"]);
        let next = adapter.results(usize::MAX, 1).await.unwrap();
        assert_eq!(next.result_set().ids(), vec!["doc-1"]);

        let mut capped = adapter_with_cap(&backend, 3);
        assert!(matches!(
            capped.results(usize::MAX, 1).await,
            Err(Error::InvalidArgument(_))
        ));
    }

    fn adapter_with_cap(backend: &MemoryBackend, size: usize) -> RawScrollPaginatorAdapter {
        adapter(
            backend,
            Query::match_all().with_size(size),
            PaginatorOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_invalid_expiry_fails_before_backend() {
        let backend = backend(5);
        let options = PaginatorOptions::default().with_expiry_time("soon");
        let mut adapter = adapter(&backend, Query::match_all(), options);

        assert!(matches!(
            adapter.results(0, 5).await,
            Err(Error::Config(_))
        ));
        assert_eq!(backend.call_counts().scroll_opens, 0);
    }

    #[tokio::test]
    async fn test_size_cap_clamps_and_rejects() {
        let backend = backend(30);
        let mut adapter = adapter(
            &backend,
            Query::match_all().with_size(15),
            PaginatorOptions::default(),
        );

        assert_eq!(adapter.results(0, 10).await.unwrap().len(), 10);
        let last = adapter.results(10, 10).await.unwrap();
        assert_eq!(last.len(), 5);
        assert_eq!(last.items()[0].id, "doc-10");

        let advances = backend.call_counts().scroll_advances;
        assert!(matches!(
            adapter.results(15, 10).await,
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(backend.call_counts().scroll_advances, advances);
    }

    #[tokio::test]
    async fn test_total_hits_stable_and_capped() {
        let backend = backend(30);
        let mut adapter = adapter(
            &backend,
            Query::match_all().with_size(15),
            PaginatorOptions::default(),
        );

        adapter.results(0, 10).await.unwrap();
        let before = adapter.total_hits(false).await.unwrap();
        adapter.results(10, 10).await.unwrap();
        let after = adapter.total_hits(false).await.unwrap();

        assert_eq!(before, 15);
        assert_eq!(after, before);
        assert_eq!(adapter.total_hits(true).await.unwrap(), 30);
        assert_eq!(backend.call_counts().searches, 0);
    }

    #[tokio::test]
    async fn test_metadata_before_first_page_leaves_cursor_alone() {
        let backend = backend(12);
        let mut adapter = adapter(&backend, Query::match_all(), PaginatorOptions::default());

        assert_eq!(adapter.total_hits(false).await.unwrap(), 12);
        assert_eq!(adapter.max_score().await.unwrap(), 50.0);
        assert!(!adapter.controller().is_open());
        assert_eq!(backend.call_counts().searches, 2);

        let page = adapter.results(0, 10).await.unwrap();
        assert_eq!(page.items()[0].id, "doc-0");
    }

    /// Scroll whose pages each report different metadata
    struct ScriptedBackend {
        pages: Vec<ResultSet>,
    }

    impl ScriptedBackend {
        fn new(pages: usize) -> Self {
            let pages = (0..pages)
                .map(|page| {
                    let hits = (0..2)
                        .map(|i| Hit::new(format!("p{}-{}", page, i), 1.0))
                        .collect();
                    let mut aggs = Aggregations::new();
                    aggs.insert("page".into(), json!(page));
                    ResultSet::new(hits, 100 + page as u64)
                        .with_aggregations(aggs)
                        .with_max_score(10.0 - page as f64)
                })
                .collect();
            Self { pages }
        }
    }

    struct ScriptedScroll {
        pages: std::vec::IntoIter<ResultSet>,
    }

    #[async_trait]
    impl ScrollCursor for ScriptedScroll {
        async fn advance(&mut self) -> Result<ResultSet> {
            self.pages.next().ok_or(Error::EndOfScroll)
        }
    }

    #[async_trait]
    impl SearchBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn capabilities(&self) -> crate::provider::Capabilities {
            crate::provider::Capabilities {
                scroll: true,
                ..Default::default()
            }
        }

        async fn connect(&mut self) -> Result<()> {
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<()> {
            Ok(())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn search(&self, _query: &Query) -> Result<ResultSet> {
            Ok(self.pages[0].clone())
        }

        async fn count(&self, _query: &Query) -> Result<u64> {
            Ok(self.pages[0].total_hits)
        }

        async fn open_scroll(&self, _query: &Query, _expiry: &str) -> Result<Box<dyn ScrollCursor>> {
            Ok(Box::new(ScriptedScroll {
                pages: self.pages.clone().into_iter(),
            }))
        }
    }

    fn scripted(policy: ScrollMetadata) -> RawScrollPaginatorAdapter {
        RawScrollPaginatorAdapter::new(
            Arc::new(ScriptedBackend::new(3)),
            Query::match_all(),
            PaginatorOptions::default().with_scroll_metadata(policy),
        )
    }

    fn page_of(aggregations: &Aggregations) -> Option<u64> {
        aggregations.get("page").and_then(|v| v.as_u64())
    }

    #[tokio::test]
    async fn test_every_page_policy_reflects_latest_page() {
        let mut adapter = scripted(ScrollMetadata::EveryPage);

        adapter.results(0, 2).await.unwrap();
        assert_eq!(adapter.total_hits(false).await.unwrap(), 100);

        adapter.results(2, 2).await.unwrap();
        assert_eq!(adapter.total_hits(false).await.unwrap(), 101);
        assert_eq!(page_of(&adapter.aggregations().await.unwrap()), Some(1));
        assert_eq!(adapter.max_score().await.unwrap(), 9.0);
    }

    #[tokio::test]
    async fn test_first_page_policy_keeps_first_page() {
        let mut adapter = scripted(ScrollMetadata::FirstPage);

        adapter.results(0, 2).await.unwrap();
        adapter.results(2, 2).await.unwrap();
        adapter.results(4, 2).await.unwrap();

        assert_eq!(adapter.total_hits(false).await.unwrap(), 100);
        assert_eq!(page_of(&adapter.aggregations().await.unwrap()), Some(0));
        assert_eq!(adapter.max_score().await.unwrap(), 10.0);
    }

    #[tokio::test]
    async fn test_first_page_overwrites_lazily_fetched_values() {
        for policy in [ScrollMetadata::EveryPage, ScrollMetadata::FirstPage] {
            let mut adapter = scripted(policy);
            // the scripted search answers with page 0 metadata
            assert_eq!(adapter.total_hits(false).await.unwrap(), 100);

            adapter.results(0, 2).await.unwrap();
            assert_eq!(adapter.total_hits(false).await.unwrap(), 100);
        }
    }

    #[tokio::test]
    async fn test_failed_advance_keeps_metadata() {
        let backend = backend(25);
        let mut adapter = adapter(&backend, Query::match_all(), PaginatorOptions::default());

        adapter.results(0, 25).await.unwrap();
        backend.expire_scrolls();

        assert!(matches!(
            adapter.results(25, 25).await,
            Err(Error::Backend(_))
        ));
        assert_eq!(adapter.total_hits(false).await.unwrap(), 25);
        assert_eq!(backend.call_counts().searches, 0);
    }

    #[tokio::test]
    async fn test_end_of_scroll_is_propagated() {
        let backend = backend(4);
        let mut adapter = adapter(&backend, Query::match_all(), PaginatorOptions::default());

        assert_eq!(adapter.results(0, 4).await.unwrap().len(), 4);
        assert!(adapter.results(4, 4).await.unwrap().is_empty());
        assert!(matches!(
            adapter.results(8, 4).await,
            Err(Error::EndOfScroll)
        ));
    }
}
