use std::sync::Arc;

use tracing::debug;

use crate::config::PaginatorOptions;
use crate::error::{Error, Result};
use crate::pager::Pager;
use crate::paginator::{
    HybridPaginatorAdapter, RawPaginatorAdapter, RawScrollPaginatorAdapter,
    TransformedPaginatorAdapter, TransformedScrollPaginatorAdapter,
};
use crate::provider::SearchBackend;
use crate::query::{Query, QueryInput};
use crate::transformer::ResultTransformer;
use crate::types::{Hit, HybridResult, SearchOptions};

/// Runs queries against a backend and hands the hits to a transformer
pub struct Finder<O> {
    backend: Arc<dyn SearchBackend>,
    transformer: Arc<dyn ResultTransformer<Object = O>>,
    options: SearchOptions,
}

impl<O: Send + 'static> Finder<O> {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        transformer: Arc<dyn ResultTransformer<Object = O>>,
    ) -> Self {
        Self {
            backend,
            transformer,
            options: SearchOptions::new(),
        }
    }

    /// A finder sharing this one's backend and transformer that sends
    /// `options` with its searches and offset paginator searches
    pub fn with_search_options(&self, options: SearchOptions) -> Self {
        Self {
            backend: self.backend.clone(),
            transformer: self.transformer.clone(),
            options,
        }
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    /// Search and map the hits to domain objects
    pub async fn find(
        &self,
        query: impl Into<QueryInput>,
        limit: Option<usize>,
    ) -> Result<Vec<O>> {
        let hits = self.search(query, limit).await?;
        self.transformer.transform(&hits).await
    }

    /// Search and pair each hit with its domain object
    pub async fn find_hybrid(
        &self,
        query: impl Into<QueryInput>,
        limit: Option<usize>,
    ) -> Result<Vec<HybridResult<O>>> {
        let hits = self.search(query, limit).await?;
        self.transformer.hybrid_transform(&hits).await
    }

    /// Search and return the hits untouched
    pub async fn find_raw(
        &self,
        query: impl Into<QueryInput>,
        limit: Option<usize>,
    ) -> Result<Vec<Hit>> {
        self.search(query, limit).await
    }

    pub fn find_paginated(&self, query: impl Into<QueryInput>) -> Pager<TransformedPaginatorAdapter<O>> {
        Pager::new(self.create_paginator_adapter(query))
    }

    pub fn find_hybrid_paginated(
        &self,
        query: impl Into<QueryInput>,
    ) -> Pager<HybridPaginatorAdapter<O>> {
        Pager::new(self.create_hybrid_paginator_adapter(query))
    }

    pub fn find_raw_paginated(&self, query: impl Into<QueryInput>) -> Pager<RawPaginatorAdapter> {
        Pager::new(self.create_raw_paginator_adapter(query))
    }

    pub fn find_scroll_paginated(
        &self,
        query: impl Into<QueryInput>,
        options: PaginatorOptions,
    ) -> Result<Pager<TransformedScrollPaginatorAdapter<O>>> {
        Ok(Pager::new(self.create_scroll_paginator_adapter(query, options)?))
    }

    pub fn find_raw_scroll_paginated(
        &self,
        query: impl Into<QueryInput>,
        options: PaginatorOptions,
    ) -> Result<Pager<RawScrollPaginatorAdapter>> {
        Ok(Pager::new(
            self.create_raw_scroll_paginator_adapter(query, options)?,
        ))
    }

    pub fn create_paginator_adapter(
        &self,
        query: impl Into<QueryInput>,
    ) -> TransformedPaginatorAdapter<O> {
        TransformedPaginatorAdapter::new(
            self.create_raw_paginator_adapter(query),
            self.transformer.clone(),
        )
    }

    pub fn create_hybrid_paginator_adapter(
        &self,
        query: impl Into<QueryInput>,
    ) -> HybridPaginatorAdapter<O> {
        HybridPaginatorAdapter::new(
            self.create_raw_paginator_adapter(query),
            self.transformer.clone(),
        )
    }

    pub fn create_raw_paginator_adapter(&self, query: impl Into<QueryInput>) -> RawPaginatorAdapter {
        RawPaginatorAdapter::new(self.backend.clone(), Query::create(query))
            .with_search_options(self.options.clone())
    }

    /// Scroll adapter yielding domain objects
    pub fn create_scroll_paginator_adapter(
        &self,
        query: impl Into<QueryInput>,
        options: PaginatorOptions,
    ) -> Result<TransformedScrollPaginatorAdapter<O>> {
        let raw = self.create_raw_scroll_paginator_adapter(query, options)?;
        Ok(TransformedPaginatorAdapter::new(raw, self.transformer.clone()))
    }

    pub fn create_raw_scroll_paginator_adapter(
        &self,
        query: impl Into<QueryInput>,
        options: PaginatorOptions,
    ) -> Result<RawScrollPaginatorAdapter> {
        if !self.backend.capabilities().scroll {
            return Err(Error::Unsupported(format!(
                "Backend '{}' does not support scroll cursors",
                self.backend.name()
            )));
        }

        Ok(RawScrollPaginatorAdapter::new(
            self.backend.clone(),
            Query::create(query),
            options,
        ))
    }

    async fn search(&self, query: impl Into<QueryInput>, limit: Option<usize>) -> Result<Vec<Hit>> {
        let mut query = Query::create(query);
        if let Some(limit) = limit {
            query.set_size(limit);
        }

        let results = self.backend.search_with_options(&query, &self.options).await?;
        debug!(
            backend = self.backend.name(),
            hits = results.len(),
            total = results.total_hits,
            "Search completed"
        );
        Ok(results.hits)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::paginator::PaginatorAdapter;
    use crate::provider::Capabilities;
    use crate::providers::MemoryBackend;
    use crate::transformer::LookupTransformer;
    use crate::types::ResultSet;

    fn finder() -> (MemoryBackend, Finder<String>) {
        let hits = (0..15)
            .map(|i| {
                let lang = if i % 3 == 0 { "rust" } else { "python" };
                Hit::new(i.to_string(), 15.0 - i as f64).with_source(json!({ "lang": lang }))
            })
            .collect();
        let backend = MemoryBackend::new("memory", hits);
        // hit "6" has no object
        let objects: HashMap<String, String> = (0..15)
            .filter(|i| *i != 6)
            .map(|i| (i.to_string(), format!("object-{}", i)))
            .collect();
        let transformer = Arc::new(LookupTransformer::new(objects).ignore_missing(true));
        (backend.clone(), Finder::new(Arc::new(backend), transformer))
    }

    #[tokio::test]
    async fn test_find_variants() {
        let (_, finder) = finder();

        let objects = finder.find("rust", None).await.unwrap();
        assert_eq!(objects, vec!["object-0", "object-3", "object-9", "object-12"]);

        let hybrid = finder.find_hybrid("rust", None).await.unwrap();
        assert_eq!(hybrid.len(), 4);
        assert_eq!(hybrid[2].hit.id, "9");

        let raw = finder.find_raw("rust", Some(2)).await.unwrap();
        let ids: Vec<&str> = raw.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "3"]);
    }

    #[tokio::test]
    async fn test_find_accepts_body_and_query() {
        let (_, finder) = finder();

        let body = json!({ "query": { "query_string": { "query": "rust" } }, "size": 1 });
        let serde_json::Value::Object(body) = body else {
            unreachable!()
        };
        assert_eq!(finder.find_raw(body, None).await.unwrap().len(), 1);

        let query = Query::match_all();
        assert_eq!(finder.find_raw(query, Some(20)).await.unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_paginated_variants() {
        let (backend, finder) = finder();

        let mut pager = finder.find_paginated("python").with_max_per_page(4).unwrap();
        assert_eq!(pager.nb_pages().await.unwrap(), 3);
        assert_eq!(pager.current_page_results().await.unwrap().len(), 4);

        let mut hybrid = finder.find_hybrid_paginated(Query::match_all());
        let page = hybrid.current_page_results().await.unwrap();
        assert_eq!(page.len(), 9);

        let mut raw = finder.find_raw_paginated("rust");
        assert_eq!(raw.current_page_results().await.unwrap().len(), 5);

        let mut scroll = finder
            .find_scroll_paginated(Query::match_all(), PaginatorOptions::default())
            .unwrap()
            .with_max_per_page(5)
            .unwrap();
        scroll.current_page_results().await.unwrap();
        scroll.next_page().await.unwrap();
        let second = scroll.current_page_results().await.unwrap();
        assert_eq!(second, vec!["object-5", "object-7", "object-8", "object-9"]);
        assert_eq!(backend.call_counts().scroll_opens, 1);
    }

    #[tokio::test]
    async fn test_search_options_per_call() {
        let (backend, finder) = finder();
        let mut options = SearchOptions::new();
        options.insert("routing".into(), json!("shard-1"));

        finder.with_search_options(options.clone()).find_raw("rust", None).await.unwrap();
        assert_eq!(backend.last_search_options(), Some(options.clone()));

        let mut pager = finder.with_search_options(options.clone()).find_raw_paginated("rust");
        assert_eq!(pager.adapter().search_options(), &options);
        pager.current_page_results().await.unwrap();
        assert_eq!(backend.last_search_options(), Some(options));

        finder.find_raw("rust", None).await.unwrap();
        assert_eq!(backend.last_search_options(), Some(SearchOptions::new()));
    }

    #[tokio::test]
    async fn test_search_options_rejected_by_plain_backend() {
        let transformer = Arc::new(LookupTransformer::new(HashMap::<String, String>::new()));
        let finder = Finder::new(Arc::new(PlainBackend), transformer);
        let mut options = SearchOptions::new();
        options.insert("preference".into(), json!("_local"));

        assert!(finder.find_raw("rust", None).await.is_ok());
        assert!(matches!(
            finder.with_search_options(options).find_raw("rust", None).await,
            Err(Error::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_raw_scroll_adapter_keeps_query() {
        let (_, finder) = finder();
        let adapter = finder
            .create_raw_scroll_paginator_adapter("rust", PaginatorOptions::default())
            .unwrap();
        assert_eq!(
            adapter.query().clause(),
            Some(&json!({ "query_string": { "query": "rust" } }))
        );
    }

    /// Backend without scroll support
    struct PlainBackend;

    #[async_trait]
    impl SearchBackend for PlainBackend {
        fn name(&self) -> &str {
            "plain"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::default()
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
            Ok(ResultSet::default())
        }

        async fn count(&self, _query: &Query) -> Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_scroll_requires_capability() {
        let transformer = Arc::new(LookupTransformer::new(HashMap::<String, String>::new()));
        let finder = Finder::new(Arc::new(PlainBackend), transformer);
        let capabilities = finder.backend().capabilities();
        assert!(!capabilities.scroll && !capabilities.aggregations && !capabilities.suggest);

        assert!(matches!(
            finder.create_scroll_paginator_adapter("rust", PaginatorOptions::default()),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            finder.backend().open_scroll(&Query::match_all(), "1m").await,
            Err(Error::Unsupported(_))
        ));
    }
}
