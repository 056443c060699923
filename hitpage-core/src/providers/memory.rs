use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::MemoryConfig;
use crate::error::{Error, Result};
use crate::provider::{Capabilities, ScrollCursor, SearchBackend};
use crate::query::Query;
use crate::types::{Aggregations, Hit, ResultSet, SearchOptions, Suggests};

/// Page size used when a query carries no `size`
const DEFAULT_PAGE_SIZE: usize = 10;

/// Number of backend calls observed by a [`MemoryBackend`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub searches: usize,
    pub counts: usize,
    pub scroll_opens: usize,
    pub scroll_advances: usize,
}

struct Documents {
    hits: Vec<Hit>,
    aggregations: Aggregations,
    suggests: Suggests,
}

struct Shared {
    documents: Mutex<Documents>,
    searches: AtomicUsize,
    counts: AtomicUsize,
    scroll_opens: AtomicUsize,
    scroll_advances: AtomicUsize,
    fail_next: AtomicBool,
    scroll_generation: AtomicU64,
    last_expiry: Mutex<Option<String>>,
    last_options: Mutex<Option<SearchOptions>>,
}

impl Shared {
    fn documents(&self) -> MutexGuard<'_, Documents> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(&self) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::Backend("injected backend failure".into()));
        }
        Ok(())
    }
}

/// In-process backend over a fixed list of pre-ranked hits.
///
/// Clones share the same documents and call counters, so a test can keep a
/// handle while an adapter owns another.
#[derive(Clone)]
pub struct MemoryBackend {
    name: String,
    shared: Arc<Shared>,
}

impl MemoryBackend {
    pub fn new(name: impl Into<String>, hits: Vec<Hit>) -> Self {
        Self {
            name: name.into(),
            shared: Arc::new(Shared {
                documents: Mutex::new(Documents {
                    hits,
                    aggregations: Aggregations::new(),
                    suggests: Suggests::new(),
                }),
                searches: AtomicUsize::new(0),
                counts: AtomicUsize::new(0),
                scroll_opens: AtomicUsize::new(0),
                scroll_advances: AtomicUsize::new(0),
                fail_next: AtomicBool::new(false),
                scroll_generation: AtomicU64::new(0),
                last_expiry: Mutex::new(None),
                last_options: Mutex::new(None),
            }),
        }
    }

    pub fn from_config(name: impl Into<String>, config: &MemoryConfig) -> Self {
        Self::new(name, config.documents.clone())
            .with_aggregations(config.aggregations.clone())
            .with_suggests(config.suggests.clone())
    }

    pub fn with_aggregations(self, aggregations: Aggregations) -> Self {
        self.shared.documents().aggregations = aggregations;
        self
    }

    pub fn with_suggests(self, suggests: Suggests) -> Self {
        self.shared.documents().suggests = suggests;
        self
    }

    /// Replace the indexed hits; open scroll sessions keep their snapshot
    pub fn set_hits(&self, hits: Vec<Hit>) {
        self.shared.documents().hits = hits;
    }

    pub fn push_hit(&self, hit: Hit) {
        self.shared.documents().hits.push(hit);
    }

    pub fn set_aggregations(&self, aggregations: Aggregations) {
        self.shared.documents().aggregations = aggregations;
    }

    /// Make the next backend call fail with [`Error::Backend`]
    pub fn fail_next_call(&self) {
        self.shared.fail_next.store(true, Ordering::SeqCst);
    }

    /// Expire every scroll session opened so far
    pub fn expire_scrolls(&self) {
        self.shared.scroll_generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn call_counts(&self) -> CallCounts {
        CallCounts {
            searches: self.shared.searches.load(Ordering::SeqCst),
            counts: self.shared.counts.load(Ordering::SeqCst),
            scroll_opens: self.shared.scroll_opens.load(Ordering::SeqCst),
            scroll_advances: self.shared.scroll_advances.load(Ordering::SeqCst),
        }
    }

    /// Expiry passed to the most recent `open_scroll`
    pub fn last_scroll_expiry(&self) -> Option<String> {
        self.shared
            .last_expiry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Options passed to the most recent `search_with_options`
    pub fn last_search_options(&self) -> Option<SearchOptions> {
        self.shared
            .last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn matching(&self, query: &Query) -> Result<(Vec<Hit>, Aggregations, Suggests)> {
        let matcher = Matcher::from_query(query)?;
        let documents = self.shared.documents();
        let hits = documents
            .hits
            .iter()
            .filter(|hit| matcher.matches(hit))
            .cloned()
            .collect();
        Ok((
            hits,
            documents.aggregations.clone(),
            documents.suggests.clone(),
        ))
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            scroll: true,
            aggregations: true,
            suggest: true,
        }
    }

    async fn connect(&mut self) -> Result<()> {
        debug!(backend = %self.name, "Connected to in-memory backend");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn search(&self, query: &Query) -> Result<ResultSet> {
        self.shared.searches.fetch_add(1, Ordering::SeqCst);
        self.shared.take_failure()?;

        let (matched, aggregations, suggests) = self.matching(query)?;
        let total = matched.len() as u64;
        let max_score = max_score(&matched);
        let from = query.offset().unwrap_or(0);
        let size = query.size().unwrap_or(DEFAULT_PAGE_SIZE);
        let hits = matched.into_iter().skip(from).take(size).collect();

        Ok(ResultSet::new(hits, total)
            .with_aggregations(aggregations)
            .with_suggests(suggests)
            .with_max_score(max_score))
    }

    /// Options are recorded but do not change how hits are matched
    async fn search_with_options(
        &self,
        query: &Query,
        options: &SearchOptions,
    ) -> Result<ResultSet> {
        *self
            .shared
            .last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(options.clone());
        self.search(query).await
    }

    async fn count(&self, query: &Query) -> Result<u64> {
        self.shared.counts.fetch_add(1, Ordering::SeqCst);
        self.shared.take_failure()?;

        let (matched, _, _) = self.matching(query)?;
        Ok(matched.len() as u64)
    }

    async fn open_scroll(&self, query: &Query, expiry: &str) -> Result<Box<dyn ScrollCursor>> {
        self.shared.scroll_opens.fetch_add(1, Ordering::SeqCst);
        self.shared.take_failure()?;

        *self
            .shared
            .last_expiry
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(expiry.to_owned());

        let (hits, aggregations, suggests) = self.matching(query)?;
        let page_size = query.size().unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        debug!(
            backend = %self.name,
            expiry,
            page_size,
            matched = hits.len(),
            "Opened in-memory scroll"
        );

        Ok(Box::new(MemoryScroll {
            shared: self.shared.clone(),
            generation: self.shared.scroll_generation.load(Ordering::SeqCst),
            total: hits.len() as u64,
            max_score: max_score(&hits),
            hits,
            aggregations,
            suggests,
            page_size,
            position: 0,
            exhausted: false,
        }))
    }
}

/// Point-in-time scroll over the hits matched when it was opened
struct MemoryScroll {
    shared: Arc<Shared>,
    generation: u64,
    hits: Vec<Hit>,
    total: u64,
    max_score: f64,
    aggregations: Aggregations,
    suggests: Suggests,
    page_size: usize,
    position: usize,
    exhausted: bool,
}

#[async_trait]
impl ScrollCursor for MemoryScroll {
    async fn advance(&mut self) -> Result<ResultSet> {
        if self.exhausted {
            return Err(Error::EndOfScroll);
        }
        self.shared.scroll_advances.fetch_add(1, Ordering::SeqCst);
        if self.shared.scroll_generation.load(Ordering::SeqCst) != self.generation {
            return Err(Error::Backend("scroll context expired".into()));
        }
        self.shared.take_failure()?;

        let end = (self.position + self.page_size).min(self.hits.len());
        let page = self.hits[self.position..end].to_vec();
        self.position = end;
        if page.is_empty() {
            self.exhausted = true;
        }

        Ok(ResultSet::new(page, self.total)
            .with_aggregations(self.aggregations.clone())
            .with_suggests(self.suggests.clone())
            .with_max_score(self.max_score))
    }
}

/// Subset of query clauses the in-memory backend evaluates
enum Matcher {
    All,
    /// Any of the lowercase terms appears in the id or the source
    Terms(Vec<String>),
}

impl Matcher {
    fn from_query(query: &Query) -> Result<Self> {
        let Some(clause) = query.clause() else {
            return Ok(Matcher::All);
        };

        if clause.get("match_all").is_some() {
            return Ok(Matcher::All);
        }

        if let Some(text) = clause
            .get("query_string")
            .and_then(|q| q.get("query"))
            .and_then(Value::as_str)
        {
            let terms: Vec<String> = text
                .split_whitespace()
                .filter(|term| *term != "*")
                .map(str::to_lowercase)
                .collect();
            return Ok(if terms.is_empty() {
                Matcher::All
            } else {
                Matcher::Terms(terms)
            });
        }

        Err(Error::Unsupported(format!(
            "In-memory backend cannot evaluate query clause: {}",
            clause
        )))
    }

    fn matches(&self, hit: &Hit) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Terms(terms) => {
                let haystack = match &hit.source {
                    Some(source) => format!("{} {}", hit.id, source).to_lowercase(),
                    None => hit.id.to_lowercase(),
                };
                terms.iter().any(|term| haystack.contains(term.as_str()))
            }
        }
    }
}

fn max_score(hits: &[Hit]) -> f64 {
    hits.iter().map(|h| h.score).fold(0.0, f64::max)
}
