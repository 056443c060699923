use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Hit, HybridResult};

/// Maps raw hits to domain objects
#[async_trait]
pub trait ResultTransformer: Send + Sync {
    type Object: Send;

    /// Map hits to objects, in hit order
    async fn transform(&self, hits: &[Hit]) -> Result<Vec<Self::Object>>;

    /// Pair each hit with its object; hits without an object are dropped
    async fn hybrid_transform(&self, hits: &[Hit]) -> Result<Vec<HybridResult<Self::Object>>>;
}

/// Loads domain objects by hit identifier (typically from a persistence layer)
#[async_trait]
pub trait ObjectLookup: Send + Sync {
    type Object: Send;

    /// Identifiers without an object are absent from the returned map
    async fn find_by_ids(&self, ids: &[String]) -> Result<HashMap<String, Self::Object>>;
}

#[async_trait]
impl<O> ObjectLookup for HashMap<String, O>
where
    O: Clone + Send + Sync,
{
    type Object = O;

    async fn find_by_ids(&self, ids: &[String]) -> Result<HashMap<String, O>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.get(id).map(|object| (id.clone(), object.clone())))
            .collect())
    }
}

/// Transformer hydrating objects through an [`ObjectLookup`] in one batch per page
pub struct LookupTransformer<L> {
    lookup: L,
    ignore_missing: bool,
}

impl<L: ObjectLookup> LookupTransformer<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            ignore_missing: false,
        }
    }

    /// Drop hits whose object cannot be found instead of failing `transform`
    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = ignore;
        self
    }

    async fn lookup(&self, hits: &[Hit]) -> Result<HashMap<String, L::Object>> {
        let ids: Vec<String> = hits.iter().map(|hit| hit.id.clone()).collect();
        self.lookup.find_by_ids(&ids).await
    }
}

#[async_trait]
impl<L: ObjectLookup> ResultTransformer for LookupTransformer<L> {
    type Object = L::Object;

    async fn transform(&self, hits: &[Hit]) -> Result<Vec<L::Object>> {
        let mut objects = self.lookup(hits).await?;
        let mut transformed = Vec::with_capacity(hits.len());

        for hit in hits {
            match objects.remove(&hit.id) {
                Some(object) => transformed.push(object),
                None if self.ignore_missing => {
                    debug!(id = %hit.id, "Skipping hit without object");
                }
                None => {
                    return Err(Error::Transform(format!(
                        "Cannot find corresponding object for hit '{}'",
                        hit.id
                    )));
                }
            }
        }

        Ok(transformed)
    }

    async fn hybrid_transform(&self, hits: &[Hit]) -> Result<Vec<HybridResult<L::Object>>> {
        let mut objects = self.lookup(hits).await?;

        Ok(hits
            .iter()
            .filter_map(|hit| {
                let object = objects.remove(&hit.id)?;
                Some(HybridResult::new(hit.clone(), object))
            })
            .collect())
    }
}
