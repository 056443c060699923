pub mod config;
pub mod error;
pub mod finder;
pub mod pager;
pub mod paginator;
pub mod provider;
pub mod providers;
pub mod query;
pub mod transformer;
pub mod types;

// re-exports
pub use config::{Config, PaginatorOptions, ScrollMetadata};
pub use error::{Error, Result};
pub use finder::Finder;
pub use pager::Pager;
pub use paginator::{
    HybridPaginatorAdapter, PaginatorAdapter, PartialResults, RawPaginatorAdapter,
    RawScrollPaginatorAdapter, ScrollCursorController, TransformedPaginatorAdapter,
    TransformedScrollPaginatorAdapter,
};
pub use provider::{Capabilities, ScrollCursor, SearchBackend};
pub use query::{Query, QueryInput};
pub use transformer::{LookupTransformer, ObjectLookup, ResultTransformer};
pub use types::{Aggregations, Hit, HybridResult, ResultSet, SearchOptions, Suggests};
