#[cfg(feature = "elasticsearch")]
pub mod elastic;

pub mod memory;

// re-export backend types when features are enabled
#[cfg(feature = "elasticsearch")]
pub use elastic::ElasticsearchBackend;

pub use memory::{CallCounts, MemoryBackend};

use crate::config::{BackendConfig, BackendKind};
use crate::provider::SearchBackend;

/// Build the backend described by the configuration (not yet connected)
pub fn create_backend(config: &BackendConfig) -> Box<dyn SearchBackend> {
    match &config.backend {
        BackendKind::Memory(memory) => Box::new(MemoryBackend::from_config(&config.name, memory)),

        #[cfg(feature = "elasticsearch")]
        BackendKind::Elasticsearch(elastic) => Box::new(ElasticsearchBackend::new(
            config.name.clone(),
            elastic.clone(),
        )),
    }
}
