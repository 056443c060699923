use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Aggregations, Hit, Suggests};

/// Top-level configuration for hitpage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend configuration
    pub backend: BackendConfig,
    /// Options handed to every paginator adapter
    #[serde(default)]
    pub paginator: PaginatorOptions,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn from_str(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}

/// Top-level backend configuration (shared name + backend-specific config)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Display name for this backend instance
    pub name: String,
    /// Backend-specific configuration
    #[serde(flatten)]
    pub backend: BackendKind,
}

/// Backend-specific configuration, discriminated by `type` field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendKind {
    Memory(MemoryConfig),
    #[cfg(feature = "elasticsearch")]
    Elasticsearch(ElasticsearchConfig),
}

/// In-process backend seeded from inline documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Pre-ranked hits, best first
    #[serde(default)]
    pub documents: Vec<Hit>,
    /// Aggregations reported with every response
    #[serde(default)]
    pub aggregations: Aggregations,
    /// Suggestions reported with every response
    #[serde(default)]
    pub suggests: Suggests,
}

/// Elasticsearch backend configuration
#[cfg(feature = "elasticsearch")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    pub url: String,
    #[serde(default)]
    pub credentials: Option<ElasticsearchCredentials>,
    pub index_name: String,
}

#[cfg(feature = "elasticsearch")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElasticsearchCredentials {
    Basic { username: String, password: String },
    ApiKey { key: String },
    Bearer { token: String },
}

/// When a scroll adapter refreshes its memoized metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollMetadata {
    /// Overwrite total/aggregations/suggests/max score with every page fetched
    #[default]
    EveryPage,
    /// Keep the values reported with the first page
    FirstPage,
}

/// Options recognized by paginator adapters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatorOptions {
    /// Scroll session lifetime as a backend time value (e.g. "1m", "30s")
    #[serde(default = "default_expiry_time", alias = "expiryTime")]
    pub expiry_time: String,
    /// Metadata refresh policy for scroll adapters
    #[serde(default)]
    pub scroll_metadata: ScrollMetadata,
}

fn default_expiry_time() -> String {
    "1m".to_string()
}

impl Default for PaginatorOptions {
    fn default() -> Self {
        Self {
            expiry_time: default_expiry_time(),
            scroll_metadata: ScrollMetadata::default(),
        }
    }
}

impl PaginatorOptions {
    pub fn with_expiry_time(mut self, expiry_time: impl Into<String>) -> Self {
        self.expiry_time = expiry_time.into();
        self
    }

    pub fn with_scroll_metadata(mut self, policy: ScrollMetadata) -> Self {
        self.scroll_metadata = policy;
        self
    }

    /// Scroll expiry as a duration
    pub fn expiry(&self) -> Result<Duration> {
        parse_time_value(&self.expiry_time)
    }
}

/// Parse a backend time value such as `1m`, `30s` or `500ms`
pub fn parse_time_value(value: &str) -> Result<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| Error::Config(format!("Missing time unit in '{}'", value)))?;
    let (amount, unit) = value.split_at(split);

    let amount: u64 = amount
        .parse()
        .map_err(|_| Error::Config(format!("Invalid time value: '{}'", value)))?;

    let seconds = |factor: u64| {
        amount
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(|| Error::Config(format!("Time value out of range: '{}'", value)))
    };

    let duration = match unit {
        "d" => seconds(86_400)?,
        "h" => seconds(3_600)?,
        "m" => seconds(60)?,
        "s" => Duration::from_secs(amount),
        "ms" => Duration::from_millis(amount),
        "micros" => Duration::from_micros(amount),
        "nanos" => Duration::from_nanos(amount),
        _ => {
            return Err(Error::Config(format!(
                "Unknown time unit '{}' in '{}'. Supported: d, h, m, s, ms, micros, nanos",
                unit, value
            )));
        }
    };

    if duration.is_zero() {
        return Err(Error::Config(format!(
            "Time value must be positive: '{}'",
            value
        )));
    }

    Ok(duration)
}
