use async_trait::async_trait;
use elasticsearch::{
    CountParts, Elasticsearch, ScrollParts, SearchParts,
    auth::Credentials as EsCredentials,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::config::{ElasticsearchConfig, ElasticsearchCredentials};
use crate::error::{Error, Result};
use crate::provider::{Capabilities, ScrollCursor, SearchBackend};
use crate::query::Query;
use crate::types::{Hit, ResultSet, SearchOptions};

pub struct ElasticsearchBackend {
    name: String,
    config: ElasticsearchConfig,
    client: Option<Elasticsearch>,
}

impl ElasticsearchBackend {
    pub fn new(name: String, config: ElasticsearchConfig) -> Self {
        Self {
            name,
            config,
            client: None,
        }
    }

    fn client(&self) -> Result<&Elasticsearch> {
        self.client.as_ref().ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
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
        let url = self
            .config
            .url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid URL: {}", e)))?;

        let pool = SingleNodeConnectionPool::new(url);
        let mut builder = TransportBuilder::new(pool);

        if let Some(creds) = &self.config.credentials {
            builder = match creds {
                ElasticsearchCredentials::Basic { username, password } => {
                    builder.auth(EsCredentials::Basic(username.clone(), password.clone()))
                }
                ElasticsearchCredentials::ApiKey { key } => {
                    builder.auth(EsCredentials::ApiKey(key.clone(), "".to_string()))
                }
                ElasticsearchCredentials::Bearer { token } => {
                    builder.auth(EsCredentials::Bearer(token.clone()))
                }
            };
        }

        let transport = builder
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let client = Elasticsearch::new(transport);

        // Verify connection
        let response = client
            .cat()
            .health()
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Error::Connection("Health check failed".into()));
        }

        debug!(index = %self.config.index_name, "Connected to Elasticsearch");
        self.client = Some(client);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.client = None;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        let client = self.client()?;
        let response = client
            .cat()
            .health()
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(response.status_code().is_success())
    }

    async fn search(&self, query: &Query) -> Result<ResultSet> {
        self.search_with_options(query, &SearchOptions::new()).await
    }

    async fn search_with_options(
        &self,
        query: &Query,
        options: &SearchOptions,
    ) -> Result<ResultSet> {
        let client = self.client()?;
        let params = RequestOptions::parse(options)?;

        let mut request = client
            .search(SearchParts::Index(&[&self.config.index_name]))
            .body(query.to_value());
        if !params.routing.is_empty() {
            request = request.routing(&params.routing);
        }
        if let Some(preference) = params.preference {
            request = request.preference(preference);
        }
        if let Some(request_cache) = params.request_cache {
            request = request.request_cache(request_cache);
        }
        if let Some(timeout) = params.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Backend(e.to_string()))?;

        let body = read_body(response, "Search").await?;
        parse_result_set(&body)
    }

    async fn count(&self, query: &Query) -> Result<u64> {
        let client = self.client()?;

        // _count only accepts the query clause
        let mut body = Map::new();
        if let Some(clause) = query.clause() {
            body.insert("query".to_owned(), clause.clone());
        }

        let response = client
            .count(CountParts::Index(&[&self.config.index_name]))
            .body(Value::Object(body))
            .send()
            .await
            .map_err(|e| Error::Backend(e.to_string()))?;

        let body = read_body(response, "Count").await?;
        body["count"]
            .as_u64()
            .ok_or_else(|| Error::InvalidResponse("Missing count".into()))
    }

    async fn open_scroll(&self, query: &Query, expiry: &str) -> Result<Box<dyn ScrollCursor>> {
        let client = self.client()?.clone();
        debug!(index = %self.config.index_name, expiry, "Opening scroll");

        Ok(Box::new(ElasticsearchScroll {
            client,
            index_name: self.config.index_name.clone(),
            body: query.to_value(),
            expiry: expiry.to_owned(),
            scroll_id: None,
            exhausted: false,
        }))
    }
}

/// Scroll session; the first advance runs the initial search
struct ElasticsearchScroll {
    client: Elasticsearch,
    index_name: String,
    body: Value,
    expiry: String,
    scroll_id: Option<String>,
    exhausted: bool,
}

#[async_trait]
impl ScrollCursor for ElasticsearchScroll {
    async fn advance(&mut self) -> Result<ResultSet> {
        if self.exhausted {
            return Err(Error::EndOfScroll);
        }

        let response = match &self.scroll_id {
            None => self
                .client
                .search(SearchParts::Index(&[&self.index_name]))
                .scroll(&self.expiry)
                .body(self.body.clone())
                .send()
                .await
                .map_err(|e| Error::Backend(e.to_string()))?,
            Some(scroll_id) => self
                .client
                .scroll(ScrollParts::None)
                .body(json!({
                    "scroll": self.expiry,
                    "scroll_id": scroll_id,
                }))
                .send()
                .await
                .map_err(|e| Error::Backend(e.to_string()))?,
        };

        let body = read_body(response, "Scroll").await?;
        let scroll_id = body["_scroll_id"]
            .as_str()
            .ok_or_else(|| Error::InvalidResponse("Missing _scroll_id".into()))?;
        self.scroll_id = Some(scroll_id.to_owned());

        let results = parse_result_set(&body)?;
        if results.is_empty() {
            self.exhausted = true;
        }
        debug!(hits = results.len(), "Advanced scroll");
        Ok(results)
    }
}

/// Search options mapped onto `_search` URL parameters
#[derive(Debug, Default, PartialEq)]
struct RequestOptions<'a> {
    routing: Vec<&'a str>,
    preference: Option<&'a str>,
    request_cache: Option<bool>,
    timeout: Option<&'a str>,
}

impl<'a> RequestOptions<'a> {
    fn parse(options: &'a SearchOptions) -> Result<Self> {
        let mut parsed = Self::default();
        for (name, value) in options {
            match (name.as_str(), value) {
                ("routing", Value::String(routing)) => {
                    parsed.routing = routing.split(',').map(str::trim).collect();
                }
                ("routing", Value::Array(values)) => {
                    parsed.routing = values.iter().filter_map(Value::as_str).collect();
                }
                ("preference", Value::String(preference)) => {
                    parsed.preference = Some(preference.as_str());
                }
                ("request_cache", Value::Bool(request_cache)) => {
                    parsed.request_cache = Some(*request_cache);
                }
                ("timeout", Value::String(timeout)) => parsed.timeout = Some(timeout.as_str()),
                _ => {
                    return Err(Error::Unsupported(format!(
                        "Unsupported search option '{}': {}",
                        name, value
                    )));
                }
            }
        }
        Ok(parsed)
    }
}

async fn read_body(response: Response, action: &str) -> Result<Value> {
    if !response.status_code().is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(Error::Backend(format!("{} failed: {}", action, error_body)));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| Error::InvalidResponse(e.to_string()))
}

fn parse_result_set(body: &Value) -> Result<ResultSet> {
    let took_ms = body["took"].as_u64();
    // 7.x+ reports {"value": n, "relation": ..}, older versions a bare number
    let total_hits = body["hits"]["total"]["value"]
        .as_u64()
        .or_else(|| body["hits"]["total"].as_u64())
        .unwrap_or(0);
    let max_score = body["hits"]["max_score"].as_f64().unwrap_or(0.0);

    let hits = body["hits"]["hits"]
        .as_array()
        .ok_or_else(|| Error::InvalidResponse("Missing hits array".into()))?;

    let hits: Vec<Hit> = hits
        .iter()
        .filter_map(|hit| {
            let id = hit["_id"].as_str()?.to_string();
            Some(Hit {
                id,
                index: hit["_index"].as_str().map(str::to_owned),
                score: hit["_score"].as_f64().unwrap_or(0.0),
                source: hit.get("_source").cloned(),
            })
        })
        .collect();

    let aggregations = body["aggregations"].as_object().cloned().unwrap_or_default();
    let suggests = body["suggest"].as_object().cloned().unwrap_or_default();

    let mut results = ResultSet::new(hits, total_hits)
        .with_aggregations(aggregations)
        .with_suggests(suggests)
        .with_max_score(max_score);
    if let Some(took) = took_ms {
        results = results.with_took(took);
    }
    Ok(results)
}
