//! Page source for offset/limit JSON endpoints
//!
//! Issues `GET {url}?{offset_param}={offset}&{limit_param}={size}` and reads the
//! page out of the JSON body:
//!
//! ```json
//! { "items": [ ... ], "total": 23 }
//! ```
//!
//! Both locations are configurable as dotted paths (`$.data.lines`). The path
//! `$` addresses the body itself.

use super::client::{HttpClient, HttpClientConfig, RequestConfig};
use crate::config::HttpSourceConfig;
use crate::error::{Error, Result};
use crate::source::PageSource;
use crate::types::{JsonValue, Page, PageRequest};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::debug;

/// Page source fetching pages of `T` over HTTP
pub struct HttpPageSource<T> {
    client: HttpClient,
    config: HttpSourceConfig,
    _item: PhantomData<fn() -> T>,
}

impl<T> HttpPageSource<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Create a source from configuration
    pub fn new(config: HttpSourceConfig) -> Result<Self> {
        config.validate()?;
        let client = HttpClient::with_config(HttpClientConfig::from_source(&config))?;
        Ok(Self::with_client(client, config))
    }

    /// Create a source using an existing client
    pub fn with_client(client: HttpClient, config: HttpSourceConfig) -> Self {
        Self {
            client,
            config,
            _item: PhantomData,
        }
    }

    /// The endpoint configuration
    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    fn parse_page(&self, body: &JsonValue) -> Result<Page<T>> {
        let items = match extract_path(body, &self.config.items_path) {
            Some(JsonValue::Array(items)) => items.clone(),
            Some(_) => {
                return Err(Error::extraction(
                    &self.config.items_path,
                    "value is not an array",
                ))
            }
            None => return Err(Error::extraction(&self.config.items_path, "path not found")),
        };

        let total = extract_path(body, &self.config.total_path)
            .and_then(as_count)
            .ok_or_else(|| {
                Error::extraction(&self.config.total_path, "missing or not a non-negative integer")
            })?;

        let items = items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<T>, _>>()?;

        Ok(Page::new(items, total))
    }
}

#[async_trait]
impl<T> PageSource for HttpPageSource<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Item = T;
    type Error = Error;

    async fn fetch(&self, request: PageRequest) -> Result<Page<T>> {
        let query = RequestConfig::new()
            .query(&self.config.offset_param, request.offset.to_string())
            .query(&self.config.limit_param, request.size.to_string());

        debug!("Fetching {} from {}", request, self.config.url);
        let body: JsonValue = self.client.get_json(&self.config.url, query).await?;
        self.parse_page(&body)
    }
}

impl<T> std::fmt::Debug for HttpPageSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPageSource")
            .field("url", &self.config.url)
            .field("client", &self.client)
            .finish()
    }
}

/// Resolve a dotted path (`$.a.b`) inside a JSON value
pub fn extract_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = path.strip_prefix('$').unwrap_or(path);
    let path = path.strip_prefix('.').unwrap_or(path);
    if path.is_empty() {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, part| match current {
        JsonValue::Object(map) => map.get(part),
        JsonValue::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Read a count given as a JSON number or numeric string
fn as_count(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
