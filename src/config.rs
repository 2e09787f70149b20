//! Configuration types
//!
//! Configuration can be written in YAML or JSON. Every section has defaults so
//! a file only needs to name what differs:
//!
//! ```yaml
//! pagination:
//!   page_size: 25
//! source:
//!   url: https://api.example.com/songs/lines
//!   items_path: $.data.lines
//!   total_path: $.data.count
//! ```

use crate::error::{Error, Result};
use crate::types::{BackoffType, PageSize, StringMap};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Controller settings
    #[serde(default)]
    pub pagination: StaplerConfig,

    /// HTTP page source settings (required for `fetch`)
    #[serde(default)]
    pub source: Option<HttpSourceConfig>,
}

impl AppConfig {
    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        if let Some(source) = &self.source {
            source.validate()?;
        }
        Ok(())
    }
}

/// Load configuration from a `.yaml`, `.yml` or `.json` file
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(Error::Io)?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => AppConfig::from_json(&contents),
        Some("yaml" | "yml") => AppConfig::from_yaml(&contents),
        _ => Err(Error::config(format!(
            "Unsupported config file extension: {}",
            path.display()
        ))),
    }
}

// ============================================================================
// Controller Config
// ============================================================================

/// Settings of a pagination controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaplerConfig {
    /// Items requested per page
    #[serde(default = "default_page_size")]
    pub page_size: PageSize,
}

impl Default for StaplerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl StaplerConfig {
    /// Create a config with the given page size
    pub fn new(page_size: u64) -> Result<Self> {
        Ok(Self {
            page_size: PageSize::new(page_size)?,
        })
    }
}

fn default_page_size() -> PageSize {
    PageSize::DEFAULT
}

// ============================================================================
// HTTP Source Config
// ============================================================================

/// Settings of an offset/limit JSON endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSourceConfig {
    /// Endpoint URL, without pagination parameters
    pub url: String,

    /// Query parameter carrying the offset
    #[serde(default = "default_offset_param")]
    pub offset_param: String,

    /// Query parameter carrying the page size
    #[serde(default = "default_limit_param")]
    pub limit_param: String,

    /// Path to the items array in the response body
    #[serde(default = "default_items_path")]
    pub items_path: String,

    /// Path to the total count in the response body
    #[serde(default = "default_total_path")]
    pub total_path: String,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: StringMap,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Transport-level retries for 429/5xx/timeouts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff between transport retries
    #[serde(default)]
    pub backoff: BackoffType,

    /// Request rate cap; unlimited if absent
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

impl HttpSourceConfig {
    /// Create a config for `url` with defaults everywhere else
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            offset_param: default_offset_param(),
            limit_param: default_limit_param(),
            items_path: default_items_path(),
            total_path: default_total_path(),
            headers: StringMap::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff: BackoffType::default(),
            requests_per_second: None,
        }
    }

    /// Validate the URL and parameter names
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::invalid_value("url", "must not be empty"));
        }
        url::Url::parse(&self.url)?;

        if self.offset_param.is_empty() {
            return Err(Error::invalid_value("offset_param", "must not be empty"));
        }
        if self.limit_param.is_empty() {
            return Err(Error::invalid_value("limit_param", "must not be empty"));
        }
        if self.requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "requests_per_second",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn default_offset_param() -> String {
    "offset".to_string()
}

fn default_limit_param() -> String {
    "limit".to_string()
}

fn default_items_path() -> String {
    "$.items".to_string()
}

fn default_total_path() -> String {
    "$.total".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}
