//! HTTP transport module
//!
//! Provides an HTTP-backed `PageSource` plus the client it runs on.
//!
//! # Features
//!
//! - **Offset/limit endpoints**: `HttpPageSource` maps page requests to query
//!   parameters and extracts items and total from the JSON body
//! - **Automatic Retries**: Configurable transport retries with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor

mod client;
mod rate_limit;
mod source;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use source::{extract_path, HttpPageSource};
