//! Common types used throughout Stapler
//!
//! This module contains the page request/response contract shared by the
//! controller and every `PageSource`, plus small utility types.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU64;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

// ============================================================================
// Page Size
// ============================================================================

/// Number of items requested per page
///
/// Always positive; fixed for the lifetime of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PageSize(NonZeroU64);

impl PageSize {
    /// Page size used when none is configured
    pub const DEFAULT: PageSize = match NonZeroU64::new(20) {
        Some(size) => PageSize(size),
        None => panic!("default page size must be non-zero"),
    };

    /// Create a page size, rejecting zero
    pub fn new(size: u64) -> Result<Self> {
        NonZeroU64::new(size)
            .map(Self)
            .ok_or_else(|| Error::invalid_value("page_size", "must be greater than zero"))
    }

    /// Get the raw value
    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Offset of the first item of the page following `pages` loaded pages
    pub fn offset_after(self, pages: u64) -> u64 {
        pages.saturating_mul(self.get())
    }
}

impl TryFrom<u64> for PageSize {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PageSize> for u64 {
    fn from(size: PageSize) -> Self {
        size.get()
    }
}

impl From<NonZeroU64> for PageSize {
    fn from(size: NonZeroU64) -> Self {
        Self(size)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Page Request
// ============================================================================

/// Parameters of a single fetch: zero-based offset and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    /// Index of the first item to fetch
    pub offset: u64,
    /// Maximum number of items to return
    pub size: u64,
}

impl PageRequest {
    /// Create a new page request
    pub fn new(offset: u64, size: PageSize) -> Self {
        Self {
            offset,
            size: size.get(),
        }
    }

    /// Request for the first page
    pub fn first(size: PageSize) -> Self {
        Self::new(0, size)
    }

    /// Exclusive end index of the requested range
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset={} size={}", self.offset, self.size)
    }
}

// ============================================================================
// Page
// ============================================================================

/// One batch of items returned by a `PageSource`
///
/// `total` is the server's count of all items at the time of the fetch and
/// may differ between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items of this page, in server order
    pub items: Vec<T>,
    /// Total number of items known to the server
    pub total: u64,
}

impl<T> Page<T> {
    /// Create a new page
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }

    /// Create an empty page for an empty collection
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    /// Number of items in this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if this page has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transform the items while keeping the total
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for transport retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}
