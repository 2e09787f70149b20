//! Built-in page sources

use super::types::PageSource;
use crate::types::{Page, PageRequest};
use async_trait::async_trait;
use std::convert::Infallible;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::trace;

// ============================================================================
// Closure Source
// ============================================================================

/// Page source backed by an async closure
///
/// ```rust,ignore
/// let source = FnSource::new(|request: PageRequest| async move {
///     api.items(request.offset, request.size).await
/// });
/// ```
pub struct FnSource<F, T, E> {
    fetch: F,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<F, Fut, T, E> FnSource<F, T, E>
where
    F: Fn(PageRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<T>, E>> + Send + 'static,
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Wrap a closure
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, T, E> PageSource for FnSource<F, T, E>
where
    F: Fn(PageRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<T>, E>> + Send + 'static,
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    type Item = T;
    type Error = E;

    async fn fetch(&self, request: PageRequest) -> Result<Page<T>, E> {
        (self.fetch)(request).await
    }
}

impl<F, T, E> std::fmt::Debug for FnSource<F, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSource").finish_non_exhaustive()
    }
}

// ============================================================================
// In-Memory Source
// ============================================================================

/// Page source serving slices of an in-memory list
///
/// The backing list can be replaced at any time to mimic a server whose
/// contents change between fetches.
#[derive(Debug, Clone)]
pub struct MemorySource<T> {
    items: Arc<RwLock<Vec<T>>>,
    latency: Option<Duration>,
}

impl<T: Clone + Send + Sync + 'static> MemorySource<T> {
    /// Create a source serving `items` without delay
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
            latency: None,
        }
    }

    /// Delay every fetch by `latency`
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replace the backing list
    pub async fn set_items(&self, items: Vec<T>) {
        *self.items.write().await = items;
    }

    /// Number of items currently served
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Check if the backing list is empty
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> PageSource for MemorySource<T> {
    type Item = T;
    type Error = Infallible;

    async fn fetch(&self, request: PageRequest) -> Result<Page<T>, Infallible> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let items = self.items.read().await;
        let total = items.len();
        let start = usize::try_from(request.offset).unwrap_or(usize::MAX).min(total);
        let end = usize::try_from(request.end()).unwrap_or(usize::MAX).min(total);

        trace!(%request, total, "Serving in-memory page");
        Ok(Page::new(items[start..end].to_vec(), total as u64))
    }
}
