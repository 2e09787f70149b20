//! Page source trait

use crate::types::{Page, PageRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Asynchronous producer of pages
///
/// Implementations must be safe to call repeatedly with the same request; the
/// controller may issue overlapping first-page fetches. A returned page should
/// hold at most `request.size` items.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    /// Item type of the paginated list
    type Item: Send + Sync + 'static;

    /// Error reported for a failed fetch
    type Error: Send + Sync + 'static;

    /// Fetch the page described by `request`
    async fn fetch(&self, request: PageRequest) -> Result<Page<Self::Item>, Self::Error>;
}

#[async_trait]
impl<S: PageSource> PageSource for Arc<S> {
    type Item = S::Item;
    type Error = S::Error;

    async fn fetch(&self, request: PageRequest) -> Result<Page<Self::Item>, Self::Error> {
        (**self).fetch(request).await
    }
}
