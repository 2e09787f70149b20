//! Pagination controller module
//!
//! `Stapler` owns the accumulated items of a paginated list and decides, for
//! every "load next page" trigger, whether a fetch actually happens.
//!
//! # Overview
//!
//! - `initial_load` / `refresh` fetch page one and replace everything loaded so
//!   far. They share one routine but report through separate actions so a UI
//!   can show different spinners. Overlapping calls are not serialized: the
//!   fetch that completes last determines the final state.
//! - `load_next_page_if_needed` is safe to call on every scroll tick. It starts a
//!   fetch only when no refresh and no other next-page fetch is running and the
//!   server reported more items than the loaded pages cover.
//!
//! All counters live in one `Ledger` behind a mutex. The next-page guard is
//! checked and claimed under that mutex, and every completion mutates items,
//! total and pages and publishes them before the mutex is released.

mod types;

pub use types::{NextPageOutcome, SkipReason, Snapshot};

use crate::action::{Action, ActionKind};
use crate::config::StaplerConfig;
use crate::error::{Error, Result};
use crate::observable::{Property, Signal};
use crate::source::PageSource;
use crate::types::{Page, PageRequest, PageSize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use types::Ledger;

/// Result of a first-page load
pub type LoadResult<E> = std::result::Result<(), Arc<E>>;

// ============================================================================
// Controller
// ============================================================================

/// Incremental loader for a server-backed paginated list
///
/// Cloning a `Stapler` yields another handle to the same controller.
pub struct Stapler<S: PageSource> {
    shared: Arc<Shared<S>>,
    runtime: Handle,
}

struct Shared<S: PageSource> {
    source: S,
    page_size: PageSize,
    ledger: Mutex<Ledger<S::Item>>,
    items: Property<Arc<Vec<S::Item>>>,
    pages: Property<u64>,
    total: Property<u64>,
    more_available: Property<bool>,
    initial_load: Action<S::Error>,
    refresh: Action<S::Error>,
    next_page: Action<S::Error>,
}

impl<S> Stapler<S>
where
    S: PageSource,
    S::Item: Clone,
{
    /// Create a controller on the current tokio runtime
    pub fn new(page_size: PageSize, source: S) -> Result<Self> {
        Self::builder(source).page_size(page_size).build()
    }

    /// Create a controller from configuration
    pub fn from_config(config: &StaplerConfig, source: S) -> Result<Self> {
        Self::builder(source).page_size(config.page_size).build()
    }

    /// Start building a controller around `source`
    pub fn builder(source: S) -> StaplerBuilder<S> {
        StaplerBuilder::new(source)
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Load page one, replacing any previously loaded items
    ///
    /// Intended for the first load of a screen. Reports through
    /// `initial_load_action`.
    pub async fn initial_load(&self) -> LoadResult<S::Error> {
        self.shared.load_first_page(ActionKind::InitialLoad).await
    }

    /// Reload page one, discarding every page loaded so far
    ///
    /// Reports through `refresh_action`. While a refresh runs, next-page
    /// triggers are ignored.
    pub async fn refresh(&self) -> LoadResult<S::Error> {
        self.shared.load_first_page(ActionKind::Refresh).await
    }

    /// Run `initial_load` in the background
    pub fn start_initial_load(&self) -> JoinHandle<LoadResult<S::Error>> {
        self.spawn_first_page(ActionKind::InitialLoad)
    }

    /// Run `refresh` in the background
    pub fn start_refresh(&self) -> JoinHandle<LoadResult<S::Error>> {
        self.spawn_first_page(ActionKind::Refresh)
    }

    /// Start loading the next page if one is due
    ///
    /// Returns `true` if a fetch was started. Calling this repeatedly while a
    /// page is loading, while a refresh runs, or after the last page is a
    /// no-op. Failures are reported on `next_page_errors`.
    pub fn load_next_page_if_needed(&self) -> bool {
        match self.shared.claim_next_page() {
            Ok(claim) => {
                let shared = self.shared.clone();
                self.runtime.spawn(async move {
                    shared.run_next_page(claim).await;
                });
                true
            }
            Err(reason) => {
                trace!("Next page trigger ignored: {}", reason);
                false
            }
        }
    }

    /// Load the next page if one is due and wait for the result
    ///
    /// Same guard as `load_next_page_if_needed`.
    pub async fn load_next_page(&self) -> NextPageOutcome<S::Error> {
        match self.shared.claim_next_page() {
            Ok(claim) => self.shared.run_next_page(claim).await,
            Err(reason) => {
                trace!("Next page attempt skipped: {}", reason);
                NextPageOutcome::Skipped(reason)
            }
        }
    }

    fn spawn_first_page(&self, kind: ActionKind) -> JoinHandle<LoadResult<S::Error>> {
        let shared = self.shared.clone();
        self.runtime
            .spawn(async move { shared.load_first_page(kind).await })
    }
}

impl<S: PageSource> Stapler<S> {
    // ------------------------------------------------------------------------
    // Observables
    // ------------------------------------------------------------------------

    /// Items loaded so far
    pub fn items(&self) -> &Property<Arc<Vec<S::Item>>> {
        &self.shared.items
    }

    /// Number of pages loaded; 0 until the first successful load
    pub fn pages(&self) -> &Property<u64> {
        &self.shared.pages
    }

    /// Total item count reported by the server on the latest fetch
    pub fn total(&self) -> &Property<u64> {
        &self.shared.total
    }

    /// Whether more pages exist beyond those loaded
    ///
    /// This reports availability, not activity: combine it with
    /// `next_page_action().is_executing()` for a true loading spinner.
    pub fn should_show_next_page_activity_indicator(&self) -> &Property<bool> {
        &self.shared.more_available
    }

    /// Failures of pages after the first
    pub fn next_page_errors(&self) -> &Signal<Arc<S::Error>> {
        self.shared.next_page.errors()
    }

    /// Status of `initial_load`
    pub fn initial_load_action(&self) -> &Action<S::Error> {
        &self.shared.initial_load
    }

    /// Status of `refresh`
    pub fn refresh_action(&self) -> &Action<S::Error> {
        &self.shared.refresh
    }

    /// Status of next-page loads
    pub fn next_page_action(&self) -> &Action<S::Error> {
        &self.shared.next_page
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Consistent (items, pages, total) triple
    pub fn snapshot(&self) -> Snapshot<S::Item> {
        self.shared.ledger().snapshot()
    }

    /// Items requested per page
    pub fn page_size(&self) -> PageSize {
        self.shared.page_size
    }

    /// Offset the next next-page fetch will request
    pub fn next_offset(&self) -> u64 {
        let pages = self.shared.ledger().pages;
        self.shared.page_size.offset_after(pages)
    }

    /// The page source this controller fetches from
    pub fn source(&self) -> &S {
        &self.shared.source
    }
}

impl<S: PageSource> Clone for Stapler<S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<S: PageSource> std::fmt::Debug for Stapler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ledger = self.shared.ledger();
        f.debug_struct("Stapler")
            .field("page_size", &self.shared.page_size)
            .field("pages", &ledger.pages)
            .field("total", &ledger.total)
            .field("items", &ledger.items.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Shared State
// ============================================================================

/// Raised in-flight slot; released when dropped, including on cancellation
struct InFlight<S: PageSource> {
    shared: Arc<Shared<S>>,
    kind: ActionKind,
}

impl<S: PageSource> Drop for InFlight<S> {
    fn drop(&mut self) {
        let mut ledger = self.shared.ledger();
        ledger.finish(self.kind);
        self.shared
            .action(self.kind)
            .publish_in_flight(ledger.in_flight(self.kind));
    }
}

/// A next-page slot that passed the guard
struct NextPageClaim<S: PageSource> {
    request: PageRequest,
    _in_flight: InFlight<S>,
}

impl<S> Shared<S>
where
    S: PageSource,
    S::Item: Clone,
{
    async fn load_first_page(self: &Arc<Self>, kind: ActionKind) -> LoadResult<S::Error> {
        let _in_flight = self.begin(kind);
        let request = PageRequest::first(self.page_size);
        debug!("Fetching first page ({}): {}", kind, request);

        match self.source.fetch(request).await {
            Ok(page) => {
                let page = self.conform(page, request);
                let count = page.items.len();
                let total = page.total;

                let mut ledger = self.ledger();
                ledger.items = Arc::new(page.items);
                ledger.pages = 1;
                ledger.total = total;
                self.publish(&ledger);
                drop(ledger);

                info!("First page loaded ({}): {} items, total {}", kind, count, total);
                self.action(kind).succeeded();
                Ok(())
            }
            Err(error) => {
                warn!("First page load failed ({})", kind);
                let error = Arc::new(error);
                self.action(kind).failed(error.clone());
                Err(error)
            }
        }
    }

    fn claim_next_page(self: &Arc<Self>) -> std::result::Result<NextPageClaim<S>, SkipReason> {
        let mut ledger = self.ledger();
        let request = ledger.claim_next_page(self.page_size)?;
        self.next_page.publish_in_flight(1);
        drop(ledger);

        Ok(NextPageClaim {
            request,
            _in_flight: InFlight {
                shared: self.clone(),
                kind: ActionKind::NextPage,
            },
        })
    }

    async fn run_next_page(&self, claim: NextPageClaim<S>) -> NextPageOutcome<S::Error> {
        let request = claim.request;
        debug!("Fetching next page: {}", request);

        let outcome = match self.source.fetch(request).await {
            Ok(page) => {
                let page = self.conform(page, request);
                let count = page.items.len();
                let total = page.total;

                let mut ledger = self.ledger();
                Arc::make_mut(&mut ledger.items).extend(page.items);
                ledger.total = total;
                ledger.pages += 1;
                self.publish(&ledger);
                let pages = ledger.pages;
                drop(ledger);

                info!(
                    "Page {} loaded: {} items at offset {}, total {}",
                    pages, count, request.offset, total
                );
                self.next_page.succeeded();
                NextPageOutcome::Loaded {
                    offset: request.offset,
                    count,
                }
            }
            Err(error) => {
                warn!("Next page load failed at offset {}", request.offset);
                let error = Arc::new(error);
                self.next_page.failed(error.clone());
                NextPageOutcome::Failed(error)
            }
        };

        drop(claim);
        outcome
    }

    fn begin(self: &Arc<Self>, kind: ActionKind) -> InFlight<S> {
        let mut ledger = self.ledger();
        ledger.begin(kind);
        self.action(kind).publish_in_flight(ledger.in_flight(kind));
        drop(ledger);

        InFlight {
            shared: self.clone(),
            kind,
        }
    }

    /// Drop items beyond the requested size so `pages * page_size` stays the next offset
    fn conform(&self, mut page: Page<S::Item>, request: PageRequest) -> Page<S::Item> {
        let limit = usize::try_from(request.size).unwrap_or(usize::MAX);
        if page.items.len() > limit {
            warn!(
                "Page source returned {} items for {}, keeping the first {}",
                page.items.len(),
                request,
                limit
            );
            page.items.truncate(limit);
        }
        page
    }
}

impl<S: PageSource> Shared<S> {
    fn ledger(&self) -> MutexGuard<'_, Ledger<S::Item>> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn action(&self, kind: ActionKind) -> &Action<S::Error> {
        match kind {
            ActionKind::InitialLoad => &self.initial_load,
            ActionKind::Refresh => &self.refresh,
            ActionKind::NextPage => &self.next_page,
        }
    }

    /// Push ledger values to observers; called with the ledger lock held
    fn publish(&self, ledger: &Ledger<S::Item>) {
        self.items.set(ledger.items.clone());
        self.total.set_if_changed(ledger.total);
        self.pages.set_if_changed(ledger.pages);
        self.more_available
            .set_if_changed(self.page_size.offset_after(ledger.pages) < ledger.total);
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for `Stapler`
pub struct StaplerBuilder<S> {
    source: S,
    page_size: Option<PageSize>,
    runtime: Option<Handle>,
}

impl<S> StaplerBuilder<S>
where
    S: PageSource,
    S::Item: Clone,
{
    fn new(source: S) -> Self {
        Self {
            source,
            page_size: None,
            runtime: None,
        }
    }

    /// Set the page size
    #[must_use]
    pub fn page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Run background loads on `runtime` instead of the current one
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the controller
    ///
    /// Fails if no runtime was given and none is current.
    pub fn build(self) -> Result<Stapler<S>> {
        let page_size = self.page_size.unwrap_or(PageSize::DEFAULT);
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| Error::NoRuntime)?,
        };

        debug!("Creating pagination controller with page size {}", page_size);

        let shared = Shared {
            source: self.source,
            page_size,
            ledger: Mutex::new(Ledger::new()),
            items: Property::new(Arc::new(Vec::new())),
            pages: Property::new(0),
            total: Property::new(0),
            more_available: Property::new(false),
            initial_load: Action::new(ActionKind::InitialLoad),
            refresh: Action::new(ActionKind::Refresh),
            next_page: Action::new(ActionKind::NextPage),
        };

        Ok(Stapler {
            shared: Arc::new(shared),
            runtime,
        })
    }
}

#[cfg(test)]
mod tests;
