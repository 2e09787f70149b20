//! Controller state and outcome types

use crate::action::ActionKind;
use crate::types::{PageRequest, PageSize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Snapshot
// ============================================================================

/// Consistent view of the accumulated list at one instant
#[derive(Debug)]
pub struct Snapshot<T> {
    /// Items loaded so far, in server order
    pub items: Arc<Vec<T>>,
    /// Number of pages loaded
    pub pages: u64,
    /// Total reported by the most recent successful fetch
    pub total: u64,
}

impl<T> Snapshot<T> {
    /// Whether the server reports items beyond the loaded pages
    pub fn has_more(&self, page_size: PageSize) -> bool {
        page_size.offset_after(self.pages) < self.total
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            pages: self.pages,
            total: self.total,
        }
    }
}

// ============================================================================
// Next Page Outcome
// ============================================================================

/// Why a next-page trigger did not start a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A refresh is running; its result will reset the page count
    RefreshInFlight,
    /// Another next-page fetch is already running
    NextPageInFlight,
    /// Every page the server reported has been loaded
    Exhausted,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::RefreshInFlight => "refresh in flight",
            Self::NextPageInFlight => "next page already in flight",
            Self::Exhausted => "no pages left",
        };
        f.write_str(reason)
    }
}

/// Result of an awaited next-page attempt
#[derive(Debug)]
pub enum NextPageOutcome<E> {
    /// A page was fetched and appended
    Loaded {
        /// Offset the page was fetched from
        offset: u64,
        /// Number of items appended
        count: usize,
    },
    /// The guard rejected the attempt; nothing was fetched
    Skipped(SkipReason),
    /// The fetch failed; state is unchanged
    Failed(Arc<E>),
}

impl<E> NextPageOutcome<E> {
    /// Check if a page was appended
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// Check if the attempt was a no-op
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// Check if the fetch failed
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Skip reason, if the attempt was skipped
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Authoritative controller state, only touched under the controller lock
#[derive(Debug)]
pub(crate) struct Ledger<T> {
    pub items: Arc<Vec<T>>,
    pub pages: u64,
    pub total: u64,
    pub initial_loads: usize,
    pub refreshes: usize,
    pub next_page: bool,
}

impl<T> Ledger<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            pages: 0,
            total: 0,
            initial_loads: 0,
            refreshes: 0,
            next_page: false,
        }
    }

    /// Number of fetches in flight for `kind`
    pub fn in_flight(&self, kind: ActionKind) -> usize {
        match kind {
            ActionKind::InitialLoad => self.initial_loads,
            ActionKind::Refresh => self.refreshes,
            ActionKind::NextPage => usize::from(self.next_page),
        }
    }

    pub fn begin(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::InitialLoad => self.initial_loads += 1,
            ActionKind::Refresh => self.refreshes += 1,
            ActionKind::NextPage => self.next_page = true,
        }
    }

    pub fn finish(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::InitialLoad => self.initial_loads = self.initial_loads.saturating_sub(1),
            ActionKind::Refresh => self.refreshes = self.refreshes.saturating_sub(1),
            ActionKind::NextPage => self.next_page = false,
        }
    }

    /// Evaluate the next-page guard and, if it passes, claim the next-page slot
    ///
    /// Check and claim happen in one call so two triggers holding the lock in
    /// turn can never both pass.
    pub fn claim_next_page(&mut self, page_size: PageSize) -> Result<PageRequest, SkipReason> {
        if self.refreshes > 0 {
            return Err(SkipReason::RefreshInFlight);
        }
        if self.next_page {
            return Err(SkipReason::NextPageInFlight);
        }
        let offset = page_size.offset_after(self.pages);
        if self.total <= offset {
            return Err(SkipReason::Exhausted);
        }

        self.next_page = true;
        Ok(PageRequest::new(offset, page_size))
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            items: self.items.clone(),
            pages: self.pages,
            total: self.total,
        }
    }
}
