//! Per-operation status module
//!
//! Every controller operation (initial load, refresh, next page) owns an
//! `Action` that reports whether it is running and how its last run failed.
//! Errors are routed only to the action whose fetch produced them.

use crate::observable::{Property, Signal};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Action Kind
// ============================================================================

/// Identity of a controller operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// First load of page one
    InitialLoad,
    /// User-triggered reload of page one
    Refresh,
    /// Load of the page after the last loaded one
    NextPage,
}

impl ActionKind {
    /// Stable lowercase name used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitialLoad => "initial_load",
            Self::Refresh => "refresh",
            Self::NextPage => "next_page",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Action State
// ============================================================================

/// Coarse status of an action
#[derive(Debug)]
pub enum ActionState<E> {
    /// Not running; last run (if any) succeeded
    Idle,
    /// At least one fetch is in flight
    InFlight,
    /// Not running; last completed run failed with this error
    Failed(Arc<E>),
}

impl<E> ActionState<E> {
    /// Check if the action is running
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }

    /// Check if the last run failed
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl<E> Clone for ActionState<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::InFlight => Self::InFlight,
            Self::Failed(error) => Self::Failed(error.clone()),
        }
    }
}

// ============================================================================
// Action
// ============================================================================

/// Observable status of one controller operation
///
/// Handles are cheap to clone and share the same underlying state.
pub struct Action<E> {
    kind: ActionKind,
    executing: Property<bool>,
    last_error: Property<Option<Arc<E>>>,
    errors: Signal<Arc<E>>,
}

impl<E: Send + Sync + 'static> Action<E> {
    pub(crate) fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            executing: Property::new(false),
            last_error: Property::new(None),
            errors: Signal::new(),
        }
    }

    /// Which operation this action reports on
    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Whether a fetch for this operation is in flight
    pub fn is_executing(&self) -> &Property<bool> {
        &self.executing
    }

    /// Error of the most recent failed run, cleared by the next success
    pub fn last_error(&self) -> &Property<Option<Arc<E>>> {
        &self.last_error
    }

    /// Stream of every failure of this operation
    pub fn errors(&self) -> &Signal<Arc<E>> {
        &self.errors
    }

    /// Current coarse state
    pub fn state(&self) -> ActionState<E> {
        if self.executing.get() {
            ActionState::InFlight
        } else if let Some(error) = self.last_error.get() {
            ActionState::Failed(error)
        } else {
            ActionState::Idle
        }
    }

    /// Publish the number of fetches currently running for this action
    pub(crate) fn publish_in_flight(&self, in_flight: usize) {
        self.executing.set_if_changed(in_flight > 0);
    }

    pub(crate) fn succeeded(&self) {
        if self.last_error.with(Option::is_some) {
            self.last_error.set(None);
        }
    }

    pub(crate) fn failed(&self, error: Arc<E>) {
        self.last_error.set(Some(error.clone()));
        self.errors.emit(error);
    }
}

impl<E> Clone for Action<E> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            executing: self.executing.clone(),
            last_error: self.last_error.clone(),
            errors: self.errors.clone(),
        }
    }
}

impl<E> fmt::Debug for Action<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("kind", &self.kind)
            .field("executing", &self.executing.with(|v| *v))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
