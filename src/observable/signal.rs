//! Event stream observable

use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Events buffered per subscriber before the slowest one starts lagging
pub const SIGNAL_CAPACITY: usize = 64;

/// Multi-subscriber stream of discrete events
///
/// Events are not cached: a subscriber only sees what is emitted after it
/// subscribed. Emitting with no subscribers drops the event.
pub struct Signal<T> {
    sender: Arc<broadcast::Sender<T>>,
}

impl<T: Clone> Signal<T> {
    /// Create a signal with the default capacity
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Emit an event, returning how many subscribers received it
    pub(crate) fn emit(&self, event: T) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}
