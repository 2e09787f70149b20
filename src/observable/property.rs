//! Last-value cached observable

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Observable value with a cached current state
///
/// Cloning a `Property` yields another handle to the same value. Only the
/// crate can write to it; consumers get snapshots and change notifications.
pub struct Property<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> Property<T> {
    /// Create a property holding `initial`
    pub(crate) fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Replace the value and notify every subscriber
    pub(crate) fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Replace the value, notifying subscribers only if it changed
    pub(crate) fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        self.sender.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.sender.borrow().clone()
    }

    /// Run `f` against the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.sender.borrow())
    }

    /// Subscribe to changes
    ///
    /// The receiver starts with the current value marked as seen; call
    /// `changed().await` to wait for the next update.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    /// Wait until the value satisfies `predicate`, returning that value
    ///
    /// Resolves immediately if the current value already matches.
    #[allow(clippy::let_and_return)]
    pub async fn wait_for(&self, mut predicate: impl FnMut(&T) -> bool) -> T
    where
        T: Clone,
    {
        let mut receiver = self.sender.subscribe();
        let value = match receiver.wait_for(|value| predicate(value)).await {
            Ok(value) => value.clone(),
            // The sender lives as long as `self`, so the channel cannot close here.
            Err(_) => self.get(),
        };
        value
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&*self.sender.borrow()).finish()
    }
}
