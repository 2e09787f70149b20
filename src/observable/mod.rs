//! Observable state module
//!
//! Consumers read and subscribe to controller state through two primitives:
//!
//! - `Property<T>` - Holds a current value; every subscriber can read the last
//!   value at any time and is woken on each update (tokio `watch`)
//! - `Signal<T>` - A stream of discrete events such as errors, delivered to every
//!   subscriber registered at emission time (tokio `broadcast`)
//!
//! Updates are published synchronously by the writer; there is no scheduler in
//! between.

mod property;
mod signal;

pub use property::Property;
pub use signal::{Signal, SIGNAL_CAPACITY};
