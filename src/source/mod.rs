//! Page source module
//!
//! A page source performs the actual fetch of one page for a given offset and
//! size. The controller never talks to a transport directly; it is handed a
//! `PageSource` at construction.
//!
//! # Overview
//!
//! The source module provides:
//! - `PageSource` - The async fetch capability injected into the controller
//! - `FnSource` - Adapter turning an async closure into a source
//! - `MemorySource` - In-memory source with optional artificial latency

mod memory;
mod types;

pub use memory::{FnSource, MemorySource};
pub use types::PageSource;
