// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Stapler
//!
//! Incremental loading of server-backed paginated lists.
//!
//! A `Stapler` sits between a UI list and a `PageSource`. It fetches page one,
//! appends further pages as the user scrolls, and publishes the accumulated
//! items, counters and per-operation status as observables.
//!
//! ## Features
//!
//! - **Single-flight next page**: scroll triggers while a page is loading, while
//!   a refresh runs, or after the last page are ignored
//! - **Separate statuses**: initial load, refresh and next page each report
//!   their own in-flight flag and errors
//! - **Observables**: last-value properties on tokio `watch`, error streams on
//!   tokio `broadcast`
//! - **HTTP adapter**: offset/limit JSON endpoints with retry and rate limiting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stapler::{MemorySource, PageSize, Stapler};
//!
//! #[tokio::main]
//! async fn main() -> stapler::Result<()> {
//!     let source = MemorySource::new((0..23).collect::<Vec<u32>>());
//!     let stapler = Stapler::new(PageSize::new(5)?, source)?;
//!
//!     stapler.initial_load().await.ok();
//!     while stapler.should_show_next_page_activity_indicator().get() {
//!         stapler.load_next_page().await;
//!     }
//!
//!     assert_eq!(stapler.items().get().len(), 23);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Stapler                             │
//! │  initial_load()   refresh()   load_next_page_if_needed()     │
//! │  items  pages  total  should_show_next_page_activity_indicator│
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!          ┌────────────────────┼─────────────────────┐
//!          │                    │                     │
//!     ┌─────────┐        ┌────────────┐        ┌────────────┐
//!     │ Action  │        │ Observable │        │ PageSource │
//!     ├─────────┤        ├────────────┤        ├────────────┤
//!     │ status  │        │ Property   │        │ Memory     │
//!     │ errors  │        │ Signal     │        │ Fn         │
//!     └─────────┘        └────────────┘        │ HTTP       │
//!                                              └────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Page source abstraction
pub mod source;

/// Observable values and event streams
pub mod observable;

/// Per-operation status
pub mod action;

/// Pagination controller
pub mod stapler;

/// HTTP client and page source
pub mod http;

/// Configuration
pub mod config;

/// Demo data and server
pub mod demo;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use action::{Action, ActionKind, ActionState};
pub use config::{load_config, AppConfig, HttpSourceConfig, StaplerConfig};
pub use observable::{Property, Signal};
pub use source::{FnSource, MemorySource, PageSource};
pub use stapler::{LoadResult, NextPageOutcome, SkipReason, Snapshot, Stapler, StaplerBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
