//! CLI module
//!
//! Command-line interface for driving a pagination controller.
//!
//! # Commands
//!
//! - `demo` - Page through the in-memory lyrics list
//! - `fetch` - Page through an HTTP endpoint
//! - `serve` - Start the demo HTTP endpoint

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::{paginate, Runner};
