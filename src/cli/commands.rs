//! CLI commands and argument parsing

use crate::demo::DEMO_PAGE_SIZE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incremental pagination for server-backed lists
#[derive(Parser, Debug)]
#[command(name = "stapler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Page through the built-in lyrics list
    Demo {
        /// Items per page
        #[arg(long, default_value_t = DEMO_PAGE_SIZE)]
        page_size: u64,

        /// Simulated backend latency in milliseconds
        #[arg(long, default_value = "500")]
        delay_ms: u64,
    },

    /// Page through an offset/limit JSON endpoint, printing items as JSON lines
    Fetch {
        /// Endpoint URL (overrides `source.url` in the config file)
        #[arg(long)]
        url: Option<String>,

        /// Items per page (overrides `pagination.page_size`)
        #[arg(long)]
        page_size: Option<u64>,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<u64>,
    },

    /// Serve the lyrics list as a paginated HTTP endpoint
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Artificial latency per request in milliseconds
        #[arg(long, default_value = "0")]
        delay_ms: u64,
    },
}
