//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{load_config, AppConfig, HttpSourceConfig};
use crate::demo::{self, DemoServerConfig};
use crate::error::{Error, Result};
use crate::http::HttpPageSource;
use crate::source::PageSource;
use crate::stapler::Stapler;
use crate::types::{JsonValue, PageSize};
use std::fmt::Display;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Demo {
                page_size,
                delay_ms,
            } => self.demo(*page_size, *delay_ms).await,
            Commands::Fetch {
                url,
                page_size,
                max_pages,
            } => self.fetch(url.as_deref(), *page_size, *max_pages).await,
            Commands::Serve { port, delay_ms } => {
                let config = DemoServerConfig {
                    port: *port,
                    latency: latency(*delay_ms),
                };
                demo::serve(config).await
            }
        }
    }

    /// Load the config file, or defaults if none was given
    fn load_config(&self) -> Result<AppConfig> {
        match &self.cli.config {
            Some(path) => load_config(path),
            None => Ok(AppConfig::default()),
        }
    }

    async fn demo(&self, page_size: u64, delay_ms: u64) -> Result<()> {
        let page_size = PageSize::new(page_size)?;
        let stapler = Stapler::new(page_size, demo::lyrics_source(latency(delay_ms)))?;
        let started = Instant::now();

        let mut line_number = 0;
        paginate(&stapler, None, |line| {
            line_number += 1;
            println!("{line_number:>3}  {line}");
            Ok(())
        })
        .await?;

        let snapshot = stapler.snapshot();
        println!(
            "-- {} pages, {} of {} lines in {:.1?}",
            snapshot.pages,
            snapshot.items.len(),
            snapshot.total,
            started.elapsed()
        );
        Ok(())
    }

    async fn fetch(
        &self,
        url: Option<&str>,
        page_size: Option<u64>,
        max_pages: Option<u64>,
    ) -> Result<()> {
        let config = self.load_config()?;

        let source_config = match (url, config.source) {
            (Some(url), Some(mut source)) => {
                source.url = url.to_string();
                source
            }
            (Some(url), None) => HttpSourceConfig::new(url),
            (None, Some(source)) => source,
            (None, None) => {
                return Err(Error::config(
                    "No endpoint given (use --url or a config file with a `source` section)",
                ))
            }
        };
        let page_size = match page_size {
            Some(size) => PageSize::new(size)?,
            None => config.pagination.page_size,
        };

        let source: HttpPageSource<JsonValue> = HttpPageSource::new(source_config)?;
        let stapler = Stapler::new(page_size, source)?;
        let started = Instant::now();

        let count = paginate(&stapler, max_pages, |item| {
            println!("{}", serde_json::to_string(item)?);
            Ok(())
        })
        .await?;

        info!(
            "Fetched {} items in {} pages (server total {}) in {:.1?}",
            count,
            stapler.pages().get(),
            stapler.total().get(),
            started.elapsed()
        );
        Ok(())
    }
}

/// Drive a controller from the first page to the last
///
/// Loads page one, then fires next-page triggers one at a time until the
/// controller reports nothing left or `max_pages` pages are loaded. Every
/// newly appended item is passed to `emit` in order. Returns the number of
/// items emitted.
pub async fn paginate<S, F>(stapler: &Stapler<S>, max_pages: Option<u64>, mut emit: F) -> Result<usize>
where
    S: PageSource,
    S::Item: Clone,
    S::Error: Display,
    F: FnMut(&S::Item) -> Result<()>,
{
    stapler
        .initial_load()
        .await
        .map_err(|e| Error::Other(format!("Initial load failed: {e}")))?;

    let mut errors = stapler.next_page_errors().subscribe();
    let mut emitted = 0;

    loop {
        let items = stapler.items().get();
        for item in items.get(emitted..).unwrap_or_default() {
            emit(item)?;
        }
        emitted = items.len();
        debug!(
            "{} pages loaded, {} of {} items",
            stapler.pages().get(),
            emitted,
            stapler.total().get()
        );

        if max_pages.is_some_and(|max| stapler.pages().get() >= max) {
            break;
        }
        if !stapler.load_next_page_if_needed() {
            break;
        }

        stapler
            .next_page_action()
            .is_executing()
            .wait_for(|busy| !busy)
            .await;
        if let Ok(error) = errors.try_recv() {
            return Err(Error::Other(format!("Next page failed: {error}")));
        }
    }

    Ok(emitted)
}

fn latency(delay_ms: u64) -> Option<Duration> {
    (delay_ms > 0).then(|| Duration::from_millis(delay_ms))
}
