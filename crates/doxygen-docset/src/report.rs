//! Per-batch reporting context.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Progress bar over `len` files.
pub fn progress_bar(len: u64) -> ProgressBar {
    let progress = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
        .map(|style| style.progress_chars("█▉▊▋▌▍▎▏  "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress.set_style(style);
    progress
}

/// Spinner for a step with no known length.
pub fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Handed to every batch so it can log and advance the shared progress bar.
///
/// Each batch gets its own `Reporter`; only the progress handle is shared.
#[derive(Debug, Clone)]
pub struct Reporter {
    batch: usize,
    progress: ProgressBar,
}

impl Reporter {
    pub fn new(batch: usize, progress: ProgressBar) -> Self {
        Self { batch, progress }
    }

    /// A reporter that draws nothing, for tests and quiet runs.
    pub fn hidden(batch: usize) -> Self {
        Self::new(batch, ProgressBar::hidden())
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn file_started(&self, file: &str) {
        debug!(batch = self.batch, file, "processing");
    }

    pub fn file_done(&self) {
        self.progress.inc(1);
    }

    pub fn member_skipped(&self, file: &str, member: &str) {
        warn!(batch = self.batch, file, member, "skipped member with malformed signature");
    }

    pub fn batch_done(&self, files: usize) {
        debug!(batch = self.batch, files, "batch complete");
    }
}
