//! Tick loop: sleep, aggregate, render.

use crate::monitor::aggregator::Aggregator;
use crate::monitor::collectors::MemorySummary;
use crate::monitor::error::Result;
use crate::monitor::presenter::Presenter;
use crate::monitor::types::CounterSource;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Granularity at which the shutdown flag is polled while sleeping.
const POLL_SLICE: Duration = Duration::from_millis(100);

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Rows were rendered.
    Rendered(usize),
    /// The counter source failed; nothing was rendered this tick.
    Skipped,
}

/// The monitoring application.
pub struct App<'a, P: Presenter> {
    source: Box<dyn CounterSource + 'a>,
    aggregator: Aggregator,
    presenter: P,
    interval: Duration,
    meminfo_root: Option<PathBuf>,
    shutdown: &'a AtomicBool,
}

impl<P: Presenter + std::fmt::Debug> std::fmt::Debug for App<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("source", &self.source.id())
            .field("aggregator", &self.aggregator)
            .field("presenter", &self.presenter)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl<'a, P: Presenter> App<'a, P> {
    /// Creates an application. `shutdown` is polled between ticks.
    pub fn new(
        source: Box<dyn CounterSource + 'a>,
        aggregator: Aggregator,
        presenter: P,
        interval: Duration,
        shutdown: &'a AtomicBool,
    ) -> Self {
        Self { source, aggregator, presenter, interval, meminfo_root: None, shutdown }
    }

    /// Prints the memory footer read from `<proc_root>/meminfo`.
    #[must_use]
    pub fn with_memory_summary(mut self, proc_root: impl Into<PathBuf>) -> Self {
        self.meminfo_root = Some(proc_root.into());
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Sleeps for the interval in short slices. Returns false if shutdown was
    /// requested before the interval elapsed.
    fn sleep_interval(&self) -> bool {
        let deadline = Instant::now() + self.interval;
        loop {
            if self.shutdown_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(POLL_SLICE.min(deadline - now));
        }
    }

    /// Runs one aggregation pass and one render.
    ///
    /// # Errors
    ///
    /// Only presentation failures are returned. A counter-source failure is
    /// logged and reported as [`TickOutcome::Skipped`].
    pub fn tick(&mut self) -> Result<TickOutcome> {
        let rows = match self.aggregator.tick(self.source.as_mut()) {
            Ok(rows) => rows,
            Err(err) => {
                error!(source = self.source.id(), error = %err, "counter read failed");
                return Ok(TickOutcome::Skipped);
            }
        };

        let memory = self.meminfo_root.as_ref().and_then(|root| match MemorySummary::read(root) {
            Ok(summary) => Some(summary),
            Err(err) => {
                debug!(error = %err, "memory summary unavailable");
                None
            }
        });

        self.presenter.render(&rows, memory.as_ref())?;
        Ok(TickOutcome::Rendered(rows.len()))
    }

    /// Runs until shutdown is requested.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn run(&mut self) -> Result<()> {
        info!(interval = ?self.interval, source = self.source.id(), "monitor started");
        while self.sleep_interval() {
            self.tick()?;
        }
        info!("shutdown requested, exiting");
        Ok(())
    }

    /// Renders a single tick without sleeping.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn run_once(&mut self) -> Result<TickOutcome> {
        self.tick()
    }
}
