//! Sampler/aggregator: ranks the fault table and joins it with process metrics.
//!
//! One [`Aggregator::tick`] does the following:
//!
//! 1. snapshot the fault table
//! 2. stable-sort descending by value (ties keep snapshot order)
//! 3. drop the monitor's own pid and pids suppressed as stale
//! 4. keep the first `top_k`
//! 5. resolve each pid through the [`MetricsProvider`] and look up its blocked
//!    time (absent means zero)
//!
//! A resolution failure only loses that row. Failed rows are logged and
//! skipped; the remaining rows keep their rank order.

use super::error::{MonitorError, Result};
use super::humanize::{humanize_duration, humanize_size};
use super::timeout::{call_with_timeout, TimedCall};
use super::types::{CounterSource, DisplayRow, FaultUnit, MetricsProvider, Pid, ProcessSnapshot};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Tuning knobs for the aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// Number of rows to resolve per tick.
    pub top_k: usize,
    /// Maximum characters kept from the executable path.
    pub command_width: usize,
    /// Upper bound on a single provider call. `None` calls inline.
    pub resolve_timeout: Option<Duration>,
    /// Consecutive failures before a pid is suppressed. 0 disables suppression.
    pub stale_after: u32,
    /// Pid excluded from ranking, normally the monitor itself.
    pub self_pid: Pid,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            command_width: 40,
            resolve_timeout: Some(Duration::from_millis(500)),
            stale_after: 3,
            self_pid: std::process::id(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct StaleEntry {
    failures: u32,
    last_value: u64,
}

/// Tracks pids whose counter entries outlived the process.
///
/// The counter tables are not ours to prune, so instead of deleting an entry
/// the tracker hides it from ranking once it has failed to resolve
/// `threshold` ticks in a row with an unchanged fault value. Any change in the
/// value brings the pid back.
#[derive(Debug, Default)]
pub struct StaleTracker {
    threshold: u32,
    entries: HashMap<Pid, StaleEntry>,
}

impl StaleTracker {
    /// Creates a tracker that suppresses after `threshold` failures.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self { threshold, entries: HashMap::new() }
    }

    /// Returns true if `pid` should be left out of this tick's ranking.
    #[must_use]
    pub fn is_suppressed(&self, pid: Pid, value: u64) -> bool {
        if self.threshold == 0 {
            return false;
        }
        self.entries
            .get(&pid)
            .is_some_and(|e| e.failures >= self.threshold && e.last_value == value)
    }

    /// Records a failed resolution for `pid` at fault value `value`.
    pub fn record_failure(&mut self, pid: Pid, value: u64) {
        let entry =
            self.entries.entry(pid).or_insert(StaleEntry { failures: 0, last_value: value });
        if entry.last_value != value {
            entry.failures = 0;
            entry.last_value = value;
        }
        entry.failures = entry.failures.saturating_add(1);
    }

    /// Records a successful resolution, clearing any failure history.
    pub fn record_success(&mut self, pid: Pid) {
        self.entries.remove(&pid);
    }

    /// Forgets pids that are no longer in the fault table.
    pub fn retain_present(&mut self, present: &HashSet<Pid>) {
        self.entries.retain(|pid, _| present.contains(pid));
    }

    /// Number of consecutive failures recorded for `pid`.
    #[must_use]
    pub fn failures(&self, pid: Pid) -> u32 {
        self.entries.get(&pid).map_or(0, |e| e.failures)
    }

    /// Number of tracked pids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no pid is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ranks a fault snapshot: descending by value, stable on ties, without
/// `self_pid` and without pids rejected by `skip`, truncated to `k`.
pub fn rank(
    snapshot: &[(Pid, u64)],
    self_pid: Pid,
    k: usize,
    mut skip: impl FnMut(Pid, u64) -> bool,
) -> Vec<(Pid, u64)> {
    let mut ranked = snapshot.to_vec();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .filter(|&(pid, value)| pid != self_pid && !skip(pid, value))
        .take(k)
        .collect()
}

/// Builds a display row from a resolved snapshot.
#[must_use]
pub fn build_row(
    pid: Pid,
    fault_value: u64,
    unit: FaultUnit,
    blocked_ns: u64,
    snapshot: &ProcessSnapshot,
    command_width: usize,
) -> DisplayRow {
    let page_fault = match unit {
        FaultUnit::Nanoseconds => humanize_duration(fault_value),
        FaultUnit::Events => fault_value.to_string(),
    };
    DisplayRow {
        pid,
        command: snapshot.exe.chars().take(command_width).collect(),
        page_fault,
        uss: humanize_size(snapshot.uss),
        swap: humanize_size(snapshot.swap),
        blocked: humanize_duration(blocked_ns),
        involuntary: snapshot.involuntary_switches,
    }
}

/// Per-pid outcome of one tick, in rank order.
pub type Resolution = Vec<(Pid, Result<DisplayRow>)>;

/// Pids with a resolver thread still running.
type InFlight = Arc<Mutex<HashSet<Pid>>>;

/// Marks `pid` as in flight until dropped. Moved into the resolver closure so
/// the mark is cleared when the call returns, panics, or is never spawned.
struct InFlightGuard {
    pending: InFlight,
    pid: Pid,
}

impl InFlightGuard {
    /// Returns `None` if a resolver for `pid` is already running.
    fn acquire(pending: &InFlight, pid: Pid) -> Option<Self> {
        let inserted = lock(pending).insert(pid);
        inserted.then(|| Self { pending: Arc::clone(pending), pid })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.pending).remove(&self.pid);
    }
}

fn lock(pending: &InFlight) -> MutexGuard<'_, HashSet<Pid>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Joins the counter tables with the metrics provider.
pub struct Aggregator {
    provider: Arc<dyn MetricsProvider>,
    options: AggregatorOptions,
    stale: StaleTracker,
    in_flight: InFlight,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("options", &self.options)
            .field("stale", &self.stale)
            .field("in_flight", &lock(&self.in_flight).len())
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    /// Creates an aggregator over `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn MetricsProvider>, options: AggregatorOptions) -> Self {
        let stale = StaleTracker::new(options.stale_after);
        Self { provider, options, stale, in_flight: InFlight::default() }
    }

    /// Returns the stale-pid tracker.
    #[must_use]
    pub fn stale(&self) -> &StaleTracker {
        &self.stale
    }

    fn snapshot_of(&self, pid: Pid) -> Result<ProcessSnapshot> {
        let Some(timeout) = self.options.resolve_timeout else {
            return self.provider.snapshot(pid);
        };

        // A resolver abandoned on an earlier tick is still blocked on this pid.
        let Some(guard) = InFlightGuard::acquire(&self.in_flight, pid) else {
            return Err(MonitorError::ResolveTimeout { pid, timeout });
        };

        let provider = Arc::clone(&self.provider);
        let call = move || {
            let _guard = guard;
            provider.snapshot(pid)
        };
        match call_with_timeout(call, timeout) {
            TimedCall::Completed(result) => result,
            TimedCall::Timeout => Err(MonitorError::ResolveTimeout { pid, timeout }),
            TimedCall::SpawnError => Err(MonitorError::CollectionFailed {
                collector: "process",
                message: format!("could not spawn resolver for pid {pid}"),
            }),
            TimedCall::Disconnected => Err(MonitorError::CollectionFailed {
                collector: "process",
                message: format!("resolver for pid {pid} panicked"),
            }),
        }
    }

    /// Samples, ranks and resolves, returning every selected pid with its
    /// outcome. Only a failure to read the fault table is an error.
    pub fn resolve(&mut self, source: &mut dyn CounterSource) -> Result<Resolution> {
        let snapshot = source.fault_counts()?;
        let unit = source.fault_unit();

        let present: HashSet<Pid> = snapshot.iter().map(|&(pid, _)| pid).collect();
        self.stale.retain_present(&present);

        let stale = &self.stale;
        let ranked = rank(&snapshot, self.options.self_pid, self.options.top_k, |pid, value| {
            stale.is_suppressed(pid, value)
        });
        debug!(source = source.id(), entries = snapshot.len(), ranked = ranked.len(), "sampled");

        let mut resolution = Vec::with_capacity(ranked.len());
        for (pid, value) in ranked {
            let outcome = self.snapshot_of(pid).map(|snap| {
                let blocked = source.blocked_duration(pid);
                build_row(pid, value, unit, blocked, &snap, self.options.command_width)
            });
            match &outcome {
                Ok(_) => self.stale.record_success(pid),
                Err(_) => self.stale.record_failure(pid, value),
            }
            resolution.push((pid, outcome));
        }
        Ok(resolution)
    }

    /// Runs one aggregation pass and returns the rows that resolved, in rank
    /// order. Failed rows are logged and dropped.
    pub fn tick(&mut self, source: &mut dyn CounterSource) -> Result<Vec<DisplayRow>> {
        let resolution = self.resolve(source)?;
        let rows = resolution
            .into_iter()
            .filter_map(|(pid, outcome)| match outcome {
                Ok(row) => Some(row),
                Err(err) => {
                    warn!(pid, gone = err.is_process_gone(), error = %err, "dropped row");
                    None
                }
            })
            .collect();
        Ok(rows)
    }
}
