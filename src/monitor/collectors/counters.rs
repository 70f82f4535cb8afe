//! Procfs-backed counter tables.
//!
//! Parses `/proc/[pid]/stat` for every process and exposes two tables:
//!
//! - fault table: `minflt + majflt` (event counts)
//! - blocked table: `delayacct_blkio_ticks` converted to nanoseconds
//!
//! Both tables are filled from the same `stat` read, so within one snapshot
//! they agree with each other. Blocked time is zero unless the kernel has
//! delay accounting enabled (`delayacct` boot flag or
//! `kernel.task_delayacct` sysctl).

use crate::monitor::error::{MonitorError, Result};
use crate::monitor::types::{CounterSource, FaultUnit, Pid};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// Default procfs mount point.
pub const PROC_ROOT: &str = "/proc";

/// Fields parsed out of one `/proc/[pid]/stat` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatCounters {
    /// Minor faults (field 10).
    pub minflt: u64,
    /// Major faults (field 12).
    pub majflt: u64,
    /// Aggregated block I/O delay in clock ticks (field 42).
    pub blkio_ticks: u64,
}

impl StatCounters {
    /// Parses a `stat` line. The command name may contain spaces and
    /// parentheses, so fields are counted from the last `)`.
    #[must_use]
    pub fn parse(stat: &str) -> Option<Self> {
        let name_end = stat.rfind(')')?;
        let fields: Vec<&str> = stat.get(name_end + 1..)?.split_whitespace().collect();

        // fields[0] is field 3 (state)
        let field = |n: usize| fields.get(n - 3).and_then(|s| s.parse::<u64>().ok());

        Some(Self {
            minflt: field(10)?,
            majflt: field(12)?,
            // Absent on very old kernels.
            blkio_ticks: field(42).unwrap_or(0),
        })
    }

    /// Total faults.
    #[must_use]
    pub fn faults(&self) -> u64 {
        self.minflt.saturating_add(self.majflt)
    }
}

/// Counter source reading fault and block-I/O delay counters from procfs.
#[derive(Debug)]
pub struct ProcfsCounterSource {
    root: PathBuf,
    ns_per_tick: u64,
    blocked: HashMap<Pid, u64>,
    first_scan_done: bool,
}

impl ProcfsCounterSource {
    /// Creates a source over `/proc`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(PROC_ROOT)
    }

    /// Creates a source over an alternative procfs root.
    #[must_use]
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ns_per_tick: ns_per_clock_tick(),
            blocked: HashMap::new(),
            first_scan_done: false,
        }
    }

    /// Overrides the clock-tick length used to convert blocked ticks.
    #[must_use]
    pub fn with_ns_per_tick(mut self, ns_per_tick: u64) -> Self {
        self.ns_per_tick = ns_per_tick;
        self
    }

    fn read_counters(&self, pid: Pid) -> Option<StatCounters> {
        let path = self.root.join(pid.to_string()).join("stat");
        // A missing file means the process exited after readdir.
        let content = std::fs::read_to_string(path).ok()?;
        StatCounters::parse(&content)
    }
}

impl Default for ProcfsCounterSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for ProcfsCounterSource {
    fn id(&self) -> &'static str {
        "procfs"
    }

    fn fault_counts(&mut self) -> Result<Vec<(Pid, u64)>> {
        let dir = std::fs::read_dir(&self.root).map_err(|e| MonitorError::CollectionFailed {
            collector: "counters",
            message: format!("Failed to read {}: {}", self.root.display(), e),
        })?;

        let mut pids: Vec<Pid> = dir
            .flatten()
            .filter_map(|entry| entry.file_name().to_str().and_then(|s| s.parse().ok()))
            .collect();
        pids.sort_unstable();

        let mut faults = Vec::with_capacity(pids.len());
        let mut blocked = HashMap::with_capacity(pids.len());
        for pid in pids {
            let Some(counters) = self.read_counters(pid) else {
                trace!(pid, "stat vanished during scan");
                continue;
            };
            faults.push((pid, counters.faults()));
            if counters.blkio_ticks > 0 {
                blocked.insert(pid, counters.blkio_ticks.saturating_mul(self.ns_per_tick));
            }
        }

        if !self.first_scan_done {
            self.first_scan_done = true;
            if delay_accounting_disabled(faults.len(), blocked.len()) {
                warn!(
                    processes = faults.len(),
                    "no block I/O delay recorded; SYSCALL column will read 0ns \
                     (enable with `sysctl kernel.task_delayacct=1` or the `delayacct` boot flag)"
                );
            }
        }

        self.blocked = blocked;
        Ok(faults)
    }

    fn blocked_duration(&self, pid: Pid) -> u64 {
        self.blocked.get(&pid).copied().unwrap_or(0)
    }

    fn fault_unit(&self) -> FaultUnit {
        FaultUnit::Events
    }
}

/// A populated scan where no process has ever waited on block I/O means the
/// kernel is not collecting delay accounting.
fn delay_accounting_disabled(processes: usize, with_blocked: usize) -> bool {
    processes > 0 && with_blocked == 0
}

/// Nanoseconds per `USER_HZ` tick.
#[cfg(unix)]
fn ns_per_clock_tick() -> u64 {
    // SAFETY: sysconf has no preconditions.
    #[allow(unsafe_code)]
    let hz = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if hz > 0 {
        1_000_000_000 / hz as u64
    } else {
        10_000_000
    }
}

#[cfg(not(unix))]
fn ns_per_clock_tick() -> u64 {
    10_000_000
}
