//! Core types for the contention monitor.
//!
//! - [`CounterSource`]: read-only access to the kernel-maintained per-pid
//!   fault and blocked-time tables
//! - [`MetricsProvider`]: per-pid memory and scheduling metrics
//! - [`ProcessSnapshot`]: one provider answer, owned by a single tick
//! - [`DisplayRow`]: a humanized table row, owned by a single render
//!
//! The two traits are the seams between the aggregator and the outside world.
//! Neither source is assumed to be consistent with the other: a pid may show
//! up in the fault table after it has already exited, and the blocked-time
//! table may lag or lead the fault table.

use super::error::Result;

/// Operating-system process identifier.
pub type Pid = u32;

/// What the values in a fault table measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultUnit {
    /// Nanoseconds spent inside the fault handler (kprobe-based sources).
    #[default]
    Nanoseconds,
    /// Number of fault events (procfs `minflt + majflt`).
    Events,
}

/// Read-only access to the two per-pid counter tables.
///
/// Implementations are updated by something outside this process's control.
/// The monitor never writes, resets or prunes them.
pub trait CounterSource: Send {
    /// Returns the unique identifier for this source.
    fn id(&self) -> &'static str;

    /// Takes a snapshot of the fault table as `(pid, value)` pairs.
    ///
    /// The order of the returned sequence is the tie-break order used when
    /// ranking, so implementations should return it in a stable order.
    fn fault_counts(&mut self) -> Result<Vec<(Pid, u64)>>;

    /// Returns the cumulative blocked time for `pid` in nanoseconds, or 0 if
    /// the table has no entry for it.
    fn blocked_duration(&self, pid: Pid) -> u64;

    /// Unit of the fault table values.
    fn fault_unit(&self) -> FaultUnit {
        FaultUnit::Nanoseconds
    }
}

/// Per-process metrics source.
pub trait MetricsProvider: Send + Sync {
    /// Resolves a fresh snapshot for `pid`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ProcessNotFound`] if the process has exited and
    /// [`MonitorError::PermissionDenied`] if it cannot be inspected.
    ///
    /// [`MonitorError::ProcessNotFound`]: super::error::MonitorError::ProcessNotFound
    /// [`MonitorError::PermissionDenied`]: super::error::MonitorError::PermissionDenied
    fn snapshot(&self, pid: Pid) -> Result<ProcessSnapshot>;
}

/// Point-in-time OS view of one process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessSnapshot {
    /// Executable path.
    pub exe: String,
    /// Unique set size in bytes.
    pub uss: u64,
    /// Swapped-out memory in bytes.
    pub swap: u64,
    /// Involuntary context switches since process start.
    pub involuntary_switches: u64,
}

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    /// Process ID.
    pub pid: Pid,
    /// Executable path, truncated to the command column width.
    pub command: String,
    /// Humanized fault value.
    pub page_fault: String,
    /// Humanized unique set size.
    pub uss: String,
    /// Humanized swap usage.
    pub swap: String,
    /// Humanized blocked duration.
    pub blocked: String,
    /// Involuntary context switches.
    pub involuntary: u64,
}

/// A boxed counter source for dynamic dispatch.
pub type BoxedCounterSource = Box<dyn CounterSource>;
