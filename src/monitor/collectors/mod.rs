//! Concrete Linux sources.
//!
//! - **counters**: fault and blocked-time tables from `/proc/[pid]/stat`
//! - **process**: per-pid memory and scheduling metrics
//! - **memory**: system memory summary from `/proc/meminfo`

pub mod counters;
pub mod memory;
pub mod process;

pub use counters::{ProcfsCounterSource, StatCounters, PROC_ROOT};
pub use memory::MemorySummary;
pub use process::{ProcfsMetricsProvider, StatusFields};
