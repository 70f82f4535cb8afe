//! # faulttop
//!
//! Live page-fault and blocked-time contention monitor for Linux processes.
//!
//! Every interval faulttop reads a per-process fault table and a per-process
//! blocked-time table, ranks processes by faults, resolves the top entries to
//! memory and scheduling metrics, and redraws a table of the worst offenders.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use faulttop::monitor::humanize_duration;
//!
//! assert_eq!(humanize_duration(1_500_000), "1ms");
//! ```
//!
//! The binary is `faulttop`; see `faulttop --help`.

#![warn(missing_docs)]
// Allow unwrap() in tests only - banned in production code
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

/// Sampling, ranking and rendering.
pub mod monitor;

pub use monitor::{MonitorError, Result};
