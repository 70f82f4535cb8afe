//! Contention monitor.
//!
//! Samples two per-process counter tables (page faults and blocked time),
//! joins the top entries with per-process memory and scheduling metrics and
//! renders them as a refreshing table.
//!
//! # Pipeline
//!
//! - [`CounterSource`]: fault and blocked-time tables, maintained outside
//!   this process
//! - [`MetricsProvider`]: USS, swap, executable and involuntary switches
//! - [`Aggregator`]: rank, select top-K, resolve with per-row failure
//!   tolerance
//! - [`Presenter`]: clear and draw
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use faulttop::monitor::prelude::*;
//!
//! let config = Config::default();
//! let provider = Arc::new(ProcfsMetricsProvider::new());
//! let aggregator = Aggregator::new(provider, config.aggregator_options());
//! let presenter = TerminalPresenter::new(std::io::stdout(), config.command_width);
//! let shutdown = faulttop::monitor::signal::install();
//! let source = Box::new(ProcfsCounterSource::new());
//! let mut app = App::new(source, aggregator, presenter, config.update_interval(), shutdown);
//! app.run()?;
//! ```

// ============================================================================
// Error Types
// ============================================================================

pub mod error;
pub use error::{MonitorError, Result};

// ============================================================================
// Core Types
// ============================================================================

pub mod humanize;
pub mod timeout;
pub mod types;

pub use humanize::{humanize_duration, humanize_size};
pub use types::{CounterSource, DisplayRow, FaultUnit, MetricsProvider, Pid, ProcessSnapshot};

// ============================================================================
// Sources
// ============================================================================

pub mod collectors;

// ============================================================================
// Aggregation and Presentation
// ============================================================================

pub mod aggregator;
pub mod presenter;

pub use aggregator::{Aggregator, AggregatorOptions, StaleTracker};
pub use presenter::{Presenter, TerminalPresenter};

// ============================================================================
// Configuration
// ============================================================================

pub mod config;

pub use config::Config;

// ============================================================================
// Application
// ============================================================================

pub mod app;
pub mod logging;
pub mod signal;

pub use app::{App, TickOutcome};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types for monitor functionality.
pub mod prelude {
    pub use super::aggregator::{Aggregator, AggregatorOptions};
    pub use super::app::{App, TickOutcome};
    pub use super::collectors::{ProcfsCounterSource, ProcfsMetricsProvider};
    pub use super::config::Config;
    pub use super::error::{MonitorError, Result};
    pub use super::presenter::{Presenter, TerminalPresenter};
    pub use super::types::{CounterSource, DisplayRow, MetricsProvider, Pid, ProcessSnapshot};
}
