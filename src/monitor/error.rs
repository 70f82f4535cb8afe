//! Error types for the contention monitor.
//!
//! This module provides error types for counter sampling, per-process metric
//! resolution, configuration parsing and terminal rendering.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Error type for monitoring operations.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Failed to read a counter table or metrics source.
    #[error("failed to collect metrics from '{collector}': {message}")]
    CollectionFailed {
        /// The source that failed.
        collector: &'static str,
        /// Error message describing the failure.
        message: String,
    },

    /// Process exited or never existed.
    #[error("process {0} not found")]
    ProcessNotFound(u32),

    /// Permission denied while inspecting a process.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The metrics provider did not answer within the resolve timeout.
    #[error("resolving process {pid} timed out after {timeout:?}")]
    ResolveTimeout {
        /// The process being resolved.
        pid: u32,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// Configuration parsing error with line number.
    #[error("configuration error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred (1-indexed).
        line: usize,
        /// Error message describing the issue.
        message: String,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(String),

    /// Invalid configuration value.
    #[error("invalid configuration value for '{key}': {message}")]
    ConfigInvalid {
        /// The configuration key with invalid value.
        key: String,
        /// Error message describing why the value is invalid.
        message: String,
    },

    /// Terminal output error.
    #[error("terminal error: {0}")]
    TerminalError(#[from] io::Error),
}

impl MonitorError {
    /// Maps an I/O error raised while reading `/proc/<pid>/...` to the
    /// per-process error kind.
    #[must_use]
    pub fn from_proc_io(pid: u32, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::ProcessNotFound(pid),
            io::ErrorKind::PermissionDenied => {
                Self::PermissionDenied(format!("cannot inspect process {pid}"))
            }
            _ => match err.raw_os_error() {
                // ESRCH shows up when the task is torn down mid-read.
                Some(libc::ESRCH) => Self::ProcessNotFound(pid),
                Some(libc::EPERM) => {
                    Self::PermissionDenied(format!("cannot inspect process {pid}"))
                }
                _ => Self::CollectionFailed {
                    collector: "process",
                    message: format!("pid {pid}: {err}"),
                },
            },
        }
    }

    /// Returns true for the failures expected when a process exits mid-tick.
    #[must_use]
    pub fn is_process_gone(&self) -> bool {
        matches!(self, Self::ProcessNotFound(_))
    }
}

/// Result type alias for monitoring operations.
pub type Result<T> = std::result::Result<T, MonitorError>;
