//! System memory summary.
//!
//! Parses `/proc/meminfo` for the footer printed under the table.

use crate::monitor::error::{MonitorError, Result};
use std::path::Path;

/// System-wide memory figures, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemorySummary {
    /// `MemTotal`.
    pub total: u64,
    /// `MemFree`.
    pub free: u64,
    /// `MemAvailable`.
    pub available: u64,
    /// `SwapTotal - SwapFree`.
    pub swap_used: u64,
}

impl MemorySummary {
    /// Parses the content of a `meminfo` file.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut summary = Self::default();
        let mut swap_total: u64 = 0;
        let mut swap_free: u64 = 0;

        for line in content.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 2 {
                continue;
            }

            let value: u64 = parts[1].parse::<u64>().unwrap_or(0).saturating_mul(1024);

            match parts[0] {
                "MemTotal:" => summary.total = value,
                "MemFree:" => summary.free = value,
                "MemAvailable:" => summary.available = value,
                "SwapTotal:" => swap_total = value,
                "SwapFree:" => swap_free = value,
                _ => {}
            }
        }

        summary.swap_used = swap_total.saturating_sub(swap_free);
        summary
    }

    /// Reads `meminfo` under `proc_root`.
    pub fn read(proc_root: impl AsRef<Path>) -> Result<Self> {
        let path = proc_root.as_ref().join("meminfo");
        let content =
            std::fs::read_to_string(&path).map_err(|e| MonitorError::CollectionFailed {
                collector: "memory",
                message: format!("Failed to read {}: {}", path.display(), e),
            })?;
        Ok(Self::parse(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "MemTotal:       16384000 kB\n\
MemFree:         1024000 kB\n\
MemAvailable:    8192000 kB\n\
Buffers:          100000 kB\n\
SwapTotal:       2048000 kB\n\
SwapFree:        1024000 kB\n";

    #[test]
    fn test_parse_meminfo() {
        let summary = MemorySummary::parse(MEMINFO);
        assert_eq!(summary.total, 16_384_000 * 1024);
        assert_eq!(summary.free, 1_024_000 * 1024);
        assert_eq!(summary.available, 8_192_000 * 1024);
        assert_eq!(summary.swap_used, 1_024_000 * 1024);
    }

    #[test]
    fn test_parse_meminfo_without_swap() {
        let summary = MemorySummary::parse("MemTotal: 1000 kB\n");
        assert_eq!(summary.total, 1000 * 1024);
        assert_eq!(summary.swap_used, 0);
    }

    #[test]
    fn test_read_missing_file() {
        let err = MemorySummary::read("/nonexistent/proc").unwrap_err();
        assert!(err.to_string().contains("memory"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_read_real_meminfo() {
        let summary = MemorySummary::read("/proc").unwrap();
        assert!(summary.total > 0);
        assert!(summary.available <= summary.total);
    }
}
