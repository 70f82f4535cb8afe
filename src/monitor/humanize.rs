//! Compact human-readable units.
//!
//! Bucket boundaries are strict: a value exactly on a boundary stays in the
//! smaller unit (`1000` ns renders as `1000ns`, not `1us`). Division truncates.

const US: u64 = 1_000;
const MS: u64 = 1_000 * US;
const S: u64 = 1_000 * MS;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;

/// Formats a nanosecond duration as `Ns`, `Nms`, `Nus` or `Nns`.
#[must_use]
pub fn humanize_duration(ns: u64) -> String {
    if ns > S {
        format!("{}s", ns / S)
    } else if ns > MS {
        format!("{}ms", ns / MS)
    } else if ns > US {
        format!("{}us", ns / US)
    } else {
        format!("{ns}ns")
    }
}

/// Formats a byte count as `NMB`, `NKB` or the bare number.
#[must_use]
pub fn humanize_size(bytes: u64) -> String {
    if bytes > MB {
        format!("{}MB", bytes / MB)
    } else if bytes > KB {
        format!("{}KB", bytes / KB)
    } else {
        bytes.to_string()
    }
}
