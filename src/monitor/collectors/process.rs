//! Per-process metrics provider.
//!
//! Parses `/proc/[pid]/*` on Linux:
//!
//! - `exe` (readlink): executable path
//! - `status`: `Name`, `VmSwap`, `nonvoluntary_ctxt_switches`
//! - `smaps_rollup` (or `smaps` on kernels before 4.14): USS as
//!   `Private_Clean + Private_Dirty`

use crate::monitor::error::{MonitorError, Result};
use crate::monitor::types::{MetricsProvider, Pid, ProcessSnapshot};
use std::io;
use std::path::{Path, PathBuf};

use super::counters::PROC_ROOT;

/// Fields of interest from `/proc/[pid]/status`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusFields {
    /// Command name (`Name:`).
    pub name: String,
    /// Swapped-out memory in bytes (`VmSwap:`).
    pub swap: u64,
    /// Involuntary context switches (`nonvoluntary_ctxt_switches:`).
    pub involuntary_switches: u64,
}

impl StatusFields {
    /// Parses the content of a `status` file. Missing keys stay zero.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut fields = Self::default();
        for line in content.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key {
                "Name" => fields.name = value.to_string(),
                "VmSwap" => fields.swap = parse_kb(value),
                "nonvoluntary_ctxt_switches" => {
                    fields.involuntary_switches = value.parse().unwrap_or(0);
                }
                _ => {}
            }
        }
        fields
    }
}

/// Sums `Private_Clean` and `Private_Dirty` across an `smaps` or
/// `smaps_rollup` file, in bytes.
#[must_use]
pub fn parse_uss(smaps: &str) -> u64 {
    smaps
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            matches!(key, "Private_Clean" | "Private_Dirty").then(|| parse_kb(value.trim()))
        })
        .fold(0u64, u64::saturating_add)
}

/// Parses `"1234 kB"` into bytes.
fn parse_kb(value: &str) -> u64 {
    value
        .split_whitespace()
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .map_or(0, |kb| kb.saturating_mul(1024))
}

/// Metrics provider reading procfs.
#[derive(Debug, Clone)]
pub struct ProcfsMetricsProvider {
    root: PathBuf,
}

impl ProcfsMetricsProvider {
    /// Creates a provider over `/proc`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(PROC_ROOT)
    }

    /// Creates a provider over an alternative procfs root.
    #[must_use]
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn pid_dir(&self, pid: Pid) -> PathBuf {
        self.root.join(pid.to_string())
    }

    fn read(&self, pid: Pid, file: &str) -> io::Result<String> {
        std::fs::read_to_string(self.pid_dir(pid).join(file))
    }

    fn read_uss(&self, pid: Pid) -> Result<u64> {
        match self.read(pid, "smaps_rollup") {
            Ok(content) => Ok(parse_uss(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound && self.pid_dir(pid).exists() => self
                .read(pid, "smaps")
                .map(|content| parse_uss(&content))
                .map_err(|e| MonitorError::from_proc_io(pid, &e)),
            Err(e) => Err(MonitorError::from_proc_io(pid, &e)),
        }
    }

    fn read_exe(&self, pid: Pid, name: &str) -> Result<String> {
        match std::fs::read_link(self.pid_dir(pid).join("exe")) {
            Ok(path) => Ok(path.display().to_string()),
            // Kernel threads have no executable; show the name like ps does.
            Err(e) if e.kind() == io::ErrorKind::NotFound && self.pid_dir(pid).exists() => {
                Ok(format!("[{name}]"))
            }
            Err(e) => Err(MonitorError::from_proc_io(pid, &e)),
        }
    }
}

impl Default for ProcfsMetricsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProvider for ProcfsMetricsProvider {
    fn snapshot(&self, pid: Pid) -> Result<ProcessSnapshot> {
        let status = self.read(pid, "status").map_err(|e| MonitorError::from_proc_io(pid, &e))?;
        let status = StatusFields::parse(&status);

        let exe = self.read_exe(pid, &status.name)?;
        let uss = self.read_uss(pid)?;

        Ok(ProcessSnapshot {
            exe,
            uss,
            swap: status.swap,
            involuntary_switches: status.involuntary_switches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const STATUS: &str = "Name:\tfirefox\n\
Umask:\t0022\n\
State:\tS (sleeping)\n\
VmRSS:\t  204800 kB\n\
VmSwap:\t    2048 kB\n\
voluntary_ctxt_switches:\t1000\n\
nonvoluntary_ctxt_switches:\t37\n";

    const SMAPS_ROLLUP: &str = "55d0c0000000-7ffd00000000 ---p 00000000 00:00 0 [rollup]\n\
Rss:              204800 kB\n\
Pss:              150000 kB\n\
Shared_Clean:      20000 kB\n\
Shared_Dirty:       4800 kB\n\
Private_Clean:     30000 kB\n\
Private_Dirty:    150000 kB\n\
Swap:               2048 kB\n";

    #[test]
    fn test_parse_status() {
        let fields = StatusFields::parse(STATUS);
        assert_eq!(fields.name, "firefox");
        assert_eq!(fields.swap, 2048 * 1024);
        assert_eq!(fields.involuntary_switches, 37);
    }

    #[test]
    fn test_parse_status_kernel_thread_has_no_vm() {
        let fields = StatusFields::parse("Name:\tkworker/0:1\nnonvoluntary_ctxt_switches:\t3\n");
        assert_eq!(fields.swap, 0);
        assert_eq!(fields.involuntary_switches, 3);
    }

    #[test]
    fn test_parse_uss() {
        assert_eq!(parse_uss(SMAPS_ROLLUP), 180_000 * 1024);
        assert_eq!(parse_uss(""), 0);
    }

    fn fake_proc(pid: u32, with_exe: bool) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("status"), STATUS).unwrap();
        fs::write(dir.join("smaps_rollup"), SMAPS_ROLLUP).unwrap();
        if with_exe {
            std::os::unix::fs::symlink("/usr/lib/firefox/firefox", dir.join("exe")).unwrap();
        }
        tmp
    }

    #[test]
    fn test_snapshot_from_fake_proc() {
        let tmp = fake_proc(4242, true);
        let provider = ProcfsMetricsProvider::with_root(tmp.path());

        let snap = provider.snapshot(4242).unwrap();
        assert_eq!(snap.exe, "/usr/lib/firefox/firefox");
        assert_eq!(snap.uss, 180_000 * 1024);
        assert_eq!(snap.swap, 2048 * 1024);
        assert_eq!(snap.involuntary_switches, 37);
    }

    #[test]
    fn test_snapshot_without_exe_uses_name() {
        let tmp = fake_proc(2, false);
        let provider = ProcfsMetricsProvider::with_root(tmp.path());

        assert_eq!(provider.snapshot(2).unwrap().exe, "[firefox]");
    }

    #[test]
    fn test_snapshot_falls_back_to_smaps() {
        let tmp = fake_proc(3, true);
        let dir = tmp.path().join("3");
        fs::remove_file(dir.join("smaps_rollup")).unwrap();
        fs::write(dir.join("smaps"), "Private_Clean: 4 kB\nPrivate_Dirty: 4 kB\n").unwrap();
        let provider = ProcfsMetricsProvider::with_root(tmp.path());

        assert_eq!(provider.snapshot(3).unwrap().uss, 8 * 1024);
    }

    #[test]
    fn test_snapshot_exited_process() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = ProcfsMetricsProvider::with_root(tmp.path());

        let err = provider.snapshot(999).unwrap_err();
        assert!(matches!(err, MonitorError::ProcessNotFound(999)), "got {err:?}");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_snapshot_self() {
        let provider = ProcfsMetricsProvider::new();
        let snap = provider.snapshot(std::process::id()).unwrap();
        assert!(!snap.exe.is_empty());
        assert!(snap.uss > 0, "own USS should be non-zero");
    }
}
