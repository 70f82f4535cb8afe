//! Per-row resolution failures must reach the log at the default level.
#![allow(clippy::unwrap_used)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use faulttop::monitor::aggregator::{Aggregator, AggregatorOptions};
use faulttop::monitor::error::{MonitorError, Result};
use faulttop::monitor::logging::default_level;
use faulttop::monitor::types::{CounterSource, MetricsProvider, Pid, ProcessSnapshot};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Table(Vec<(Pid, u64)>);

impl CounterSource for Table {
    fn id(&self) -> &'static str {
        "table"
    }

    fn fault_counts(&mut self) -> Result<Vec<(Pid, u64)>> {
        Ok(self.0.clone())
    }

    fn blocked_duration(&self, _pid: Pid) -> u64 {
        0
    }
}

/// Pid 4242 has exited, pid 31 is not ours to read, everything else resolves.
struct PartlyGone;

impl MetricsProvider for PartlyGone {
    fn snapshot(&self, pid: Pid) -> Result<ProcessSnapshot> {
        match pid {
            4242 => Err(MonitorError::ProcessNotFound(pid)),
            31 => Err(MonitorError::PermissionDenied(format!("pid {pid}"))),
            _ => Ok(ProcessSnapshot { exe: format!("/bin/{pid}"), ..Default::default() }),
        }
    }
}

fn tick_with_default_logging(snapshot: Vec<(Pid, u64)>) -> (usize, String) {
    let captured = Captured::default();
    let writer = captured.clone();
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(false).into())
        .parse_lossy("");
    let subscriber = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(move || writer.clone()).with_ansi(false))
        .with(filter);

    let options = AggregatorOptions {
        resolve_timeout: None,
        stale_after: 0,
        self_pid: 0,
        ..AggregatorOptions::default()
    };
    let mut agg = Aggregator::new(Arc::new(PartlyGone), options);
    let rows = tracing::subscriber::with_default(subscriber, || {
        agg.tick(&mut Table(snapshot)).unwrap()
    });
    (rows.len(), captured.text())
}

#[test]
fn test_exited_process_is_reported_at_default_level() {
    let (rows, log) = tick_with_default_logging(vec![(4242, 10), (7, 5)]);

    assert_eq!(rows, 1);
    assert!(log.contains("4242"), "exited pid missing from log: {log:?}");
    assert!(log.contains("WARN"), "failure should be a warning: {log:?}");
    assert!(log.contains("gone=true"), "exit should be tagged: {log:?}");
}

#[test]
fn test_every_failed_row_is_reported() {
    let (rows, log) = tick_with_default_logging(vec![(4242, 30), (31, 20), (7, 10)]);

    assert_eq!(rows, 1);
    assert!(log.contains("4242"), "log: {log:?}");
    assert!(log.contains("pid=31"), "log: {log:?}");
    assert!(log.contains("gone=false"), "permission failure is not an exit: {log:?}");
    assert!(!log.contains("pid=7 "), "resolved rows are not logged: {log:?}");
}

#[test]
fn test_clean_tick_logs_nothing() {
    let (rows, log) = tick_with_default_logging(vec![(7, 5), (8, 4)]);

    assert_eq!(rows, 2);
    assert!(log.is_empty(), "debug sampling line leaked at warn level: {log:?}");
}
