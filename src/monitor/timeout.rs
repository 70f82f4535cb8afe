//! Bounded execution of blocking calls.
//!
//! Reading `/proc/<pid>/smaps_rollup` for a process stuck in uninterruptible
//! sleep (or a zombie with a wedged mm) can block for a long time. Resolution
//! calls are therefore run on a helper thread and abandoned after a timeout so
//! a single process cannot stall the whole tick.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Result of a call run with a timeout.
#[derive(Debug)]
pub enum TimedCall<T> {
    /// The call finished in time.
    Completed(T),
    /// The call did not finish in time. The helper thread is left to finish
    /// on its own and its result is dropped.
    Timeout,
    /// The helper thread could not be spawned.
    SpawnError,
    /// The helper thread died without sending a result (the call panicked).
    Disconnected,
}

/// Runs `f` on a helper thread and waits at most `timeout` for its result.
pub fn call_with_timeout<T, F>(f: F, timeout: Duration) -> TimedCall<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    let spawned = thread::Builder::new().name("faulttop-resolve".to_string()).spawn(move || {
        let _ = tx.send(f());
    });
    if spawned.is_err() {
        return TimedCall::SpawnError;
    }

    match rx.recv_timeout(timeout) {
        Ok(v) => TimedCall::Completed(v),
        Err(mpsc::RecvTimeoutError::Timeout) => TimedCall::Timeout,
        Err(mpsc::RecvTimeoutError::Disconnected) => TimedCall::Disconnected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_fast_call_completes() {
        let result = call_with_timeout(|| 40 + 2, Duration::from_secs(1));
        assert!(matches!(result, TimedCall::Completed(42)));
    }

    #[test]
    fn test_slow_call_times_out() {
        let start = Instant::now();
        let result = call_with_timeout(
            || {
                thread::sleep(Duration::from_secs(5));
                1
            },
            Duration::from_millis(50),
        );
        let elapsed = start.elapsed();

        assert!(matches!(result, TimedCall::Timeout));
        assert!(elapsed < Duration::from_secs(1), "Should timeout quickly, took {:?}", elapsed);
    }

    #[test]
    fn test_panicking_call_reports_disconnected() {
        let result: TimedCall<u32> = call_with_timeout(|| panic!("boom"), Duration::from_secs(1));
        assert!(matches!(result, TimedCall::Disconnected));
    }
}
