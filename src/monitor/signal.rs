//! SIGINT/SIGTERM handling.
//!
//! The handler only flips an atomic flag. The tick loop polls it between
//! sleep slices so a render is never cut off halfway.

use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn handle_shutdown(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Installs handlers for SIGINT and SIGTERM and returns the flag they set.
#[cfg(unix)]
#[allow(unsafe_code)]
pub fn install() -> &'static AtomicBool {
    // SAFETY: the handler is async-signal-safe (a single atomic store).
    unsafe {
        libc::signal(libc::SIGINT, handle_shutdown as *const () as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handle_shutdown as *const () as libc::sighandler_t);
    }
    &SHUTDOWN_REQUESTED
}

/// Returns the shutdown flag without installing handlers.
#[cfg(not(unix))]
pub fn install() -> &'static AtomicBool {
    &SHUTDOWN_REQUESTED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_sigterm_sets_flag() {
        let flag = install();
        // SAFETY: raising a signal we just installed a handler for.
        #[allow(unsafe_code)]
        unsafe {
            libc::raise(libc::SIGTERM);
        }
        assert!(flag.load(Ordering::SeqCst));
        assert!(std::ptr::eq(flag, &SHUTDOWN_REQUESTED));
    }
}
