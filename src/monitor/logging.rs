//! Diagnostic logging.
//!
//! Events go to stderr so they never interleave with the table on stdout.
//! Enabled at `debug` level via the `--debug` flag or `FAULTTOP_DEBUG=1`;
//! `RUST_LOG` directives are honoured on top of the chosen level.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable that turns on debug logging.
pub const DEBUG_ENV: &str = "FAULTTOP_DEBUG";

/// Returns true if `FAULTTOP_DEBUG` is set to a truthy value.
#[must_use]
pub fn debug_from_env() -> bool {
    std::env::var(DEBUG_ENV).is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Level used when no `RUST_LOG` directive overrides it.
#[must_use]
pub fn default_level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(debug: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(debug).into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}
