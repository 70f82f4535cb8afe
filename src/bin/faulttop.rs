//! faulttop - page-fault and blocked-time contention monitor.
//!
//! Run: `faulttop` (refreshes every second until Ctrl-C)
//! One-shot: `faulttop --once --no-color`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use faulttop::monitor::collectors::{ProcfsCounterSource, ProcfsMetricsProvider, PROC_ROOT};
use faulttop::monitor::{
    logging, signal, Aggregator, App, Config, TerminalPresenter, TickOutcome,
};

/// faulttop: rank processes by page-fault contention
#[derive(Parser, Debug)]
#[command(name = "faulttop")]
#[command(version)]
#[command(about = "Live page-fault and blocked-time contention monitor", long_about = None)]
struct Cli {
    /// Refresh interval in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Number of processes to show
    #[arg(short = 'n', long)]
    top: Option<usize>,

    /// Render once and exit
    #[arg(long)]
    once: bool,

    /// Disable row colours
    #[arg(long)]
    no_color: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr (also FAULTTOP_DEBUG=1)
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Config::default_path().map(Config::load_or_default).unwrap_or_default(),
        };

        if let Some(ms) = self.interval_ms {
            config.update_ms = ms;
        }
        if let Some(top) = self.top {
            config.top_k = top;
        }
        if self.no_color {
            config.color = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug || logging::debug_from_env());

    let config = cli.config()?;
    tracing::debug!(?config, "configuration loaded");

    let provider = Arc::new(ProcfsMetricsProvider::new());
    let aggregator = Aggregator::new(provider, config.aggregator_options());
    let presenter = TerminalPresenter::new(std::io::stdout(), config.command_width)
        .with_color(config.color)
        .with_clear(!cli.once);
    let shutdown = signal::install();

    let mut app = App::new(
        Box::new(ProcfsCounterSource::new()),
        aggregator,
        presenter,
        config.update_interval(),
        shutdown,
    );
    if config.show_memory_summary {
        app = app.with_memory_summary(PROC_ROOT);
    }

    if cli.once {
        if app.run_once()? == TickOutcome::Skipped {
            anyhow::bail!("counter source unavailable, nothing rendered");
        }
    } else {
        app.run()?;
    }
    Ok(())
}
