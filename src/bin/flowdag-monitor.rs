// src/bin/flowdag-monitor.rs

//! Read-only progress monitor for a running (or finished) flow.
//!
//! Started either by hand or by `flowdag --monitor`; it only ever reads the
//! flow definition, the completion file and PID files, and keeps rendering
//! until killed.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use flowdag::cli::LogLevel;
use flowdag::exec::SysinfoProbe;
use flowdag::logging;
use flowdag::monitor::{run_monitor, MonitorOptions};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "flowdag-monitor",
    version,
    about = "Live read-only view of a flowdag run.",
    long_about = None
)]
struct MonitorArgs {
    /// Flow definition the run was started from (for task names).
    #[arg(long, value_name = "PATH")]
    flow: PathBuf,

    /// Completion file of the run to watch.
    #[arg(long, value_name = "PATH")]
    completed: PathBuf,

    /// Run identity; enables in-flight task detection via PID files.
    #[arg(long, value_name = "ID")]
    run_id: Option<String>,

    /// Directory holding status/PID files (default: system temp dir).
    #[arg(long, value_name = "PATH")]
    scratch_dir: Option<PathBuf>,

    /// Refresh interval in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 2)]
    refresh: u64,

    /// Logging level (error, warn, info, debug, trace).
    #[arg(long, value_enum, value_name = "LEVEL")]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() {
    let args = MonitorArgs::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("flowdag-monitor error: {err}");
        std::process::exit(1);
    }

    let opts = MonitorOptions {
        flow: args.flow,
        completed: args.completed,
        run_id: args.run_id,
        scratch_dir: args.scratch_dir.unwrap_or_else(std::env::temp_dir),
        refresh: Duration::from_secs(args.refresh.max(1)),
    };

    let probe = SysinfoProbe::new();
    if let Err(err) = run_monitor(&opts, &probe).await {
        eprintln!("flowdag-monitor error: {err}");
        std::process::exit(1);
    }
}
