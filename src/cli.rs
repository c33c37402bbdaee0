// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `flowdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "flowdag",
    version,
    about = "Run a declarative task flow as supervised OS processes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the flow definition (TOML).
    ///
    /// Default: `Flowdag.toml` in the current working directory.
    #[arg(long = "flow", value_name = "PATH", default_value = "Flowdag.toml")]
    pub flow: String,

    /// First task of the execution range (inclusive).
    #[arg(long, value_name = "NAME", conflicts_with = "only")]
    pub start: Option<String>,

    /// Last task of the execution range (inclusive).
    #[arg(long, value_name = "NAME", conflicts_with = "only")]
    pub end: Option<String>,

    /// Run only this task (a group resolves to its leaf tasks).
    ///
    /// Dependencies of the task are NOT pulled in automatically.
    #[arg(long, value_name = "NAME")]
    pub only: Option<String>,

    /// Ignore previously recorded completions and continue past failed tasks.
    #[arg(long)]
    pub force: bool,

    /// Maximum number of attempts per task before it is recorded as Failed.
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub max_retries: u32,

    /// Run all tasks sequentially in this terminal instead of one window per
    /// task. Useful for debugging or headless machines.
    #[arg(long)]
    pub single_term: bool,

    /// Terminal emulator for per-task windows.
    #[arg(long, value_enum, value_name = "TERMINAL", default_value = "auto")]
    pub terminal: TerminalChoice,

    /// Launch the read-only monitor as a sibling process.
    #[arg(long)]
    pub monitor: bool,

    /// Wall-clock ceiling per task attempt, in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 864_000)]
    pub timeout: u64,

    /// Proceed without the interactive confirmation prompt.
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FLOWDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the execution plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Terminal emulator choice as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum TerminalChoice {
    Auto,
    Xterm,
    GnomeTerminal,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
