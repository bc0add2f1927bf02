//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "sampler", version, about = "Propulsion test-bench sampler")]
pub struct Cli {
    /// Path to config TOML; bench defaults are used when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print results and logs as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Do not echo the transcript on stdout
    #[arg(long, short, action = ArgAction::SetTrue)]
    pub quiet: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manual sweep: stream readings for a fixed time, then stop
    Sweep {
        /// How long to sample, in ms
        #[arg(long, value_name = "MS")]
        duration_ms: u64,
        /// Throttle level (0..=65) applied before the sweep starts
        #[arg(long, value_name = "LEVEL")]
        throttle: Option<f64>,
    },
    /// Automatic sequence: countdown, then `steps` throttle levels from 0 to 65
    Period {
        /// Time spent at each level, in ms
        #[arg(long, value_name = "MS", allow_hyphen_values = true)]
        period_ms: i64,
        /// Number of levels
        #[arg(long, allow_hyphen_values = true)]
        steps: i64,
        /// Countdown ticks before stepping; overrides [sampling].countdown_s
        #[arg(long, value_name = "N")]
        countdown: Option<u32>,
    },
    /// Decode a recorded transcript (stdin when FILE is omitted)
    Decode {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Open the device and check the link
    SelfCheck,
}
