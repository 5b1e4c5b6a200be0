//! Command definitions and implementations

pub mod run;
pub mod topology;

use clap::Args;
use std::path::PathBuf;

/// Options for `timerlatctl run`
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Stop after this many milliseconds (default: run until Ctrl-C)
    #[arg(short, long, value_name = "MS")]
    pub duration_ms: Option<u64>,

    /// Report samples above this latency as exceeded (0 or less disables)
    #[arg(
        short,
        long,
        value_name = "US",
        env = "TIMERLAT_THRESHOLD_US",
        allow_negative_numbers = true
    )]
    pub threshold_us: Option<i64>,

    /// Record the intent to stop on a threshold violation
    #[arg(long, env = "TIMERLAT_STOP_ON_EXCEEDED")]
    pub stop_on_exceeded: bool,

    /// Sampling period in microseconds
    #[arg(short, long, value_name = "US")]
    pub period_us: Option<u64>,

    /// Event sink: auto, trace-marker, log or null
    #[arg(long, value_name = "SINK")]
    pub sink: Option<String>,

    /// Settings file (.yaml, .yml or .json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Let sampler threads migrate between cores
    #[arg(long)]
    pub no_pin: bool,
}
