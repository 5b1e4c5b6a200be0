//! timerlatctl - per-core timer wake latency sampler
//!
//! Starts a pinned sampler on every active core, measures how late each
//! core's high-priority timer context wakes relative to its absolute
//! deadline, and reports the worst case seen.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod completion;
mod error;
mod output;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::RunArgs;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "timerlatctl")]
#[command(about = "Timer latency sampler - measure wake latency of pinned timers on every core")]
#[command(version)]
#[command(long_about = "
timerlatctl arms a one-shot absolute-deadline timer on every active core and
records how late each timer callback runs. Samples above a threshold are
reported as exceeded; the maximum latency across all cores is printed when
sampling stops.

Use --json for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample every active core until the duration elapses or Ctrl-C
    Run(RunArgs),

    /// Show the cores a run would sample
    Topology,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "timerlatctl={level},timerlat_sampler={level},timerlat_tracing={level}",
                    level = log_level
                )
                .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let result = execute_command(&cli).await;

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }

            let exit_code = e
                .downcast_ref::<CliError>()
                .map(CliError::exit_code)
                .unwrap_or(1);

            std::process::exit(exit_code);
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => commands::run::execute(args, cli.json).await,
        Commands::Topology => commands::topology::execute(cli.json),
        Commands::Completion { shell } => {
            completion::generate_completion(*shell);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_run_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["timerlatctl", "run"])?;
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        match &cli.command {
            Commands::Run(args) => {
                assert!(args.duration_ms.is_none());
                assert!(args.period_us.is_none());
                assert!(args.config.is_none());
                assert!(!args.no_pin);
            }
            _ => return Err("expected Run command".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_run_all_flags() -> TestResult {
        let cli = Cli::try_parse_from([
            "timerlatctl",
            "run",
            "--duration-ms",
            "250",
            "--threshold-us",
            "80",
            "--stop-on-exceeded",
            "--period-us",
            "500",
            "--sink",
            "null",
            "--config",
            "timerlat.yaml",
            "--no-pin",
        ])?;
        match &cli.command {
            Commands::Run(args) => {
                assert_eq!(args.duration_ms, Some(250));
                assert_eq!(args.threshold_us, Some(80));
                assert!(args.stop_on_exceeded);
                assert_eq!(args.period_us, Some(500));
                assert_eq!(args.sink.as_deref(), Some("null"));
                assert_eq!(
                    args.config.as_deref(),
                    Some(std::path::Path::new("timerlat.yaml"))
                );
                assert!(args.no_pin);
            }
            _ => return Err("expected Run command".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_negative_threshold() -> TestResult {
        let cli = Cli::try_parse_from(["timerlatctl", "run", "--threshold-us", "-5"])?;
        match &cli.command {
            Commands::Run(args) => assert_eq!(args.threshold_us, Some(-5)),
            _ => return Err("expected Run command".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_global_flags_after_subcommand() -> TestResult {
        let cli = Cli::try_parse_from(["timerlatctl", "topology", "--json", "-vv"])?;
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Topology));
        Ok(())
    }

    #[test]
    fn parse_completion_bash() -> TestResult {
        let cli = Cli::try_parse_from(["timerlatctl", "completion", "bash"])?;
        assert!(matches!(
            cli.command,
            Commands::Completion {
                shell: clap_complete::Shell::Bash
            }
        ));
        Ok(())
    }

    #[test]
    fn reject_no_subcommand() {
        assert!(Cli::try_parse_from(["timerlatctl"]).is_err());
    }

    #[test]
    fn reject_non_numeric_duration() {
        assert!(Cli::try_parse_from(["timerlatctl", "run", "--duration-ms", "soon"]).is_err());
    }

    #[test]
    fn reject_unknown_subcommand() {
        assert!(Cli::try_parse_from(["timerlatctl", "calibrate"]).is_err());
    }
}
