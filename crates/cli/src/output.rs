//! Output formatting for CLI responses

use anyhow::{Error, Result};
use colored::*;
use serde_json::json;

use crate::commands::run::{RunReport, StopReason};
use crate::error::CliError;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error)
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to format error as JSON: {}", e),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

fn error_type_name(error: &Error) -> &'static str {
    match error.downcast_ref::<CliError>() {
        Some(CliError::SamplerStart { .. }) => "sampler_start",
        Some(CliError::InvalidConfiguration(_))
        | Some(CliError::JsonError(_))
        | Some(CliError::YamlError(_)) => "invalid_configuration",
        Some(CliError::Pool(_)) => "pool",
        Some(CliError::Sink(_)) => "sink",
        Some(CliError::IoError(_)) => "io",
        None => "unknown",
    }
}

/// Print the summary of a sampling run
pub fn print_run_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        let output = json!({
            "success": true,
            "report": report
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let reason = match report.stop_reason {
        StopReason::DurationElapsed => "duration elapsed",
        StopReason::Interrupted => "interrupted",
    };

    println!("{}", "Latency Sampling Report".bold());
    println!("  CPUs: {}", format_cpu_list(&report.cpus));
    println!("  Period: {} us", report.period_us);
    println!("  Elapsed: {} ms ({})", report.elapsed_ms, reason);
    println!("  Sink: {}", report.sink);
    println!("  Samples: {}", report.samples);

    if report.latency_threshold_us > 0 {
        let exceeded = if report.exceeded > 0 {
            report.exceeded.to_string().red()
        } else {
            report.exceeded.to_string().green()
        };
        println!(
            "  Exceeded: {} (threshold {} us)",
            exceeded, report.latency_threshold_us
        );
    } else {
        println!("  Exceeded: {}", "threshold disabled".dimmed());
    }

    if report.stop_on_exceeded {
        println!(
            "  {} stop_on_exceeded is set but does not stop sampling",
            "Note:".yellow()
        );
    }

    if report.dropped > 0 {
        println!("  Dropped events: {}", report.dropped.to_string().yellow());
    }

    println!(
        "  {} {} ns ({:.1} us)",
        "Max latency:".bold(),
        report.max_latency_ns,
        report.max_latency_ns as f64 / 1_000.0
    );
    Ok(())
}

/// Print the cores a run would sample
pub fn print_topology(cpus: &[u32], current: Option<u32>, json: bool) -> Result<()> {
    if json {
        let output = json!({
            "success": true,
            "cpus": cpus,
            "count": cpus.len(),
            "current_cpu": current
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "Active CPUs:".bold());
    println!("  {} ({} total)", format_cpu_list(cpus), cpus.len());
    if let Some(cpu) = current {
        println!("  Current: {}", cpu);
    }
    Ok(())
}

/// Render cores the way the kernel prints cpu lists (`0-3,5`)
fn format_cpu_list(cpus: &[u32]) -> String {
    let mut parts = Vec::new();
    let mut iter = cpus.iter().copied().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == end.checked_add(1).as_ref() {
            iter.next();
            end += 1;
        }
        parts.push(if start == end {
            start.to_string()
        } else {
            format!("{}-{}", start, end)
        });
    }

    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(",")
    }
}
