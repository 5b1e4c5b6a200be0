//! Run settings: config file merged with command-line overrides

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use timerlat_sampler::{RuntimeSettings, SamplerConfig};
use timerlat_tracing::SinkKind;

use crate::commands::RunArgs;
use crate::error::CliError;

/// Everything a `run` needs, as read from a settings file.
///
/// ```yaml
/// sampler:
///   period_us: 500
///   pin_threads: true
/// runtime:
///   latency_threshold_us: 100
/// sink: log
/// duration_ms: 10000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub sampler: SamplerConfig,
    pub runtime: RuntimeSettings,
    pub sink: Option<String>,
    pub duration_ms: Option<u64>,
}

impl Settings {
    /// Load a settings file, choosing the format by extension.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(&content)?),
            _ => Err(CliError::InvalidConfiguration(format!(
                "unsupported settings file '{}': expected .json, .yaml or .yml",
                path.display()
            ))),
        }
    }

    /// File settings (if any) with command-line flags applied on top.
    pub fn resolve(args: &RunArgs) -> Result<Self, CliError> {
        let mut settings = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(args);
        settings
            .sampler
            .validate()
            .map_err(CliError::InvalidConfiguration)?;
        Ok(settings)
    }

    fn apply_overrides(&mut self, args: &RunArgs) {
        if let Some(period_us) = args.period_us {
            self.sampler.period_us = period_us;
        }
        if let Some(threshold_us) = args.threshold_us {
            self.runtime.latency_threshold_us = threshold_us;
        }
        if args.stop_on_exceeded {
            self.runtime.stop_on_exceeded = true;
        }
        if args.no_pin {
            self.sampler.pin_threads = false;
        }
        if let Some(sink) = &args.sink {
            self.sink = Some(sink.clone());
        }
        if args.duration_ms.is_some() {
            self.duration_ms = args.duration_ms;
        }
    }

    /// Requested trace sink, `auto` when unset.
    pub fn sink_kind(&self) -> Result<SinkKind, CliError> {
        match &self.sink {
            Some(name) => name
                .parse()
                .map_err(|e: timerlat_tracing::TracingError| {
                    CliError::InvalidConfiguration(e.to_string())
                }),
            None => Ok(SinkKind::Auto),
        }
    }
}
