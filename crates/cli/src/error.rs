//! Error types for timerlatctl CLI

use thiserror::Error;
use timerlat_sampler::PoolError;
use timerlat_tracing::TracingError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Could not start sampling thread on cpu {cpu}")]
    SamplerStart {
        cpu: u32,
        #[source]
        source: PoolError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Sampler pool error: {0}")]
    Pool(#[source] PoolError),

    #[error("Trace sink error: {0}")]
    Sink(#[from] TracingError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl From<PoolError> for CliError {
    fn from(error: PoolError) -> Self {
        match error {
            PoolError::InvalidConfig(message) => CliError::InvalidConfiguration(message),
            other => match other.cpu() {
                Some(cpu) => CliError::SamplerStart { cpu, source: other },
                None => CliError::Pool(other),
            },
        }
    }
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::SamplerStart { .. } => 2,
            CliError::InvalidConfiguration(_)
            | CliError::JsonError(_)
            | CliError::YamlError(_) => 3,
            CliError::Sink(TracingError::InvalidConfiguration(_)) => 3,
            _ => 1,
        }
    }
}
