//! Prelude module for common sampler types.

pub use crate::config::{RuntimeConfig, RuntimeSettings, SamplerConfig};
pub use crate::error::{PoolError, PoolResult, SamplerError, SamplerResult};
pub use crate::pool::SamplerPool;
pub use crate::sampler::{Sampler, SamplerContext};
pub use crate::topology::{CpuTopology, StaticTopology, SystemTopology};
pub use crate::DEFAULT_PERIOD_NS;
