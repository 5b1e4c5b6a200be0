//! `topology`: list the cores a run would sample

use anyhow::Result;
use timerlat_sampler::{CpuTopology, PoolError, SystemTopology, current_cpu};

use crate::error::CliError;
use crate::output;

/// Execute `topology`
pub fn execute(json: bool) -> Result<()> {
    let topology = SystemTopology::new();
    let snapshot = topology
        .snapshot()
        .map_err(|e| CliError::from(PoolError::from(e)))?;

    output::print_topology(snapshot.cpus(), current_cpu(), json)
}
