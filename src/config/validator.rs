//! Configuration validation

use super::*;
use crate::scheduler::batch::MAX_UNIT_TARGET;
use crate::worker::affinity;
use anyhow::{Context, Result};

/// Smallest accepted fan-out factor
pub const MIN_FAN_OUT: u64 = 2;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_search(&config.search)?;
    validate_scheduler(&config.scheduler)?;
    Ok(())
}

/// Validate search parameters
pub fn validate_search(search: &SearchConfig) -> Result<()> {
    if search.k == 0 {
        anyhow::bail!("k must be at least 1");
    }
    Ok(())
}

/// Validate scheduler configuration
pub fn validate_scheduler(scheduler: &SchedulerConfig) -> Result<()> {
    if scheduler.workers == Some(0) {
        anyhow::bail!("workers must be at least 1");
    }

    if scheduler.batch_size == 0 {
        anyhow::bail!("batch_size must be at least 1");
    }

    if scheduler.fan_out < MIN_FAN_OUT {
        anyhow::bail!(
            "fan_out must be at least {}, got {}",
            MIN_FAN_OUT,
            scheduler.fan_out
        );
    }

    let unit_target = (scheduler.worker_count() as u64).checked_mul(scheduler.fan_out);
    if !matches!(unit_target, Some(target) if target <= MAX_UNIT_TARGET) {
        anyhow::bail!(
            "workers ({}) x fan_out ({}) must not exceed {}",
            scheduler.worker_count(),
            scheduler.fan_out,
            MAX_UNIT_TARGET
        );
    }

    if let Some(ref cores) = scheduler.cpu_cores {
        affinity::parse_cpu_list(cores)
            .with_context(|| format!("Invalid cpu_cores: {}", cores))?;
    }

    affinity::warn_if_oversubscribed(scheduler.worker_count());

    Ok(())
}
