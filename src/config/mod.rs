//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! Every section has serde defaults so a TOML file only needs the keys it
//! wants to change.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::scheduler::batch::{DEFAULT_BATCH_SIZE, DEFAULT_FAN_OUT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// What to search for
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    /// Inclusive upper bound of the starting positions searched (`[1, n]`)
    #[serde(default)]
    pub n: u64,
    /// Run length
    #[serde(default)]
    pub k: u64,
}

/// How the search is parallelized
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Worker threads (None = one per logical CPU)
    pub workers: Option<usize>,
    /// Starting positions per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    /// Target number of units per worker per batch
    #[serde(default = "default_fan_out")]
    pub fan_out: u64,
    /// CPU cores to pin workers to (e.g. "0,2-4")
    pub cpu_cores: Option<String>,
}

fn default_batch_size() -> u64 {
    DEFAULT_BATCH_SIZE
}

fn default_fan_out() -> u64 {
    DEFAULT_FAN_OUT
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: None,
            batch_size: default_batch_size(),
            fan_out: default_fan_out(),
            cpu_cores: None,
        }
    }
}

impl SchedulerConfig {
    /// Worker count after resolving the CPU-count default
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    /// Sort matches ascending before printing (default: arrival order)
    #[serde(default)]
    pub sort_results: bool,
    /// Print scheduling statistics to stderr
    #[serde(default)]
    pub show_stats: bool,
    /// Write a JSON run report to this path
    pub json_output: Option<PathBuf>,
}

/// Runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Validate and print the configuration without searching
    #[serde(default)]
    pub dry_run: bool,
    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Search: {}", self.search)?;
        writeln!(f, "  Scheduler: {}", self.scheduler)?;
        writeln!(f, "  Output: {}", self.output)?;
        Ok(())
    }
}

impl fmt::Display for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={}, k={}", self.n, self.k)
    }
}

impl fmt::Display for SchedulerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.workers {
            Some(workers) => write!(f, "workers={}", workers)?,
            None => write!(f, "workers=auto({})", self.worker_count())?,
        }
        write!(f, ", batch_size={}, fan_out={}", self.batch_size, self.fan_out)?;
        if let Some(ref cores) = self.cpu_cores {
            write!(f, ", cpu_cores={}", cores)?;
        }
        Ok(())
    }
}

impl fmt::Display for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "order={}",
            if self.sort_results { "sorted" } else { "arrival" }
        )?;
        if self.show_stats {
            write!(f, ", stats")?;
        }
        if let Some(ref path) = self.json_output {
            write!(f, ", json={}", path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.scheduler.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.scheduler.fan_out, DEFAULT_FAN_OUT);
        assert!(config.scheduler.workers.is_none());
        assert!(!config.output.sort_results);
        assert!(!config.runtime.dry_run);
    }

    #[test]
    fn test_worker_count_auto() {
        let scheduler = SchedulerConfig::default();
        assert_eq!(scheduler.worker_count(), num_cpus::get());

        let fixed = SchedulerConfig {
            workers: Some(3),
            ..Default::default()
        };
        assert_eq!(fixed.worker_count(), 3);
    }

    #[test]
    fn test_display() {
        let config = Config {
            search: SearchConfig { n: 100, k: 24 },
            scheduler: SchedulerConfig {
                workers: Some(2),
                batch_size: 50,
                fan_out: 4,
                cpu_cores: Some("0-1".to_string()),
            },
            output: OutputConfig {
                sort_results: true,
                ..Default::default()
            },
            runtime: RuntimeConfig::default(),
        };
        let text = config.to_string();
        assert!(text.contains("n=100, k=24"));
        assert!(text.contains("workers=2, batch_size=50, fan_out=4, cpu_cores=0-1"));
        assert!(text.contains("order=sorted"));
    }
}
