//! runsearch - parallel search for runs of consecutive integers
//!
//! Finds every starting position `x` in `[1, N]` such that the sum of the
//! squares of `x, x+1, ..., x+K-1` is a perfect square. The range is cut
//! into batches, each batch into work units, and a pool of worker threads
//! evaluates the units while a single coordinator collects the results.
//!
//! # Architecture
//!
//! - **Scheduler**: batch plan, range partitioning, round-robin dispatch
//! - **Coordinator**: single-owner state machine driven by worker messages
//! - **Workers**: one OS thread each, optional CPU pinning
//! - **Predicate**: pluggable `(start, k) -> bool` check
//! - **Stats**: per-worker unit latency histograms and a JSON run report

pub mod config;
pub mod coordinator;
pub mod error;
pub mod output;
pub mod predicate;
pub mod scheduler;
pub mod stats;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{Coordinator, RunReport};
pub use error::SchedulerError;
pub use predicate::{Predicate, SquareSumPredicate};

use std::sync::Arc;

/// Result type used throughout runsearch
pub type Result<T> = anyhow::Result<T>;

/// Run a square-sum search with the given configuration
pub fn run_search(config: Config) -> Result<RunReport> {
    Coordinator::new(Arc::new(config), Arc::new(SquareSumPredicate)).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SchedulerConfig, SearchConfig};

    #[test]
    fn test_run_search() {
        let config = Config {
            search: SearchConfig { n: 1000, k: 2 },
            scheduler: SchedulerConfig {
                workers: Some(2),
                batch_size: 100,
                ..Default::default()
            },
            output: config::OutputConfig {
                sort_results: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let report = run_search(config).unwrap();
        assert_eq!(report.matches, vec![3, 20, 119, 696]);
    }
}
