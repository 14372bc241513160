//! Run statistics
//!
//! Statistics are recorded by the coordinator as result messages arrive, so
//! they follow the same single-writer discipline as the rest of the run state:
//! plain counters, no atomics.
//!
//! - `WorkerStats`: what one worker did (units, positions evaluated, matches,
//!   time spent processing)
//! - `aggregator::StatisticsAggregator`: per-worker map plus merged view
//! - `histogram::LatencyHistogram`: per-unit processing time distribution
//!
//! # Example
//!
//! ```
//! use runsearch::stats::WorkerStats;
//! use std::time::Duration;
//!
//! let mut stats = WorkerStats::new();
//! stats.record_unit(1000, 2, Duration::from_micros(250));
//!
//! assert_eq!(stats.units(), 1);
//! assert_eq!(stats.positions(), 1000);
//! assert_eq!(stats.matches(), 2);
//! ```

pub mod aggregator;
pub mod histogram;

use crate::Result;
use histogram::LatencyHistogram;
use std::time::Duration;

/// Statistics for a single worker
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    units: u64,
    positions: u64,
    matches: u64,
    busy: Duration,
    unit_latency: LatencyHistogram,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed unit
    ///
    /// * `positions` - number of starting positions the unit covered
    /// * `matches` - how many of them satisfied the predicate
    /// * `elapsed` - time the worker spent evaluating the unit
    pub fn record_unit(&mut self, positions: u64, matches: u64, elapsed: Duration) {
        self.units += 1;
        self.positions += positions;
        self.matches += matches;
        self.busy += elapsed;
        self.unit_latency.record(elapsed);
    }

    pub fn units(&self) -> u64 {
        self.units
    }

    pub fn positions(&self) -> u64 {
        self.positions
    }

    pub fn matches(&self) -> u64 {
        self.matches
    }

    /// Total time spent evaluating units
    pub fn busy(&self) -> Duration {
        self.busy
    }

    pub fn unit_latency(&self) -> &LatencyHistogram {
        &self.unit_latency
    }

    /// Positions evaluated per second of busy time
    pub fn positions_per_sec(&self) -> f64 {
        let secs = self.busy.as_secs_f64();
        if secs > 0.0 {
            self.positions as f64 / secs
        } else {
            0.0
        }
    }

    /// Fold another worker's statistics into this one
    pub fn merge(&mut self, other: &WorkerStats) -> Result<()> {
        self.units += other.units;
        self.positions += other.positions;
        self.matches += other.matches;
        self.busy += other.busy;
        self.unit_latency.merge(&other.unit_latency)?;
        Ok(())
    }
}

/// Scheduling counters for a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Batches that reached completion (empty batches included)
    pub batches_completed: u64,
    /// Units handed to a worker inbox
    pub units_dispatched: u64,
    /// Completion signals received
    pub units_completed: u64,
    /// Units that could not be delivered
    pub units_dropped: u64,
}
