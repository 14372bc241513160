//! Statistics aggregation across workers
//!
//! Keeps one [`WorkerStats`] per worker id and computes a merged view on
//! demand. The merged view is cached until the next update.

use crate::stats::WorkerStats;
use crate::Result;
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-worker statistics with a cached aggregate
#[derive(Debug, Default)]
pub struct StatisticsAggregator {
    /// worker_id → stats, ordered by id for stable reports
    workers: BTreeMap<usize, WorkerStats>,

    aggregate_cache: Option<WorkerStats>,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker so it shows up in reports even if it never finishes
    /// a unit
    pub fn register_worker(&mut self, worker_id: usize) {
        self.workers.entry(worker_id).or_default();
    }

    /// Record a completed unit for `worker_id`
    pub fn record_unit(&mut self, worker_id: usize, positions: u64, matches: u64, elapsed: Duration) {
        self.workers
            .entry(worker_id)
            .or_default()
            .record_unit(positions, matches, elapsed);
        self.aggregate_cache = None;
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Merged statistics across all workers
    pub fn aggregate(&mut self) -> Result<&WorkerStats> {
        if self.aggregate_cache.is_none() {
            let mut aggregate = WorkerStats::new();
            for stats in self.workers.values() {
                aggregate.merge(stats)?;
            }
            self.aggregate_cache = Some(aggregate);
        }
        Ok(self.aggregate_cache.get_or_insert_with(WorkerStats::new))
    }

    pub fn worker_stats(&self, worker_id: usize) -> Option<&WorkerStats> {
        self.workers.get(&worker_id)
    }

    /// Per-worker statistics in ascending worker id order
    pub fn per_worker(&self) -> &BTreeMap<usize, WorkerStats> {
        &self.workers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregator_new() {
        let aggregator = StatisticsAggregator::new();
        assert_eq!(aggregator.num_workers(), 0);
    }

    #[test]
    fn test_register_worker() {
        let mut aggregator = StatisticsAggregator::new();
        aggregator.register_worker(0);
        aggregator.register_worker(1);
        aggregator.register_worker(1);
        assert_eq!(aggregator.num_workers(), 2);
        assert_eq!(aggregator.worker_stats(1).unwrap().units(), 0);
    }

    #[test]
    fn test_aggregate_empty() {
        let mut aggregator = StatisticsAggregator::new();
        let aggregate = aggregator.aggregate().unwrap();
        assert_eq!(aggregate.units(), 0);
        assert_eq!(aggregate.positions(), 0);
    }

    #[test]
    fn test_aggregate_multiple_workers() {
        let mut aggregator = StatisticsAggregator::new();
        aggregator.record_unit(0, 100, 1, Duration::from_micros(10));
        aggregator.record_unit(1, 100, 0, Duration::from_micros(20));
        aggregator.record_unit(1, 50, 2, Duration::from_micros(30));

        let aggregate = aggregator.aggregate().unwrap();
        assert_eq!(aggregate.units(), 3);
        assert_eq!(aggregate.positions(), 250);
        assert_eq!(aggregate.matches(), 3);
    }

    #[test]
    fn test_cache_invalidation() {
        let mut aggregator = StatisticsAggregator::new();
        aggregator.record_unit(0, 10, 0, Duration::from_micros(1));
        assert_eq!(aggregator.aggregate().unwrap().units(), 1);
        assert_eq!(aggregator.aggregate().unwrap().units(), 1);

        aggregator.record_unit(3, 10, 0, Duration::from_micros(1));
        assert_eq!(aggregator.aggregate().unwrap().units(), 2);
    }

    #[test]
    fn test_per_worker_ordered() {
        let mut aggregator = StatisticsAggregator::new();
        aggregator.register_worker(2);
        aggregator.register_worker(0);
        aggregator.register_worker(1);
        let ids: Vec<usize> = aggregator.per_worker().keys().copied().collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
