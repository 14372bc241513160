//! Batch planning
//!
//! The domain `[1, n]` is processed in sequential batches so that the number
//! of outstanding work units (and of results held by the coordinator between
//! completions) stays bounded. A [`BatchPlan`] is a pure description of that
//! split; the coordinator asks it for one [`Batch`] at a time.
//!
//! # Batch boundaries
//!
//! `total_batches = max(1, n / batch_size)`. Batch `i` (1-based) covers
//! `[(i - 1) * batch_size + 1, i * batch_size]`, except the last batch, which
//! always ends at `n`. The last batch can therefore hold up to
//! `2 * batch_size - 1` positions.

use crate::scheduler::partition::{partition, unit_count, WorkUnit};
use crate::error::SchedulerError;

/// Fan-out factor used when none is configured
pub const DEFAULT_FAN_OUT: u64 = 4;

/// Batch size used when none is configured
pub const DEFAULT_BATCH_SIZE: u64 = 1_000_000;

/// Largest accepted `workers * fan_out`
///
/// A batch splits into fewer than `2 * workers * fan_out` units, so this
/// also bounds the units held in flight per batch.
pub const MAX_UNIT_TARGET: u64 = 1 << 20;

/// One batch of the domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    /// 1-based batch index
    pub index: u64,
    pub low: u64,
    pub high: u64,
    pub unit_size: u64,
}

impl Batch {
    /// Number of starting positions in this batch (0 for an empty batch)
    pub fn work_count(&self) -> u64 {
        if self.low > self.high {
            0
        } else {
            self.high - self.low + 1
        }
    }

    /// True when the batch covers no positions (only possible for `n == 0`)
    pub fn is_empty(&self) -> bool {
        self.low > self.high
    }

    /// Number of units this batch splits into
    pub fn unit_count(&self) -> u64 {
        unit_count(self.low, self.high, self.unit_size)
    }

    /// Split the batch into work units; empty batches yield no units
    pub fn units(&self) -> Result<Vec<WorkUnit>, SchedulerError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        partition(self.low, self.high, self.unit_size)
    }
}

/// Division of `[1, n]` into batches for a pool of a given size
///
/// # Example
///
/// ```
/// use runsearch::scheduler::batch::BatchPlan;
///
/// let plan = BatchPlan::new(25, 10, 2, 4);
/// assert_eq!(plan.total_batches(), 2);
///
/// let last = plan.batch(2).unwrap();
/// assert_eq!((last.low, last.high), (11, 25));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    n: u64,
    batch_size: u64,
    worker_count: u64,
    fan_out: u64,
}

impl BatchPlan {
    /// Create a plan; zero `batch_size`, `worker_count` or `fan_out` are
    /// treated as 1
    pub fn new(n: u64, batch_size: u64, worker_count: usize, fan_out: u64) -> Self {
        Self {
            n,
            batch_size: batch_size.max(1),
            worker_count: (worker_count as u64).max(1),
            fan_out: fan_out.max(1),
        }
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// `max(1, n / batch_size)`
    pub fn total_batches(&self) -> u64 {
        (self.n / self.batch_size).max(1)
    }

    /// Unit size for a batch holding `work_count` positions
    ///
    /// Aims for `fan_out` units per worker so a single slow unit does not
    /// leave the rest of the pool idle at the end of a batch.
    pub fn unit_size_for(&self, work_count: u64) -> u64 {
        let divisor = self.worker_count.saturating_mul(self.fan_out);
        (work_count / divisor).max(1)
    }

    /// Batch `index` (1-based), or `None` if out of range
    pub fn batch(&self, index: u64) -> Option<Batch> {
        let total = self.total_batches();
        if index == 0 || index > total {
            return None;
        }

        let low = (index - 1).saturating_mul(self.batch_size).saturating_add(1);
        let high = if index == total {
            self.n
        } else {
            index.saturating_mul(self.batch_size).min(self.n)
        };

        let work_count = if low > high { 0 } else { high - low + 1 };
        Some(Batch {
            index,
            low,
            high,
            unit_size: self.unit_size_for(work_count),
        })
    }

    /// Iterate all batches in increasing index order
    pub fn batches(&self) -> impl Iterator<Item = Batch> + '_ {
        (1..=self.total_batches()).filter_map(move |i| self.batch(i))
    }

    /// Total number of units across every batch
    pub fn total_units(&self) -> u64 {
        self.batches().map(|b| b.unit_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_target_bounds_units_per_batch() {
        let plan = BatchPlan::new(10_000_000, 10_000_000, 1, MAX_UNIT_TARGET);
        let batch = plan.batch(1).unwrap();
        assert_eq!(batch.unit_size, 9);
        assert!(batch.unit_count() < 2 * MAX_UNIT_TARGET);

        // Fewer positions than the target: one position per unit
        let small = BatchPlan::new(1_000, 1_000, 1, MAX_UNIT_TARGET);
        assert_eq!(small.batch(1).unwrap().unit_count(), 1_000);
    }

    fn assert_batches_cover(plan: &BatchPlan) {
        let batches: Vec<Batch> = plan.batches().collect();
        assert_eq!(batches.len() as u64, plan.total_batches());

        if plan.n() == 0 {
            assert_eq!(batches.len(), 1);
            assert!(batches[0].is_empty());
            return;
        }

        assert_eq!(batches[0].low, 1);
        assert_eq!(batches.last().unwrap().high, plan.n());
        for pair in batches.windows(2) {
            assert_eq!(pair[0].high + 1, pair[1].low);
            assert_eq!(pair[0].index + 1, pair[1].index);
        }
        let covered: u64 = batches.iter().map(|b| b.work_count()).sum();
        assert_eq!(covered, plan.n());
    }

    #[test]
    fn test_total_batches() {
        assert_eq!(BatchPlan::new(0, 10, 1, 4).total_batches(), 1);
        assert_eq!(BatchPlan::new(5, 10, 1, 4).total_batches(), 1);
        assert_eq!(BatchPlan::new(10, 10, 1, 4).total_batches(), 1);
        assert_eq!(BatchPlan::new(25, 10, 1, 4).total_batches(), 2);
        assert_eq!(BatchPlan::new(30, 10, 1, 4).total_batches(), 3);
    }

    #[test]
    fn test_last_batch_clamped_to_n() {
        let plan = BatchPlan::new(29, 10, 1, 4);
        assert_eq!(plan.total_batches(), 2);
        let first = plan.batch(1).unwrap();
        let second = plan.batch(2).unwrap();
        assert_eq!((first.low, first.high), (1, 10));
        assert_eq!((second.low, second.high), (11, 29));
    }

    #[test]
    fn test_n_smaller_than_batch_size() {
        let plan = BatchPlan::new(3, 1_000_000, 8, 4);
        let only = plan.batch(1).unwrap();
        assert_eq!((only.low, only.high), (1, 3));
        assert_eq!(only.unit_size, 1);
        assert_eq!(only.unit_count(), 3);
    }

    #[test]
    fn test_empty_domain() {
        let plan = BatchPlan::new(0, 10, 4, 4);
        let only = plan.batch(1).unwrap();
        assert!(only.is_empty());
        assert_eq!(only.work_count(), 0);
        assert_eq!(only.unit_count(), 0);
        assert!(only.units().unwrap().is_empty());
        assert_eq!(plan.total_units(), 0);
    }

    #[test]
    fn test_batch_out_of_range() {
        let plan = BatchPlan::new(30, 10, 1, 4);
        assert!(plan.batch(0).is_none());
        assert!(plan.batch(4).is_none());
    }

    #[test]
    fn test_unit_size_fan_out() {
        let plan = BatchPlan::new(10_000, 1_000, 5, 4);
        // 1000 positions / (5 workers * 4)
        assert_eq!(plan.batch(1).unwrap().unit_size, 50);
        assert_eq!(plan.batch(1).unwrap().unit_count(), 20);
    }

    #[test]
    fn test_unit_size_never_zero() {
        let plan = BatchPlan::new(10, 10, 1000, 4);
        assert_eq!(plan.batch(1).unwrap().unit_size, 1);
    }

    #[test]
    fn test_batches_cover_domain() {
        for n in [0u64, 1, 2, 9, 10, 11, 99, 100, 101, 1234] {
            for batch_size in [1u64, 3, 10, 100, 5000] {
                assert_batches_cover(&BatchPlan::new(n, batch_size, 3, 4));
            }
        }
    }

    #[test]
    fn test_batch_units_cover_batch() {
        let plan = BatchPlan::new(1_000, 300, 2, 4);
        for batch in plan.batches() {
            let units = batch.units().unwrap();
            assert_eq!(units.len() as u64, batch.unit_count());
            assert_eq!(units[0].start, batch.low);
            assert_eq!(units.last().unwrap().end, batch.high);
        }
    }

    #[test]
    fn test_zero_parameters_clamped() {
        let plan = BatchPlan::new(10, 0, 0, 0);
        assert_eq!(plan.batch_size(), 1);
        assert_eq!(plan.total_batches(), 10);
        assert_eq!(plan.batch(1).unwrap().unit_size, 1);
    }
}
