//! Round-robin dispatch of work units to the worker pool

use crate::scheduler::partition::WorkUnit;

/// Something that accepts work units without blocking
///
/// Implemented by the worker handle; tests substitute an in-memory inbox.
pub trait UnitSink {
    /// Queue `unit` for processing. Returns `false` if the receiving side is
    /// gone and the unit was not delivered.
    fn submit(&self, unit: WorkUnit) -> bool;
}

/// Outcome of one dispatch call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Units accepted by a worker inbox
    pub sent: u64,
    /// Units that could not be delivered (closed inbox or empty pool)
    pub dropped: u64,
    /// Units sent to each worker, indexed like the pool
    pub per_worker: Vec<u64>,
}

/// Index of the worker that receives the unit at `position`
#[inline]
pub fn assign(position: usize, worker_count: usize) -> usize {
    position % worker_count
}

/// Send `units` to `workers` round-robin
///
/// Unit `i` goes to `workers[i % workers.len()]`, independent of timing.
/// Delivery is fire-and-forget. With an empty pool every unit is dropped.
pub fn dispatch<S: UnitSink>(workers: &[S], units: &[WorkUnit]) -> DispatchSummary {
    let mut summary = DispatchSummary {
        sent: 0,
        dropped: 0,
        per_worker: vec![0; workers.len()],
    };

    if workers.is_empty() {
        summary.dropped = units.len() as u64;
        return summary;
    }

    for (position, unit) in units.iter().enumerate() {
        let target = assign(position, workers.len());
        if workers[target].submit(*unit) {
            summary.sent += 1;
            summary.per_worker[target] += 1;
        } else {
            log::warn!(
                "worker {} inbox closed, dropping unit {}-{}",
                target,
                unit.start,
                unit.end
            );
            summary.dropped += 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct RecordingSink {
        open: bool,
        received: RefCell<Vec<WorkUnit>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                open: true,
                received: RefCell::new(Vec::new()),
            }
        }

        fn closed() -> Self {
            Self {
                open: false,
                received: RefCell::new(Vec::new()),
            }
        }
    }

    impl UnitSink for RecordingSink {
        fn submit(&self, unit: WorkUnit) -> bool {
            if self.open {
                self.received.borrow_mut().push(unit);
            }
            self.open
        }
    }

    fn units(count: u64) -> Vec<WorkUnit> {
        (0..count)
            .map(|i| WorkUnit {
                start: i * 10 + 1,
                end: i * 10 + 10,
            })
            .collect()
    }

    #[test]
    fn test_assign() {
        assert_eq!(assign(0, 3), 0);
        assert_eq!(assign(2, 3), 2);
        assert_eq!(assign(3, 3), 0);
        assert_eq!(assign(7, 3), 1);
    }

    #[test]
    fn test_round_robin_assignment() {
        let workers: Vec<RecordingSink> = (0..3).map(|_| RecordingSink::new()).collect();
        let batch = units(8);

        let summary = dispatch(&workers, &batch);

        assert_eq!(summary.sent, 8);
        assert_eq!(summary.dropped, 0);
        assert_eq!(summary.per_worker, vec![3, 3, 2]);
        for (w, worker) in workers.iter().enumerate() {
            let expected: Vec<WorkUnit> = batch
                .iter()
                .enumerate()
                .filter(|(i, _)| i % 3 == w)
                .map(|(_, u)| *u)
                .collect();
            assert_eq!(*worker.received.borrow(), expected);
        }
    }

    #[test]
    fn test_fewer_units_than_workers() {
        let workers: Vec<RecordingSink> = (0..4).map(|_| RecordingSink::new()).collect();
        let summary = dispatch(&workers, &units(2));
        assert_eq!(summary.per_worker, vec![1, 1, 0, 0]);
    }

    #[test]
    fn test_empty_units_is_noop() {
        let workers: Vec<RecordingSink> = (0..2).map(|_| RecordingSink::new()).collect();
        let summary = dispatch(&workers, &[]);
        assert_eq!(summary.sent, 0);
        assert_eq!(summary.dropped, 0);
        assert!(workers.iter().all(|w| w.received.borrow().is_empty()));
    }

    #[test]
    fn test_empty_pool_drops_everything() {
        let workers: Vec<RecordingSink> = Vec::new();
        let summary = dispatch(&workers, &units(5));
        assert_eq!(summary.sent, 0);
        assert_eq!(summary.dropped, 5);
        assert!(summary.per_worker.is_empty());
    }

    #[test]
    fn test_closed_inbox_counts_as_dropped() {
        let workers = vec![RecordingSink::new(), RecordingSink::closed()];
        let summary = dispatch(&workers, &units(4));
        assert_eq!(summary.sent, 2);
        assert_eq!(summary.dropped, 2);
        assert_eq!(summary.per_worker, vec![2, 0]);
    }
}
