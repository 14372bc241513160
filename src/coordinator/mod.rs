//! Coordinator
//!
//! The coordinator is the single owner of all mutable run state: accumulated
//! matches, completion counters, batch position, and the worker pool. It runs
//! on the calling thread and handles one message at a time, so none of that
//! state needs a lock.
//!
//! # State machine
//!
//! ```text
//! Idle --start--> BatchRunning --last completion of last batch--> Done
//!                   |      ^
//!                   +------+  Matches: append results
//!                             UnitComplete: count; at total, start next batch
//! ```
//!
//! Completion is detected by counting `UnitComplete` messages against the
//! number of units dispatched for the batch. Each unit produces exactly one
//! completion, so the count alone is enough.
//!
//! # Example
//!
//! ```
//! use runsearch::config::{Config, SearchConfig, SchedulerConfig};
//! use runsearch::coordinator::Coordinator;
//! use runsearch::predicate::SquareSumPredicate;
//! use std::sync::Arc;
//!
//! let config = Config {
//!     search: SearchConfig { n: 3, k: 2 },
//!     scheduler: SchedulerConfig { workers: Some(2), ..Default::default() },
//!     ..Default::default()
//! };
//!
//! let coordinator = Coordinator::new(Arc::new(config), Arc::new(SquareSumPredicate));
//! let report = coordinator.run()?;
//! assert_eq!(report.matches, vec![3]);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod protocol;

use crate::config::Config;
use crate::error::SchedulerError;
use crate::predicate::Predicate;
use crate::scheduler::batch::BatchPlan;
use crate::scheduler::dispatch::{dispatch, UnitSink};
use crate::stats::aggregator::StatisticsAggregator;
use crate::stats::RunCounters;
use crate::worker::{affinity, spawn_pool, PoolSpec, WorkerHandle};
use crate::Result;
use anyhow::Context;
use crossbeam::channel::{self, Receiver};
use protocol::CoordinatorMessage;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Coordinator lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    BatchRunning,
    Done,
}

/// Result of feeding the state machine one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Still waiting on the current batch
    Continue,
    /// Batch with this index has been dispatched
    BatchStarted(u64),
    /// All batches are complete
    Done,
}

/// Run state owned by the coordinator
///
/// Generic over the worker handle so the state machine can be driven
/// without threads.
pub struct CoordinatorState<W> {
    plan: BatchPlan,
    workers: Vec<W>,
    phase: Phase,
    accumulated_results: Vec<u64>,
    completed_units_in_batch: u64,
    total_units_in_batch: u64,
    current_batch_index: u64,
    total_batches: u64,
    counters: RunCounters,
    stats: StatisticsAggregator,
}

impl<W: UnitSink> CoordinatorState<W> {
    /// Create the state for a run over `plan` with a fixed pool
    ///
    /// `worker_ids` names each pool member for statistics, in pool order.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::EmptyWorkerPool`] if `workers` is empty: no unit
    /// could ever complete, so the run would never finish.
    pub fn new(plan: BatchPlan, workers: Vec<W>, worker_ids: &[usize]) -> std::result::Result<Self, SchedulerError> {
        if workers.is_empty() {
            return Err(SchedulerError::EmptyWorkerPool);
        }

        let mut stats = StatisticsAggregator::new();
        for &id in worker_ids {
            stats.register_worker(id);
        }

        Ok(Self {
            plan,
            workers,
            phase: Phase::Idle,
            accumulated_results: Vec::new(),
            completed_units_in_batch: 0,
            total_units_in_batch: 0,
            current_batch_index: 0,
            total_batches: plan.total_batches(),
            counters: RunCounters::default(),
            stats,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_batch_index(&self) -> u64 {
        self.current_batch_index
    }

    pub fn total_batches(&self) -> u64 {
        self.total_batches
    }

    pub fn completed_units_in_batch(&self) -> u64 {
        self.completed_units_in_batch
    }

    pub fn total_units_in_batch(&self) -> u64 {
        self.total_units_in_batch
    }

    /// Matches received so far, in arrival order
    pub fn results(&self) -> &[u64] {
        &self.accumulated_results
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    pub fn workers(&self) -> &[W] {
        &self.workers
    }

    /// `Idle -> BatchRunning`: dispatch the first non-empty batch
    ///
    /// Goes straight to `Done` when the domain holds no positions.
    pub fn start(&mut self) -> std::result::Result<Transition, SchedulerError> {
        if self.phase != Phase::Idle {
            return Err(SchedulerError::UnexpectedMessage("start outside idle phase"));
        }
        log::debug!(
            "starting run: n={}, {} batch(es), {} worker(s)",
            self.plan.n(),
            self.total_batches,
            self.workers.len()
        );
        self.begin_batch(1)
    }

    /// Apply one worker message
    pub fn handle(&mut self, message: CoordinatorMessage) -> std::result::Result<Transition, SchedulerError> {
        if self.phase != Phase::BatchRunning {
            return Err(SchedulerError::UnexpectedMessage(match message {
                CoordinatorMessage::Matches { .. } => "matches with no batch running",
                CoordinatorMessage::UnitComplete { .. } => "completion with no batch running",
            }));
        }

        match message {
            CoordinatorMessage::Matches {
                worker_id,
                unit,
                matches,
                elapsed,
            } => {
                self.stats
                    .record_unit(worker_id, unit.len(), matches.len() as u64, elapsed);
                self.accumulated_results.extend(matches);
                Ok(Transition::Continue)
            }
            CoordinatorMessage::UnitComplete { .. } => {
                self.completed_units_in_batch += 1;
                self.counters.units_completed += 1;

                if self.completed_units_in_batch < self.total_units_in_batch {
                    return Ok(Transition::Continue);
                }

                self.counters.batches_completed += 1;
                log::debug!(
                    "batch {}/{} complete ({} matches so far)",
                    self.current_batch_index,
                    self.total_batches,
                    self.accumulated_results.len()
                );

                if self.current_batch_index >= self.total_batches {
                    self.phase = Phase::Done;
                    Ok(Transition::Done)
                } else {
                    self.begin_batch(self.current_batch_index + 1)
                }
            }
        }
    }

    /// Partition and dispatch batch `index`, skipping empty batches
    fn begin_batch(&mut self, mut index: u64) -> std::result::Result<Transition, SchedulerError> {
        loop {
            let Some(batch) = self.plan.batch(index) else {
                self.phase = Phase::Done;
                return Ok(Transition::Done);
            };
            let units = batch.units()?;

            self.current_batch_index = index;
            self.completed_units_in_batch = 0;
            self.total_units_in_batch = units.len() as u64;

            if units.is_empty() {
                self.counters.batches_completed += 1;
                if index >= self.total_batches {
                    self.phase = Phase::Done;
                    return Ok(Transition::Done);
                }
                index += 1;
                continue;
            }

            let summary = dispatch(&self.workers, &units);
            self.counters.units_dispatched += summary.sent;
            self.counters.units_dropped += summary.dropped;
            if summary.dropped > 0 {
                return Err(SchedulerError::UnitsLost {
                    batch: index,
                    dropped: summary.dropped,
                });
            }

            log::debug!(
                "batch {}/{}: [{}, {}] as {} unit(s) of {}",
                index,
                self.total_batches,
                batch.low,
                batch.high,
                units.len(),
                batch.unit_size
            );
            self.phase = Phase::BatchRunning;
            return Ok(Transition::BatchStarted(index));
        }
    }

    /// Consume the state, returning results, pool, counters, and stats
    pub fn finish(self) -> (Vec<u64>, Vec<W>, RunCounters, StatisticsAggregator) {
        (self.accumulated_results, self.workers, self.counters, self.stats)
    }
}

/// Everything a finished run produced
#[derive(Debug)]
pub struct RunReport {
    pub n: u64,
    pub k: u64,
    pub predicate: &'static str,
    /// Matching starting positions (arrival order unless `sorted`)
    pub matches: Vec<u64>,
    pub sorted: bool,
    pub total_batches: u64,
    pub batch_size: u64,
    pub requested_workers: usize,
    pub started_workers: usize,
    pub counters: RunCounters,
    pub stats: StatisticsAggregator,
    pub elapsed: Duration,
}

impl RunReport {
    /// Number of matches found
    pub fn count(&self) -> usize {
        self.matches.len()
    }
}

/// Runs a search to completion with a thread-per-worker pool
pub struct Coordinator {
    config: Arc<Config>,
    predicate: Arc<dyn Predicate>,
}

impl Coordinator {
    pub fn new(config: Arc<Config>, predicate: Arc<dyn Predicate>) -> Self {
        Self { config, predicate }
    }

    /// Start the pool, run every batch, stop the pool, and return the report
    pub fn run(&self) -> Result<RunReport> {
        let cpu_cores = match self.config.scheduler.cpu_cores {
            Some(ref spec) => affinity::parse_cpu_list(spec).context("Invalid --cpu-cores")?,
            None => Vec::new(),
        };
        let spec = PoolSpec {
            worker_count: self.config.scheduler.worker_count(),
            k: self.config.search.k,
            predicate: self.predicate.clone(),
            cpu_cores,
        };

        let (outbox, mailbox) = channel::unbounded();
        let workers = spawn_pool(&spec, &outbox);
        // Only workers hold senders, so the mailbox closes if they all exit.
        drop(outbox);

        self.run_with_pool(spec.worker_count, workers, mailbox)
    }

    fn run_with_pool(
        &self,
        requested_workers: usize,
        workers: Vec<WorkerHandle>,
        mailbox: Receiver<CoordinatorMessage>,
    ) -> Result<RunReport> {
        let started = Instant::now();
        let plan = BatchPlan::new(
            self.config.search.n,
            self.config.scheduler.batch_size,
            workers.len(),
            self.config.scheduler.fan_out,
        );
        let worker_ids: Vec<usize> = workers.iter().map(|w| w.id()).collect();
        let started_workers = workers.len();

        let mut state = CoordinatorState::new(plan, workers, &worker_ids)?;

        if let Err(e) = drive(&mut state, &mailbox) {
            let (_, workers, _, _) = state.finish();
            abandon(workers);
            return Err(e.into());
        }

        let (mut matches, workers, counters, stats) = state.finish();
        shutdown(workers)?;

        let sorted = self.config.output.sort_results;
        if sorted {
            matches.sort_unstable();
        }

        log::debug!(
            "run complete: {} match(es), {} unit(s) in {:.3}s",
            matches.len(),
            counters.units_completed,
            started.elapsed().as_secs_f64()
        );

        Ok(RunReport {
            n: self.config.search.n,
            k: self.config.search.k,
            predicate: self.predicate.name(),
            matches,
            sorted,
            total_batches: plan.total_batches(),
            batch_size: plan.batch_size(),
            requested_workers,
            started_workers,
            counters,
            stats,
            elapsed: started.elapsed(),
        })
    }
}

/// Pump the mailbox until the state machine reaches `Done`
fn drive(
    state: &mut CoordinatorState<WorkerHandle>,
    mailbox: &Receiver<CoordinatorMessage>,
) -> std::result::Result<(), SchedulerError> {
    let mut transition = state.start()?;
    while transition != Transition::Done {
        let message = mailbox.recv().map_err(|_| SchedulerError::WorkersDisconnected {
            batch: state.current_batch_index(),
            completed: state.completed_units_in_batch(),
            total: state.total_units_in_batch(),
        })?;
        transition = state.handle(message)?;
    }
    Ok(())
}

/// Stop every worker and wait for it
fn shutdown(workers: Vec<WorkerHandle>) -> std::result::Result<(), SchedulerError> {
    for worker in &workers {
        worker.stop();
    }
    for worker in workers {
        let id = worker.id();
        let processed = worker.join()?;
        log::debug!("worker {} joined after {} unit(s)", id, processed);
    }
    Ok(())
}

/// Tell workers to stop without waiting on them (error path)
fn abandon(workers: Vec<WorkerHandle>) {
    for worker in &workers {
        worker.stop();
    }
}
