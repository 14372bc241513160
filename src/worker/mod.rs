//! Worker threads
//!
//! A worker is a stateless evaluation loop on its own OS thread. It receives
//! [`WorkerCommand`]s on a private inbox, evaluates the predicate over every
//! position of each unit, and reports back to the coordinator with exactly
//! two messages per unit: the matches, then a completion signal.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --Process(unit)--> Processing --report--> Idle
//! Idle --Stop / inbox closed--> Stopped
//! ```
//!
//! Workers share nothing with each other. The predicate is shared behind an
//! `Arc` but is immutable, so any number of workers can run in parallel
//! without synchronization.
//!
//! # Pool creation
//!
//! [`spawn_pool`] starts a fixed number of workers. A worker whose thread
//! cannot be created is logged and left out; the pool may come back smaller
//! than requested (or empty, which the coordinator rejects).

pub mod affinity;

use crate::coordinator::protocol::{CoordinatorMessage, WorkerCommand};
use crate::error::SchedulerError;
use crate::predicate::Predicate;
use crate::scheduler::dispatch::UnitSink;
use crate::scheduler::partition::WorkUnit;
use crossbeam::channel::{self, Receiver, Sender};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Evaluation loop for one worker
pub struct Worker {
    id: usize,
    k: u64,
    predicate: Arc<dyn Predicate>,
    inbox: Receiver<WorkerCommand>,
    outbox: Sender<CoordinatorMessage>,
    core: Option<usize>,
    units_processed: u64,
}

impl Worker {
    /// Create a worker reading from `inbox` and reporting to `outbox`
    pub fn new(
        id: usize,
        k: u64,
        predicate: Arc<dyn Predicate>,
        inbox: Receiver<WorkerCommand>,
        outbox: Sender<CoordinatorMessage>,
    ) -> Self {
        Self {
            id,
            k,
            predicate,
            inbox,
            outbox,
            core: None,
            units_processed: 0,
        }
    }

    /// Pin the worker thread to `core` when it starts running
    pub fn with_core(mut self, core: Option<usize>) -> Self {
        self.core = core;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Evaluate every position of `unit`, returning matches in ascending order
    pub fn process_unit(&self, unit: WorkUnit) -> Vec<u64> {
        (unit.start..=unit.end)
            .filter(|&start| self.predicate.evaluate(start, self.k))
            .collect()
    }

    /// Run until told to stop or until the inbox closes
    ///
    /// Returns the number of units this worker processed.
    pub fn run(mut self) -> u64 {
        if let Some(core) = self.core {
            match affinity::set_cpu_affinity(&[core]) {
                Ok(()) => log::debug!("worker {} pinned to core {}", self.id, core),
                Err(e) => log::warn!("worker {} could not be pinned to core {}: {:#}", self.id, core, e),
            }
        }

        while let Ok(command) = self.inbox.recv() {
            match command {
                WorkerCommand::Process(unit) => {
                    if !self.handle_unit(unit) {
                        log::debug!("worker {}: coordinator gone, exiting", self.id);
                        break;
                    }
                }
                WorkerCommand::Stop => break,
            }
        }

        log::debug!("worker {} stopped after {} units", self.id, self.units_processed);
        self.units_processed
    }

    /// Process one unit and report it. False if the coordinator is gone.
    fn handle_unit(&mut self, unit: WorkUnit) -> bool {
        let started = Instant::now();
        let matches = self.process_unit(unit);
        let elapsed = started.elapsed();
        self.units_processed += 1;

        let report = CoordinatorMessage::Matches {
            worker_id: self.id,
            unit,
            matches,
            elapsed,
        };
        self.outbox.send(report).is_ok()
            && self
                .outbox
                .send(CoordinatorMessage::UnitComplete { worker_id: self.id })
                .is_ok()
    }
}

/// Coordinator-side handle to a running worker
pub struct WorkerHandle {
    id: usize,
    sender: Sender<WorkerCommand>,
    thread: JoinHandle<u64>,
}

impl WorkerHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Ask the worker to exit after its queued units. False if already gone.
    pub fn stop(&self) -> bool {
        self.sender.send(WorkerCommand::Stop).is_ok()
    }

    /// Wait for the worker thread, returning how many units it processed
    pub fn join(self) -> Result<u64, SchedulerError> {
        let id = self.id;
        drop(self.sender);
        self.thread.join().map_err(|_| SchedulerError::WorkerPanicked(id))
    }
}

impl UnitSink for WorkerHandle {
    fn submit(&self, unit: WorkUnit) -> bool {
        self.sender.send(WorkerCommand::Process(unit)).is_ok()
    }
}

/// Parameters shared by every worker of a pool
#[derive(Clone)]
pub struct PoolSpec {
    pub worker_count: usize,
    pub k: u64,
    pub predicate: Arc<dyn Predicate>,
    /// Cores to pin workers to, round-robin; empty for no pinning
    pub cpu_cores: Vec<usize>,
}

/// Start a pool of worker threads reporting to `outbox`
pub fn spawn_pool(spec: &PoolSpec, outbox: &Sender<CoordinatorMessage>) -> Vec<WorkerHandle> {
    spawn_pool_with(spec, outbox, |worker| {
        thread::Builder::new()
            .name(format!("runsearch-worker-{}", worker.id()))
            .spawn(move || worker.run())
    })
}

/// Start a pool using `spawner` to create each thread
///
/// Workers whose spawn fails are excluded from the returned pool.
pub fn spawn_pool_with<F>(
    spec: &PoolSpec,
    outbox: &Sender<CoordinatorMessage>,
    mut spawner: F,
) -> Vec<WorkerHandle>
where
    F: FnMut(Worker) -> io::Result<JoinHandle<u64>>,
{
    let mut pool = Vec::with_capacity(spec.worker_count);

    for id in 0..spec.worker_count {
        let (sender, inbox) = channel::unbounded();
        let worker = Worker::new(id, spec.k, spec.predicate.clone(), inbox, outbox.clone())
            .with_core(affinity::core_for_worker(&spec.cpu_cores, id));

        match spawner(worker) {
            Ok(thread) => pool.push(WorkerHandle { id, sender, thread }),
            Err(e) => log::warn!("failed to start worker {}: {}; continuing without it", id, e),
        }
    }

    if pool.len() < spec.worker_count {
        log::warn!(
            "worker pool degraded: {} of {} workers started",
            pool.len(),
            spec.worker_count
        );
    } else {
        log::debug!("started {} workers", pool.len());
    }

    pool
}
