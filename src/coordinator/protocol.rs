//! Messages exchanged between the coordinator and its workers
//!
//! ```text
//! Coordinator                      Worker
//!     |                              |
//!     |------ Process(unit) -------->|
//!     |------ Process(unit) -------->|   (round-robin, fire-and-forget)
//!     |                              |
//!     |<----- Matches(unit, ...) ----|
//!     |<----- UnitComplete ----------|   (exactly two per unit, in order)
//!     |                              |
//!     |------ Stop ----------------->|   (after the last batch completes)
//! ```
//!
//! Both directions use unbounded crossbeam channels: sends never block, and
//! messages from one worker arrive in the order it sent them. Messages from
//! different workers interleave arbitrarily.

use crate::scheduler::partition::WorkUnit;
use std::time::Duration;

/// Coordinator → worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Evaluate every starting position in the unit
    Process(WorkUnit),
    /// Leave the processing loop and exit
    Stop,
}

/// Worker → coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorMessage {
    /// Matches found in one unit, ascending, possibly empty
    Matches {
        worker_id: usize,
        unit: WorkUnit,
        matches: Vec<u64>,
        elapsed: Duration,
    },
    /// The unit the worker last reported on is finished
    UnitComplete { worker_id: usize },
}

impl CoordinatorMessage {
    pub fn worker_id(&self) -> usize {
        match self {
            CoordinatorMessage::Matches { worker_id, .. } => *worker_id,
            CoordinatorMessage::UnitComplete { worker_id } => *worker_id,
        }
    }
}
