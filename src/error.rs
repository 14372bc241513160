//! Scheduler error types
//!
//! Typed errors for the scheduling layer. Application-level code wraps these
//! in `anyhow::Error` with context; library callers can match on them.

use thiserror::Error;

/// Errors raised by the partitioner, dispatcher, and coordinator
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// Every worker thread failed to start
    #[error("worker pool is empty: no worker thread could be started")]
    EmptyWorkerPool,

    /// Partition requested over an inverted range
    #[error("invalid range: low ({low}) > high ({high})")]
    InvalidRange { low: u64, high: u64 },

    /// Partition requested with a zero unit size
    #[error("unit size must be at least 1")]
    InvalidUnitSize,

    /// Every worker went away while a batch was still outstanding
    ///
    /// Raised only once the last worker has exited and the mailbox closes.
    /// While any worker survives the run keeps waiting on the lost units.
    #[error(
        "all workers disconnected during batch {batch} ({completed}/{total} units completed)"
    )]
    WorkersDisconnected {
        batch: u64,
        completed: u64,
        total: u64,
    },

    /// Units could not be delivered because their worker's inbox was closed
    #[error("{dropped} work unit(s) of batch {batch} could not be delivered")]
    UnitsLost { batch: u64, dropped: u64 },

    /// A message arrived that the coordinator cannot accept in its current phase
    #[error("unexpected message: {0}")]
    UnexpectedMessage(&'static str),

    /// A worker thread panicked before it could be joined
    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
}
