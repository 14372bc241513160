//! Work scheduling
//!
//! Pure building blocks used by the coordinator:
//!
//! - `partition`: split a range into work units
//! - `batch`: split the domain into batches and size their units
//! - `dispatch`: hand units to workers round-robin

pub mod batch;
pub mod dispatch;
pub mod partition;

pub use batch::{Batch, BatchPlan};
pub use dispatch::{dispatch, DispatchSummary, UnitSink};
pub use partition::{partition, WorkUnit};
