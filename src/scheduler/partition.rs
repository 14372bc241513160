//! Range partitioning into work units

use crate::error::SchedulerError;

/// A contiguous, inclusive range of starting positions handed to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkUnit {
    pub start: u64,
    pub end: u64,
}

impl WorkUnit {
    /// Number of starting positions covered by this unit
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false: a unit holds at least one position
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Split `[low, high]` into units of `unit_size` positions
///
/// Every unit is exactly `unit_size` long except possibly the last, which
/// ends at `high`. Units are returned in ascending order and cover the range
/// exactly once.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidRange`] when `low > high` and
/// [`SchedulerError::InvalidUnitSize`] when `unit_size` is zero. Callers with
/// a possibly empty batch check the range before partitioning.
///
/// # Example
///
/// ```
/// use runsearch::scheduler::partition::{partition, WorkUnit};
///
/// let units = partition(1, 10, 4).unwrap();
/// assert_eq!(units, vec![
///     WorkUnit { start: 1, end: 4 },
///     WorkUnit { start: 5, end: 8 },
///     WorkUnit { start: 9, end: 10 },
/// ]);
/// ```
pub fn partition(low: u64, high: u64, unit_size: u64) -> Result<Vec<WorkUnit>, SchedulerError> {
    if low > high {
        return Err(SchedulerError::InvalidRange { low, high });
    }
    if unit_size == 0 {
        return Err(SchedulerError::InvalidUnitSize);
    }

    let mut units = Vec::with_capacity(unit_count(low, high, unit_size) as usize);
    let mut start = low;
    loop {
        // Saturating add keeps the last unit in range at high == u64::MAX
        let end = start.saturating_add(unit_size - 1).min(high);
        units.push(WorkUnit { start, end });
        if end == high {
            break;
        }
        start = end + 1;
    }

    Ok(units)
}

/// `ceil((high - low + 1) / unit_size)` without overflowing
pub fn unit_count(low: u64, high: u64, unit_size: u64) -> u64 {
    if low > high || unit_size == 0 {
        return 0;
    }
    let span = high - low;
    span / unit_size + 1
}
