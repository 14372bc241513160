//! Unit latency histogram using HdrHistogram
//!
//! Records how long workers spend on each work unit. Unit times range from a
//! few microseconds (tiny units) to minutes (huge batches on few workers), so
//! the histogram tracks 1µs to 1 hour with 3 significant digits.
//!
//! # Example
//!
//! ```
//! use runsearch::stats::histogram::LatencyHistogram;
//! use std::time::Duration;
//!
//! let mut hist = LatencyHistogram::new();
//! hist.record(Duration::from_micros(100));
//! hist.record(Duration::from_micros(300));
//!
//! assert_eq!(hist.len(), 2);
//! assert!(hist.percentile(50.0).is_some());
//! ```

use crate::Result;
use hdrhistogram::Histogram;
use std::time::Duration;

/// Upper bound in microseconds (1 hour)
const MAX_MICROS: u64 = 3_600_000_000;

/// Latency histogram wrapper
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
}

impl LatencyHistogram {
    /// Create an empty histogram covering 1µs to 1 hour
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(1, MAX_MICROS, 3)
            .expect("Failed to create histogram with valid bounds");
        Self { histogram }
    }

    /// Record one sample, clamped into the tracked range
    #[inline]
    pub fn record(&mut self, latency: Duration) {
        let micros = latency.as_micros().min(MAX_MICROS as u128) as u64;
        let _ = self.histogram.record(micros.max(1));
    }

    /// Value at `percentile` (0.0 - 100.0), or None if empty
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_micros(
            self.histogram.value_at_percentile(percentile),
        ))
    }

    pub fn min(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_micros(self.histogram.min()))
    }

    pub fn max(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_micros(self.histogram.max()))
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_micros(self.histogram.mean() as u64))
    }

    /// Number of samples recorded
    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Merge another histogram into this one
    pub fn merge(&mut self, other: &LatencyHistogram) -> Result<()> {
        self.histogram
            .add(&other.histogram)
            .map_err(|e| anyhow::anyhow!("Failed to merge histograms: {}", e))?;
        Ok(())
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}
