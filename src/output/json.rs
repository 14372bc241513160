//! JSON run report
//!
//! One document per run with the search parameters, the matches, scheduling
//! counters, and per-worker statistics:
//!
//! ```json
//! {
//!   "search": { "n": 3, "k": 2, "predicate": "square-sum" },
//!   "results": { "count": 1, "sorted": false, "matches": [3] },
//!   "scheduling": { "total_batches": 1, "units_completed": 3, ... },
//!   "workers": [ { "id": 0, "units": 2, ... } ],
//!   "unit_latency": { "min": { "micros": 1, "human": "1µs" }, ... }
//! }
//! ```

use crate::coordinator::RunReport;
use crate::output::text::format_duration;
use crate::stats::histogram::LatencyHistogram;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Duration with both microseconds and human-readable format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonDuration {
    pub micros: u64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        Self {
            micros: u64::try_from(d.as_micros()).unwrap_or(u64::MAX),
            human: format_duration(d),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonSearch {
    pub n: u64,
    pub k: u64,
    pub predicate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonResults {
    pub count: usize,
    pub sorted: bool,
    pub matches: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonScheduling {
    pub total_batches: u64,
    pub batch_size: u64,
    pub batches_completed: u64,
    pub units_dispatched: u64,
    pub units_completed: u64,
    pub units_dropped: u64,
    pub requested_workers: usize,
    pub started_workers: usize,
    pub elapsed: JsonDuration,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonWorker {
    pub id: usize,
    pub units: u64,
    pub positions: u64,
    pub matches: u64,
    pub busy: JsonDuration,
}

/// Unit latency percentiles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonLatency {
    pub samples: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p50: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p99: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<JsonDuration>,
}

impl JsonLatency {
    pub fn from_histogram(hist: &LatencyHistogram) -> Self {
        Self {
            samples: hist.len(),
            min: hist.min().map(JsonDuration::from_duration),
            mean: hist.mean().map(JsonDuration::from_duration),
            p50: hist.percentile(50.0).map(JsonDuration::from_duration),
            p99: hist.percentile(99.0).map(JsonDuration::from_duration),
            max: hist.max().map(JsonDuration::from_duration),
        }
    }
}

/// Top-level report document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonReport {
    pub search: JsonSearch,
    pub results: JsonResults,
    pub scheduling: JsonScheduling,
    pub workers: Vec<JsonWorker>,
    pub unit_latency: JsonLatency,
}

impl JsonReport {
    pub fn from_report(report: &mut RunReport) -> Result<Self> {
        let aggregate = report.stats.aggregate()?;
        let unit_latency = JsonLatency::from_histogram(aggregate.unit_latency());

        let workers = report
            .stats
            .per_worker()
            .iter()
            .map(|(&id, stats)| JsonWorker {
                id,
                units: stats.units(),
                positions: stats.positions(),
                matches: stats.matches(),
                busy: JsonDuration::from_duration(stats.busy()),
            })
            .collect();

        Ok(Self {
            search: JsonSearch {
                n: report.n,
                k: report.k,
                predicate: report.predicate.to_string(),
            },
            results: JsonResults {
                count: report.count(),
                sorted: report.sorted,
                matches: report.matches.clone(),
            },
            scheduling: JsonScheduling {
                total_batches: report.total_batches,
                batch_size: report.batch_size,
                batches_completed: report.counters.batches_completed,
                units_dispatched: report.counters.units_dispatched,
                units_completed: report.counters.units_completed,
                units_dropped: report.counters.units_dropped,
                requested_workers: report.requested_workers,
                started_workers: report.started_workers,
                elapsed: JsonDuration::from_duration(report.elapsed),
            },
            workers,
            unit_latency,
        })
    }
}

/// Serialize `report` as pretty JSON into `path`
pub fn write_json_report(path: &Path, report: &mut RunReport) -> Result<()> {
    let document = JsonReport::from_report(report)?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON report: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &document)
        .with_context(|| format!("Failed to write JSON report: {}", path.display()))?;
    writer.flush()?;
    Ok(())
}
