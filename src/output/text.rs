//! Human-readable text output

use crate::coordinator::RunReport;
use crate::Result;
use std::io::Write;
use std::time::Duration;

/// Literal prefix of the summary line
pub const RESULTS_PREFIX: &str = "RESULTS FOUND: ";

/// Write one line per match followed by the count summary
///
/// ```text
/// 3
/// RESULTS FOUND: 1
/// ```
pub fn write_results<W: Write>(out: &mut W, matches: &[u64]) -> std::io::Result<()> {
    for value in matches {
        writeln!(out, "{}", value)?;
    }
    writeln!(out, "{}{}", RESULTS_PREFIX, matches.len())?;
    out.flush()
}

/// Write the scheduling statistics block
pub fn write_stats<W: Write>(out: &mut W, report: &mut RunReport) -> Result<()> {
    writeln!(out, "═══════════════════════════════════════════════════════════")?;
    writeln!(out, "                    RUN STATISTICS")?;
    writeln!(out, "═══════════════════════════════════════════════════════════")?;
    writeln!(out, "Elapsed Time: {:.3}s", report.elapsed.as_secs_f64())?;
    writeln!(out, "Predicate: {} (k={})", report.predicate, report.k)?;
    writeln!(out)?;

    writeln!(out, "Scheduling:")?;
    writeln!(
        out,
        "  Batches: {} of {} (batch size {})",
        report.counters.batches_completed,
        report.total_batches,
        format_number(report.batch_size)
    )?;
    writeln!(
        out,
        "  Units:   {} dispatched, {} completed",
        format_number(report.counters.units_dispatched),
        format_number(report.counters.units_completed)
    )?;
    if report.counters.units_dropped > 0 {
        writeln!(out, "  Dropped: {}", format_number(report.counters.units_dropped))?;
    }
    writeln!(
        out,
        "  Workers: {} started ({} requested)",
        report.started_workers, report.requested_workers
    )?;
    writeln!(out)?;

    let aggregate = report.stats.aggregate()?.clone();
    writeln!(out, "Evaluation:")?;
    writeln!(
        out,
        "  Positions: {} ({}/s per busy worker)",
        format_number(aggregate.positions()),
        format_number(aggregate.positions_per_sec() as u64)
    )?;
    writeln!(out, "  Matches:   {}", format_number(aggregate.matches()))?;

    let latency = aggregate.unit_latency();
    if !latency.is_empty() {
        writeln!(out)?;
        writeln!(out, "Unit Latency:")?;
        for (label, value) in [
            ("min", latency.min()),
            ("p50", latency.percentile(50.0)),
            ("p99", latency.percentile(99.0)),
            ("max", latency.max()),
        ] {
            if let Some(value) = value {
                writeln!(out, "  {:<4} {}", label, format_duration(value))?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "Per Worker:")?;
    for (id, stats) in report.stats.per_worker() {
        writeln!(
            out,
            "  worker {:>4}: {:>8} units, {:>12} positions, busy {}",
            id,
            format_number(stats.units()),
            format_number(stats.positions()),
            format_duration(stats.busy())
        )?;
    }
    Ok(())
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Format a duration with a unit suited to its size
pub fn format_duration(d: Duration) -> String {
    let micros = d.as_micros();
    if micros < 1_000 {
        format!("{}µs", micros)
    } else if micros < 1_000_000 {
        format!("{:.2}ms", micros as f64 / 1_000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
