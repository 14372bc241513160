//! String to value conversion helpers for CLI arguments

use anyhow::{Context, Result};

/// Parse a count with an optional decimal suffix (e.g. "500", "10k", "2M", "1_000_000")
///
/// Suffixes are powers of 1000: `k`, `m`, `g`, `t`.
pub fn parse_count(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase().replace('_', "");

    let (num_str, multiplier) = if let Some(num) = s.strip_suffix('k') {
        (num, 1_000u64)
    } else if let Some(num) = s.strip_suffix('m') {
        (num, 1_000_000)
    } else if let Some(num) = s.strip_suffix('g') {
        (num, 1_000_000_000)
    } else if let Some(num) = s.strip_suffix('t') {
        (num, 1_000_000_000_000)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid count format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Count out of range: {}", s))
}

/// Parse a positional run parameter (N or K): plain decimal digits only
///
/// Returns None for anything that is not a non-negative integer, so the
/// caller can fall back to the usage message.
pub fn parse_run_param(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
