//! CLI argument parsing using clap

use crate::config::cli_convert::parse_run_param;
use clap::Parser;
use std::path::PathBuf;

/// Short usage text printed for missing or non-numeric run parameters
pub const USAGE: &str = "\
Usage: runsearch [OPTIONS] <N> <K>

Search starting positions 1..=N for runs of K consecutive integers whose
squares sum to a perfect square.

  N   upper bound of the starting positions (non-negative integer)
  K   run length (positive integer)

Run `runsearch --help` for all options.";

/// runsearch - parallel search for k-runs whose squares sum to a square
#[derive(Parser, Debug, Default)]
#[command(name = "runsearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Upper bound of the starting positions searched (inclusive)
    #[arg(value_name = "N")]
    pub n: Option<String>,

    /// Run length
    #[arg(value_name = "K")]
    pub k: Option<String>,

    // === Scheduler Options ===
    /// Number of worker threads (default: one per logical CPU)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Starting positions per batch (e.g., 500000, 10k, 2M)
    #[arg(short = 'b', long)]
    pub batch_size: Option<String>,

    /// Work units per worker per batch
    #[arg(long)]
    pub fan_out: Option<u64>,

    /// CPU cores to pin workers to (comma-separated, ranges allowed)
    #[arg(long)]
    pub cpu_cores: Option<String>,

    // === Output Options ===
    /// Sort matches ascending before printing (default: arrival order)
    #[arg(long)]
    pub sort: bool,

    /// Print scheduling statistics to stderr
    #[arg(long)]
    pub stats: bool,

    /// Write a JSON run report to this file
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    // === Configuration File ===
    /// TOML configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Dry run - validate configuration without searching
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// State of the positional N and K arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunParams {
    /// Both given and numeric
    Given { n: u64, k: u64 },
    /// Neither given
    Missing,
    /// Only one given, or a value is not a non-negative integer
    Invalid,
}

impl Cli {
    /// Parse CLI arguments, returning clap's error instead of exiting
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Classify the positional arguments
    pub fn run_params(&self) -> RunParams {
        match (&self.n, &self.k) {
            (None, None) => RunParams::Missing,
            (Some(n), Some(k)) => match (parse_run_param(n), parse_run_param(k)) {
                (Some(n), Some(k)) => RunParams::Given { n, k },
                _ => RunParams::Invalid,
            },
            _ => RunParams::Invalid,
        }
    }
}
