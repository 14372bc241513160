//! TOML configuration file parsing
//!
//! ```toml
//! [search]
//! n = 1000000
//! k = 24
//!
//! [scheduler]
//! workers = 16
//! batch_size = 250000
//! fan_out = 4
//!
//! [output]
//! sort_results = true
//! ```

use super::*;
use crate::config::cli::{Cli, RunParams};
use crate::config::cli_convert::parse_count;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with a configuration (CLI takes precedence)
///
/// Positional N and K replace the file's `[search]` values only when both
/// are given and numeric; the caller decides what to do otherwise.
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    if let RunParams::Given { n, k } = cli.run_params() {
        config.search = SearchConfig { n, k };
    }

    // Override scheduler settings
    if let Some(workers) = cli.workers {
        config.scheduler.workers = Some(workers);
    }
    if let Some(ref batch_size) = cli.batch_size {
        config.scheduler.batch_size = parse_count(batch_size).context("Invalid batch size")?;
    }
    if let Some(fan_out) = cli.fan_out {
        config.scheduler.fan_out = fan_out;
    }
    if let Some(ref cores) = cli.cpu_cores {
        config.scheduler.cpu_cores = Some(cores.clone());
    }

    // Override output settings
    if cli.sort {
        config.output.sort_results = true;
    }
    if cli.stats {
        config.output.show_stats = true;
    }
    if let Some(ref path) = cli.json_output {
        config.output.json_output = Some(path.clone());
    }

    // Override runtime settings
    if cli.dry_run {
        config.runtime.dry_run = true;
    }
    if cli.debug {
        config.runtime.debug = true;
    }

    Ok(config)
}

/// Build the effective configuration: file (if any), then CLI overrides
pub fn load_config(cli: &Cli) -> Result<Config> {
    let base = match cli.config {
        Some(ref path) => parse_toml_file(path)?,
        None => Config::default(),
    };
    merge_cli_with_config(cli, base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli_with(n: Option<&str>, k: Option<&str>) -> Cli {
        Cli {
            n: n.map(str::to_string),
            k: k.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_toml_basic() {
        let toml = r#"
[search]
n = 1000
k = 24

[scheduler]
workers = 8
batch_size = 250
fan_out = 3
cpu_cores = "0-3"

[output]
sort_results = true
json_output = "report.json"
"#;
        let config = parse_toml_string(toml).unwrap();
        assert_eq!(config.search, SearchConfig { n: 1000, k: 24 });
        assert_eq!(config.scheduler.workers, Some(8));
        assert_eq!(config.scheduler.batch_size, 250);
        assert_eq!(config.scheduler.fan_out, 3);
        assert_eq!(config.scheduler.cpu_cores.as_deref(), Some("0-3"));
        assert!(config.output.sort_results);
        assert_eq!(config.output.json_output, Some(PathBuf::from("report.json")));
    }

    #[test]
    fn test_parse_toml_defaults() {
        let config = parse_toml_string("").unwrap();
        assert_eq!(config, Config::default());

        let partial = parse_toml_string("[scheduler]\nworkers = 2\n").unwrap();
        assert_eq!(partial.scheduler.workers, Some(2));
        assert_eq!(partial.scheduler.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(partial.scheduler.fan_out, DEFAULT_FAN_OUT);
    }

    #[test]
    fn test_parse_toml_invalid() {
        assert!(parse_toml_string("[scheduler]\nworkers = \"many\"\n").is_err());
        assert!(parse_toml_string("not toml at all [").is_err());
    }

    #[test]
    fn test_parse_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search]\nn = 3\nk = 2").unwrap();

        let config = parse_toml_file(file.path()).unwrap();
        assert_eq!(config.search, SearchConfig { n: 3, k: 2 });
    }

    #[test]
    fn test_parse_toml_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(parse_toml_file(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let base = parse_toml_string("[search]\nn = 10\nk = 3\n[scheduler]\nworkers = 2\n").unwrap();
        let mut cli = cli_with(Some("50"), Some("24"));
        cli.workers = Some(6);
        cli.batch_size = Some("2k".to_string());
        cli.sort = true;
        cli.debug = true;

        let config = merge_cli_with_config(&cli, base).unwrap();
        assert_eq!(config.search, SearchConfig { n: 50, k: 24 });
        assert_eq!(config.scheduler.workers, Some(6));
        assert_eq!(config.scheduler.batch_size, 2_000);
        assert!(config.output.sort_results);
        assert!(config.runtime.debug);
    }

    #[test]
    fn test_missing_positionals_keep_file_values() {
        let base = parse_toml_string("[search]\nn = 10\nk = 3\n").unwrap();
        let config = merge_cli_with_config(&cli_with(None, None), base).unwrap();
        assert_eq!(config.search, SearchConfig { n: 10, k: 3 });
    }

    #[test]
    fn test_invalid_batch_size() {
        let mut cli = cli_with(Some("10"), Some("2"));
        cli.batch_size = Some("lots".to_string());
        assert!(merge_cli_with_config(&cli, Config::default()).is_err());
    }

    #[test]
    fn test_load_config_without_file() {
        let config = load_config(&cli_with(Some("3"), Some("2"))).unwrap();
        assert_eq!(config.search, SearchConfig { n: 3, k: 2 });
        assert_eq!(config.scheduler, SchedulerConfig::default());
    }
}
