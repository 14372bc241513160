//! runsearch CLI entry point

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use runsearch::config::cli::{Cli, RunParams, USAGE};
use runsearch::config::{toml, validator, Config};
use runsearch::output::{json, text};
use std::io::{self, Write};

fn main() -> Result<()> {
    let cli = match Cli::try_parse_args() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            eprintln!("error: {}", e.kind());
            return print_usage();
        }
    };

    // Argument errors print usage before any option is parsed
    if !cli_params_usable(&cli) {
        return print_usage();
    }

    let config = toml::load_config(&cli)?;
    init_logging(config.runtime.debug);

    if !has_run_params(&cli, &config) {
        return print_usage();
    }

    validator::validate_config(&config).context("Configuration validation failed")?;
    log::debug!("{}", config);

    if config.runtime.dry_run {
        println!("{}", config);
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let json_path = config.output.json_output.clone();
    let show_stats = config.output.show_stats;

    let mut report = runsearch::run_search(config)?;

    {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        text::write_results(&mut out, &report.matches).context("Failed to write results")?;
    }

    if show_stats {
        let stderr = io::stderr();
        let mut err = stderr.lock();
        text::write_stats(&mut err, &mut report)?;
    }

    if let Some(path) = json_path {
        json::write_json_report(&path, &mut report)?;
        log::info!("JSON report written to {}", path.display());
    }

    Ok(())
}

/// Whether the positionals allow a run before any config is loaded
fn cli_params_usable(cli: &Cli) -> bool {
    match cli.run_params() {
        RunParams::Given { k, .. } => k >= 1,
        RunParams::Missing => cli.config.is_some(),
        RunParams::Invalid => false,
    }
}

/// Positionals win; without them a config file must supply a usable K
fn has_run_params(cli: &Cli, config: &Config) -> bool {
    match cli.run_params() {
        RunParams::Given { k, .. } => k >= 1,
        RunParams::Missing => cli.config.is_some() && config.search.k >= 1,
        RunParams::Invalid => false,
    }
}

fn print_usage() -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", USAGE)?;
    out.flush()?;
    Ok(())
}

/// Default level is warn, `--debug` raises it, `RUST_LOG` overrides both
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use runsearch::config::SearchConfig;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Cli {
        <Cli as clap::Parser>::try_parse_from(std::iter::once("runsearch").chain(args.iter().copied()))
            .unwrap()
    }

    fn with_search(n: u64, k: u64) -> Config {
        Config {
            search: SearchConfig { n, k },
            ..Default::default()
        }
    }

    #[test]
    fn test_bad_positionals_skip_option_parsing() {
        let cli = parse(&["ten", "2", "--batch-size", "lots"]);
        assert!(!cli_params_usable(&cli));
        assert!(toml::load_config(&cli).is_err());
    }

    #[test]
    fn test_cli_params_usable() {
        assert!(cli_params_usable(&parse(&["3", "2"])));
        assert!(!cli_params_usable(&parse(&["3", "0"])));
        assert!(!cli_params_usable(&parse(&["3"])));
        assert!(!cli_params_usable(&parse(&[])));
        assert!(cli_params_usable(&parse(&["-c", "run.toml"])));
    }

    #[test]
    fn test_has_run_params() {
        let cli = parse(&["3", "2"]);
        assert!(has_run_params(&cli, &with_search(3, 2)));

        let cli = parse(&[]);
        assert!(!has_run_params(&cli, &with_search(100, 24)));

        let mut cli = parse(&[]);
        cli.config = Some(PathBuf::from("run.toml"));
        assert!(has_run_params(&cli, &with_search(100, 24)));
        assert!(!has_run_params(&cli, &with_search(100, 0)));

        let cli = parse(&["x", "y"]);
        assert!(!has_run_params(&cli, &with_search(100, 24)));
    }
}
