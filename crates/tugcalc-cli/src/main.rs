//! tugcalc - minimum tug requirements by location and LOA.
//!
//! A thin frontend over `tugcalc-core`: loads the reference table (through
//! the offline cache, so it keeps working without a connection) and prints
//! the requirement for one berthing or unberthing query.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tugcalc_core::utils::or_dash;
use tugcalc_core::{Config, Dataset, LookupOutcome, Operation, TugCalc, ValidationError};

// ============================================================================
// Constants
// ============================================================================

/// Log file name prefix inside the log directory (rotated daily)
const LOG_FILE_PREFIX: &str = "tugcalc.log";

/// Exit code for a well-formed query with no matching band
const EXIT_NO_MATCH: u8 = 1;

/// Exit code for invalid input
const EXIT_INVALID_INPUT: u8 = 2;

const USAGE: &str = "\
Usage:
  tugcalc --locations
  tugcalc [--berthing | --unberthing] [--json] <location> <loa>

Environment:
  TUGCALC_BASE_URL       site the shell and tug_requirements.csv are served from
  TUGCALC_CACHE_VERSION  offline cache version tag
  RUST_LOG               log filter (default: warn)";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr and to a daily rolling file under `log_dir`. The
/// returned guard must live until exit so buffered lines are flushed.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[derive(Debug, Default, PartialEq)]
struct Args {
    list_locations: bool,
    json: bool,
    operation: Operation,
    location: Option<String>,
    loa: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();
    let mut positional = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--locations" => parsed.list_locations = true,
            "--json" => parsed.json = true,
            "--berthing" => parsed.operation = Operation::Berthing,
            "--unberthing" => parsed.operation = Operation::Unberthing,
            "-h" | "--help" => anyhow::bail!("{}", USAGE),
            flag if flag.starts_with("--") => {
                anyhow::bail!("Unknown option: {}\n\n{}", flag, USAGE)
            }
            value => positional.push(value.to_string()),
        }
    }

    let mut positional = positional.into_iter();
    parsed.location = positional.next();
    parsed.loa = positional.next();
    if let Some(extra) = positional.next() {
        anyhow::bail!("Unexpected argument: {}\n\n{}", extra, USAGE);
    }
    if !parsed.list_locations && parsed.loa.is_none() {
        anyhow::bail!("{}", USAGE);
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&args)?;

    let config = Config::load()
        .context("Failed to load configuration")?
        .apply_env();
    let _guard = init_tracing(config.cache_dir().ok().map(|dir| dir.join("logs")));
    info!(version = config.cache_version(), "tugcalc starting");

    let calc = TugCalc::start(&config).await?;
    let dataset = calc.load_dataset().await?;

    let code = if args.list_locations {
        print_locations(&dataset);
        ExitCode::SUCCESS
    } else {
        run_query(&calc, &dataset, &args)?
    };

    calc.shutdown().await;
    Ok(code)
}

fn print_locations(dataset: &Dataset) {
    for location in dataset.locations() {
        println!("{}", location);
    }
}

fn run_query(calc: &TugCalc, dataset: &Dataset, args: &Args) -> Result<ExitCode> {
    let location = args.location.as_deref().unwrap_or("");
    let loa = args.loa.as_deref().unwrap_or("");

    let outcome = match calc.compute_result(dataset, location, loa, args.operation) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{}", e);
            if let ValidationError::UnknownLocation(_) = e {
                eprintln!("Known locations: {}", dataset.locations().join(", "));
            }
            return Ok(ExitCode::from(EXIT_INVALID_INPUT));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(location, loa, args.operation, &outcome);
    }

    Ok(match outcome {
        LookupOutcome::Matched(_) => ExitCode::SUCCESS,
        LookupOutcome::NoMatch => ExitCode::from(EXIT_NO_MATCH),
    })
}

fn print_outcome(location: &str, loa: &str, operation: Operation, outcome: &LookupOutcome) {
    println!("{} at {}, LOA {} m", operation, location, loa.trim());
    match outcome {
        LookupOutcome::Matched(req) => {
            println!("Tugs required: {}", req.tugs_required);
            println!("LOA band:      {}", or_dash(&req.band_label));
            println!("Rule:          {}", or_dash(&req.rule_text));
            println!("Notes:         {}", or_dash(&req.notes_text));
        }
        LookupOutcome::NoMatch => {
            eprintln!("No matching LOA band found for this location.");
            println!("Tugs required: {}", or_dash(""));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_query() {
        let parsed = parse_args(&args(&["--unberthing", "Bay Terminal", "182.5"])).unwrap();
        assert_eq!(parsed.operation, Operation::Unberthing);
        assert_eq!(parsed.location.as_deref(), Some("Bay Terminal"));
        assert_eq!(parsed.loa.as_deref(), Some("182.5"));
        assert!(!parsed.json);
    }

    #[test]
    fn test_parse_defaults_to_berthing() {
        let parsed = parse_args(&args(&["--json", "Fairport", "75"])).unwrap();
        assert_eq!(parsed.operation, Operation::Berthing);
        assert!(parsed.json);
    }

    #[test]
    fn test_parse_locations() {
        let parsed = parse_args(&args(&["--locations"])).unwrap();
        assert!(parsed.list_locations);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["Fairport"])).is_err());
        assert!(parse_args(&args(&["--tow", "Fairport", "75"])).is_err());
        assert!(parse_args(&args(&["Fairport", "75", "extra"])).is_err());
    }
}
