//! TradeSight: trade analytics CLI
//!
//! Runs the requested pipelines and writes one JSON result object to stdout.
//! Failures are reported as `{"error": "..."}` on stderr with a non-zero exit.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tradesight::output::error_payload;
use tradesight::{run, Args};

fn main() -> ExitCode {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(args.verbose);

    match run_cli(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", error_payload(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_cli(args: &Args) -> Result<ExitCode> {
    let config = args.engine_config().context("invalid engine configuration")?;
    let request = args.request();
    info!(pipelines = ?request.pipelines, "Starting analysis");

    let report = run(&request, &config);

    if report.all_failed() {
        let message = report
            .errors()
            .iter()
            .map(|(_, message)| *message)
            .collect::<Vec<_>>()
            .join("; ");
        eprintln!("{}", error_payload(&message));
        return Ok(ExitCode::FAILURE);
    }

    let json = report.to_json().context("failed to serialize report")?;
    let rendered = if args.compact {
        serde_json::to_string(&json)?
    } else {
        serde_json::to_string_pretty(&json)?
    };
    println!("{}", rendered);

    let errors = report.errors();
    for (section, message) in &errors {
        eprintln!("{}", serde_json::json!({ "error": message, "section": section }));
    }

    Ok(if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
