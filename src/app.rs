//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads the wide export (or asks for one)
//! - runs the dashboard pipeline and prints reports/plots
//! - writes optional exports and synthetic samples

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::cli::{Command, DashboardArgs, ExportArgs, SampleArgs, SummaryArgs};
use crate::data::{SampleConfig, generate_sample};
use crate::domain::{DashboardConfig, MeasurementFamily};
use crate::error::AppError;
use crate::io::ingest::{self, Ingested};

pub mod pipeline;

/// Entry point for the `sales` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may provide SALES_CSV / SALES_LOG / SALES_LOG_FILE.
    dotenvy::dotenv().ok();

    // We want `sales` and `sales -f export.csv` to behave like `sales tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match &cli.command {
        Command::Tui(_) => {
            if let Some(path) = &cli.log_file {
                crate::logging::init_file(path, cli.verbose)?;
            }
        }
        _ => crate::logging::init_stderr(cli.verbose),
    }

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Summary(args) => handle_summary(args),
        Command::Export(args) => handle_export(args),
        Command::Sample(args) => handle_sample(args),
    }
}

/// Use `-f`/`SALES_CSV` when given, otherwise fall back to the interactive picker.
pub fn resolve_input(args: &DashboardArgs) -> Result<PathBuf, AppError> {
    match &args.file {
        Some(path) => crate::cli::picker::validate_csv_path(path),
        None => crate::cli::picker::prompt_for_csv_path(),
    }
}

fn load_with_config(args: &DashboardArgs) -> Result<(Ingested, DashboardConfig), AppError> {
    let path = resolve_input(args)?;
    let ingested = ingest::load(&path)?;
    let config = args.to_config(ingested.table.date_bounds());
    pipeline::validate_selections(&ingested.table, &config.selections)?;
    Ok((ingested, config))
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let (ingested, config) = load_with_config(&args.dashboard)?;
    let view = pipeline::run_view(&ingested.table, &config)?;

    if args.json {
        let summary = crate::report::Summary::new(&ingested.report, &view, &config);
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| AppError::new(2, format!("Failed to serialize summary: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    print!("{}", crate::report::format_ingest_summary(&ingested.report, &ingested.table));
    println!("{}", crate::report::format_run_summary(&view, &config));

    for metric in MeasurementFamily::ALL {
        println!("{}", crate::report::format_buckets(&view.buckets, metric));
        if !args.no_plot {
            let plot = crate::plot::render_ascii_plot(&view.buckets, metric, args.width, args.height);
            println!("{plot}");
        }
    }

    if args.records > 0 {
        print!("{}", crate::report::format_records(&view.filtered, args.records));
    }
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    if args.records_out.is_none() && args.buckets_out.is_none() {
        return Err(AppError::new(
            2,
            "Nothing to export. Pass --records <CSV> and/or --buckets <CSV>.",
        ));
    }

    let (ingested, config) = load_with_config(&args.dashboard)?;
    let view = pipeline::run_view(&ingested.table, &config)?;

    if let Some(path) = &args.records_out {
        crate::io::export::write_long_csv(path, &view.filtered)?;
        info!(path = %path.display(), records = view.filtered.len(), "wrote filtered records");
        println!("Wrote {} records to {}", view.filtered.len(), path.display());
    }
    if let Some(path) = &args.buckets_out {
        crate::io::export::write_buckets_csv(path, &view.buckets)?;
        info!(path = %path.display(), buckets = view.buckets.len(), "wrote buckets");
        println!("Wrote {} buckets to {}", view.buckets.len(), path.display());
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        items: args.items,
        start: args.start,
        periods: args.periods,
        step_days: args.step_days,
        seed: args.seed,
        negative_restocks: !args.positive_restocks,
    };
    let sample = generate_sample(&config)?;
    crate::io::export::write_sample_csv(&args.output, &sample)?;
    println!(
        "Wrote {} items x {} dates to {}",
        sample.rows.len(),
        args.periods,
        args.output.display()
    );
    Ok(())
}

fn handle_tui(args: DashboardArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

/// Rewrite argv so `sales` defaults to `sales tui`.
///
/// Rules:
/// - `sales`                      -> `sales tui`
/// - `sales -f x.csv ...`         -> `sales tui -f x.csv ...`
/// - `sales --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "summary" | "export" | "sample");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_the_dashboard() {
        assert_eq!(rewrite_args(args(&["sales"])), args(&["sales", "tui"]));
        assert_eq!(
            rewrite_args(args(&["sales", "-f", "x.csv"])),
            args(&["sales", "tui", "-f", "x.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for v in [&["sales", "summary", "-f", "x.csv"][..], &["sales", "--help"][..], &["sales", "sample"][..]] {
            assert_eq!(rewrite_args(args(v)), args(v));
        }
    }
}
