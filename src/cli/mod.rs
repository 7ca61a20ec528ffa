//! Command-line parsing for the sales/restock dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{BucketWidth, DashboardConfig, DateRange, IdentifierField, Selections};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sales", version, about = "Sales & restock insight dashboard for wide CSV exports")]
pub struct Cli {
    /// Log more (info level). `SALES_LOG` / `RUST_LOG` take precedence.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Write logs to this file (the TUI only logs when this is set).
    #[arg(long, global = true, env = "SALES_LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (default).
    Tui(DashboardArgs),
    /// Print the bucketed sales/restock tables and plots for the given filters.
    Summary(SummaryArgs),
    /// Write filtered records and/or bucketed aggregates to CSV.
    Export(ExportArgs),
    /// Generate a synthetic wide export for demos.
    Sample(SampleArgs),
}

/// Input file, filters, date range and bucketing shared by all data commands.
#[derive(Debug, Args, Clone, Default)]
pub struct DashboardArgs {
    /// Wide CSV export to load. Without it, an interactive picker lists `*.csv` files.
    #[arg(short = 'f', long, env = "SALES_CSV", value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// Keep only these titles (repeatable).
    #[arg(long, value_name = "VALUE")]
    pub title: Vec<String>,

    /// Keep only these variations (repeatable).
    #[arg(long, value_name = "VALUE")]
    pub variation: Vec<String>,

    /// Keep only these types (repeatable).
    #[arg(long = "type", value_name = "VALUE")]
    pub kind: Vec<String>,

    /// Keep only these countries (repeatable).
    #[arg(long, value_name = "VALUE")]
    pub country: Vec<String>,

    /// Keep only these channels (repeatable).
    #[arg(long, value_name = "VALUE")]
    pub channel: Vec<String>,

    /// First date to include (YYYY-MM-DD). Defaults to the first data date.
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD). Defaults to the last data date.
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Bucket width in days.
    #[arg(short = 'b', long, value_enum, default_value_t = BucketWidth::Days7)]
    pub bucket: BucketWidth,

    /// Identifier field that splits the chart series.
    #[arg(short = 'g', long, value_enum, default_value_t = IdentifierField::Title)]
    pub group_by: IdentifierField,
}

impl DashboardArgs {
    /// Build the pipeline config. A missing range end defaults to the data bound.
    pub fn to_config(&self, bounds: Option<(NaiveDate, NaiveDate)>) -> DashboardConfig {
        let mut selections = Selections::new();
        let fields = [
            (IdentifierField::Title, &self.title),
            (IdentifierField::Variation, &self.variation),
            (IdentifierField::Type, &self.kind),
            (IdentifierField::Country, &self.country),
            (IdentifierField::Channel, &self.channel),
        ];
        for (field, values) in fields {
            for v in values {
                selections.select(field, v.trim());
            }
        }

        let date_range = match (self.start, self.end, bounds) {
            (None, None, _) => None,
            (Some(start), Some(end), _) => Some(DateRange::new(start, end)),
            (Some(start), None, Some((_, max))) => Some(DateRange::new(start, max)),
            (None, Some(end), Some((min, _))) => Some(DateRange::new(min, end)),
            (Some(d), None, None) | (None, Some(d), None) => Some(DateRange::new(d, d)),
        };

        DashboardConfig {
            selections,
            date_range,
            bucket: self.bucket,
            group_by: self.group_by,
        }
    }
}

/// Options for `sales summary`.
#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub dashboard: DashboardArgs,

    /// Print a JSON summary instead of text tables.
    #[arg(long)]
    pub json: bool,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Number of filtered records to print (0 disables the table).
    #[arg(long, default_value_t = 20)]
    pub records: usize,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for `sales export`.
#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub dashboard: DashboardArgs,

    /// Write the filtered, unaggregated long records here.
    #[arg(long = "records", value_name = "CSV")]
    pub records_out: Option<PathBuf>,

    /// Write the bucketed aggregates here.
    #[arg(long = "buckets", value_name = "CSV")]
    pub buckets_out: Option<PathBuf>,
}

/// Options for `sales sample`.
#[derive(Debug, Args)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short = 'o', long, value_name = "CSV", default_value = "sample_sales.csv")]
    pub output: PathBuf,

    /// Number of item rows.
    #[arg(long, default_value_t = 24)]
    pub items: usize,

    /// First date column (YYYY-MM-DD).
    #[arg(long, default_value = "2024-01-01")]
    pub start: NaiveDate,

    /// Number of date columns per metric.
    #[arg(long, default_value_t = 90)]
    pub periods: usize,

    /// Days between date columns.
    #[arg(long, default_value_t = 1)]
    pub step_days: i64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Record restocks as positive quantities instead of negative deltas.
    #[arg(long)]
    pub positive_restocks: bool,
}
