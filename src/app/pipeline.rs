//! Shared "dashboard pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! validate range -> cross-filter options -> prune -> filter -> clamp -> aggregate
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).
//! Every step is a pure function of the loaded table and the config, so a
//! failed run leaves the caller's previous view untouched.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::aggregate::{BucketedTable, aggregate};
use crate::domain::{DashboardConfig, DateRange, IdentifierField, LongTable, Selections};
use crate::error::PipelineError;
use crate::filter;

/// All computed outputs of a single dashboard interaction.
#[derive(Debug, Clone)]
pub struct DashboardView {
    /// Selections after stale values were pruned.
    pub selections: Selections,
    /// Cross-filtered options per filterable field.
    pub options: Vec<(IdentifierField, Vec<String>)>,
    /// The effective date range (the whole data range when none was requested).
    pub range: DateRange,
    /// `(min, max)` date of the unfiltered table.
    pub bounds: (NaiveDate, NaiveDate),
    /// Filtered, unaggregated records.
    pub filtered: LongTable,
    pub buckets: BucketedTable,
}

impl DashboardView {
    pub fn options(&self, field: IdentifierField) -> &[String] {
        self.options
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, opts)| opts.as_slice())
            .unwrap_or_default()
    }
}

/// Run the pipeline for one interaction.
///
/// Range errors are reported before any filtering work, and an empty filter
/// result short-circuits with `EmptyResult` before aggregation.
pub fn run_view(table: &LongTable, config: &DashboardConfig) -> Result<DashboardView, PipelineError> {
    let bounds = table.date_bounds().ok_or(PipelineError::EmptyResult)?;
    let range = match config.date_range {
        Some(range) => {
            range.validate(bounds)?;
            range
        }
        None => DateRange::new(bounds.0, bounds.1),
    };

    let selections = filter::prune(table, &config.selections);
    if selections != config.selections {
        debug!(before = ?config.selections, after = ?selections, "pruned stale selections");
    }
    let options = filter::all_options(table, &selections);

    let selected = filter::apply(table, &selections);
    let filtered = filter::clamp(&selected, range, bounds)?;
    if filtered.is_empty() {
        return Err(PipelineError::EmptyResult);
    }

    let buckets = aggregate(&filtered, config.group_by, config.bucket);
    debug!(
        records = filtered.len(),
        buckets = buckets.len(),
        bucket_days = config.bucket.days(),
        "dashboard view computed"
    );

    Ok(DashboardView {
        selections,
        options,
        range,
        bounds,
        filtered,
        buckets,
    })
}

/// Reject selected values that do not occur anywhere in `table`.
///
/// Used for values supplied on the command line. `run_view` itself prunes
/// unreachable values without reporting them.
pub fn validate_selections(table: &LongTable, selections: &Selections) -> Result<(), PipelineError> {
    for (field, selected) in selections.active() {
        let known = table.distinct(field);
        let unknown: Vec<String> = selected
            .iter()
            .filter(|v| known.binary_search(*v).is_err())
            .cloned()
            .collect();
        if !unknown.is_empty() {
            warn!(%field, values = ?unknown, "filter values not present in the table");
            return Err(PipelineError::UnknownValues { field, values: unknown });
        }
    }
    Ok(())
}
