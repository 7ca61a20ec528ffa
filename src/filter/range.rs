//! Date-range validation and clamping.

use chrono::NaiveDate;

use crate::domain::{DateRange, LongTable};
use crate::error::PipelineError;

impl DateRange {
    /// Check the range against the unfiltered table's `(min, max)` dates.
    ///
    /// Out-of-bounds ranges are rejected rather than clamped.
    pub fn validate(&self, bounds: (NaiveDate, NaiveDate)) -> Result<(), PipelineError> {
        let (min, max) = bounds;
        let reason = if self.start > self.end {
            Some("start is after end".to_string())
        } else if self.start < min {
            Some(format!("start is before the first data date {min}"))
        } else if self.end > max {
            Some(format!("end is after the last data date {max}"))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(PipelineError::DateRange {
                start: self.start,
                end: self.end,
                reason,
            }),
            None => Ok(()),
        }
    }

    /// The full range of a table, if it has any rows.
    pub fn of(table: &LongTable) -> Option<DateRange> {
        table
            .date_bounds()
            .map(|(start, end)| DateRange::new(start, end))
    }
}

/// Keep rows with `range.start <= date <= range.end` after validating the range.
pub fn clamp(
    table: &LongTable,
    range: DateRange,
    bounds: (NaiveDate, NaiveDate),
) -> Result<LongTable, PipelineError> {
    range.validate(bounds)?;
    let records = table
        .records()
        .iter()
        .filter(|r| range.contains(r.date))
        .cloned()
        .collect();
    Ok(LongTable::from_sorted(records))
}
