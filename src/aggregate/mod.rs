//! Bucketed time aggregation.
//!
//! The filtered date range is cut into contiguous, right-open buckets of a
//! fixed width anchored at the earliest date in the filtered table. Sales are
//! summed per `(group, bucket)`; restocks are summed and then reported as the
//! magnitude of the net total (source data may record restocks as negative
//! deltas).

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::domain::{BucketWidth, IdentifierField, LongTable, MeasurementFamily};

/// One `(group, time bucket)` aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub group: String,
    /// Inclusive start date.
    pub start: NaiveDate,
    /// Exclusive end date.
    pub end: NaiveDate,
    pub sales: f64,
    /// Absolute value of the summed restocks.
    pub restocks: f64,
}

impl Bucket {
    pub fn value(&self, metric: MeasurementFamily) -> f64 {
        match metric {
            MeasurementFamily::Sales => self.sales,
            MeasurementFamily::Restocks => self.restocks,
        }
    }
}

/// A chart series: one group's bucket values over time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub group: String,
    pub points: Vec<(NaiveDate, f64)>,
}

/// Aggregation output, sorted by bucket start then group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketedTable {
    pub group_by: IdentifierField,
    pub width: BucketWidth,
    /// First bucket start (the minimum date of the input), `None` when empty.
    pub origin: Option<NaiveDate>,
    pub buckets: Vec<Bucket>,
}

impl BucketedTable {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Sum of a metric over all buckets.
    pub fn total(&self, metric: MeasurementFamily) -> f64 {
        self.buckets.iter().map(|b| b.value(metric)).sum()
    }

    /// Split into one series per group (groups sorted ascending).
    pub fn series(&self, metric: MeasurementFamily) -> Vec<Series> {
        let mut by_group: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
        for b in &self.buckets {
            by_group
                .entry(b.group.as_str())
                .or_default()
                .push((b.start, b.value(metric)));
        }
        by_group
            .into_iter()
            .map(|(group, points)| Series {
                group: group.to_string(),
                points,
            })
            .collect()
    }

    /// `(min, max)` of a metric across buckets.
    pub fn value_bounds(&self, metric: MeasurementFamily) -> Option<(f64, f64)> {
        let mut iter = self.buckets.iter().map(|b| b.value(metric));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// First and last bucket start dates.
    pub fn start_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.buckets.first()?.start;
        let last = self.buckets.last()?.start;
        Some((first, last))
    }
}

/// Aggregate a (filtered) long table into fixed-width buckets per group.
///
/// An empty input yields an empty table; callers are expected to short-circuit
/// on empty input before rendering.
pub fn aggregate(table: &LongTable, group_by: IdentifierField, width: BucketWidth) -> BucketedTable {
    let days = width.days();
    let Some((origin, _)) = table.date_bounds() else {
        return BucketedTable {
            group_by,
            width,
            origin: None,
            buckets: Vec::new(),
        };
    };

    let mut sums: BTreeMap<(i64, &str), (f64, f64)> = BTreeMap::new();
    for r in table.records() {
        let index = (r.date - origin).num_days() / days;
        let slot = sums.entry((index, r.identity.get(group_by))).or_default();
        slot.0 += r.sales;
        slot.1 += r.restocks;
    }

    let buckets = sums
        .into_iter()
        .map(|((index, group), (sales, restocks))| {
            let start = origin + Duration::days(index * days);
            Bucket {
                group: group.to_string(),
                start,
                end: start + Duration::days(days),
                sales,
                restocks: restocks.abs(),
            }
        })
        .collect();

    BucketedTable {
        group_by,
        width,
        origin: Some(origin),
        buckets,
    }
}
