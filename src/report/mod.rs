//! Reporting utilities: run summaries and formatted terminal output.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::aggregate::Bucket;
use crate::app::pipeline::DashboardView;
use crate::domain::{DashboardConfig, DateRange, IdentifierField, MeasurementFamily};
use crate::io::ingest::IngestReport;

pub mod format;

pub use format::*;

/// Machine-readable summary of one pipeline run (`sales summary --json`).
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub source: PathBuf,
    pub range: DateRange,
    pub bucket_days: i64,
    pub group_by: IdentifierField,
    pub selections: BTreeMap<IdentifierField, Vec<String>>,
    pub records: usize,
    pub items: usize,
    pub total_sales: f64,
    /// Sum of per-bucket restock magnitudes.
    pub total_restocks: f64,
    pub buckets: Vec<Bucket>,
}

impl Summary {
    pub fn new(report: &IngestReport, view: &DashboardView, config: &DashboardConfig) -> Self {
        let selections = view
            .selections
            .active()
            .map(|(field, values)| (field, values.iter().cloned().collect()))
            .collect();

        Self {
            source: report.source.clone(),
            range: view.range,
            bucket_days: config.bucket.days(),
            group_by: config.group_by,
            selections,
            records: view.filtered.len(),
            items: view.filtered.item_count(),
            total_sales: view.buckets.total(MeasurementFamily::Sales),
            total_restocks: view.buckets.total(MeasurementFamily::Restocks),
            buckets: view.buckets.buckets.clone(),
        }
    }
}
