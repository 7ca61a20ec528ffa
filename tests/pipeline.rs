use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use sales_insight::app::pipeline::run_view;
use sales_insight::data::{generate_sample, SampleConfig};
use sales_insight::domain::{
    BucketWidth, DashboardConfig, DateRange, IdentifierField, MeasurementFamily, Selections,
};
use sales_insight::error::{AppError, PipelineError};
use sales_insight::io::{load, write_buckets_csv, write_long_csv, write_sample_csv, LoadCache};

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn sample_config() -> SampleConfig {
    SampleConfig {
        items: 12,
        start: date(1, 1),
        periods: 30,
        step_days: 1,
        seed: 11,
        negative_restocks: true,
    }
}

fn write_sample(dir: &Path) -> std::path::PathBuf {
    let sample = generate_sample(&sample_config()).unwrap();
    let path = dir.join("sample.csv");
    write_sample_csv(&path, &sample).unwrap();
    path
}

#[test]
fn generated_export_reshapes_to_one_record_per_item_and_date() {
    let dir = tempfile::tempdir().unwrap();
    let ingested = load(&write_sample(dir.path())).unwrap();

    assert_eq!(ingested.report.rows_read, 12);
    assert_eq!(ingested.report.sales_columns, 30);
    assert_eq!(ingested.report.restock_columns, 30);
    assert_eq!(ingested.report.invalid_cells, 0);
    assert_eq!(ingested.table.len(), 12 * 30);
    assert_eq!(ingested.table.date_bounds(), Some((date(1, 1), date(1, 30))));
}

#[test]
fn default_view_covers_everything_and_conserves_sales() {
    let dir = tempfile::tempdir().unwrap();
    let ingested = load(&write_sample(dir.path())).unwrap();

    let view = run_view(&ingested.table, &DashboardConfig::default()).unwrap();
    assert_eq!(view.filtered.len(), ingested.table.len());
    assert_eq!(view.range, DateRange::new(date(1, 1), date(1, 30)));

    // Sales are whole units, so the sums are exact.
    assert_eq!(
        view.buckets.total(MeasurementFamily::Sales),
        ingested.table.total(MeasurementFamily::Sales)
    );

    // 30 days in 7-day buckets: starts on 1, 8, 15, 22, 29.
    let starts: std::collections::BTreeSet<NaiveDate> = view.buckets.buckets.iter().map(|b| b.start).collect();
    assert_eq!(
        starts.into_iter().collect::<Vec<_>>(),
        vec![date(1, 1), date(1, 8), date(1, 15), date(1, 22), date(1, 29)]
    );
    assert!(view.buckets.buckets.iter().all(|b| b.restocks >= 0.0));
}

#[test]
fn filters_range_and_bucket_combine() {
    let dir = tempfile::tempdir().unwrap();
    let ingested = load(&write_sample(dir.path())).unwrap();
    let table = &ingested.table;

    let title = table.distinct(IdentifierField::Title)[0].clone();
    let mut selections = Selections::new();
    selections.select(IdentifierField::Title, title.clone());

    let config = DashboardConfig {
        selections,
        date_range: Some(DateRange::new(date(1, 10), date(1, 20))),
        bucket: BucketWidth::Days15,
        group_by: IdentifierField::Country,
    };
    let view = run_view(table, &config).unwrap();

    assert!(view.filtered.records().iter().all(|r| r.identity.title == title));
    assert!(view.filtered.records().iter().all(|r| config.date_range.unwrap().contains(r.date)));
    assert_eq!(view.options(IdentifierField::Title), table.distinct(IdentifierField::Title).as_slice());
    assert_eq!(view.buckets.origin, Some(date(1, 10)));
    assert!(view.buckets.buckets.iter().all(|b| b.end - b.start == chrono::Duration::days(15)));
}

#[test]
fn exports_write_filtered_records_and_buckets() {
    let dir = tempfile::tempdir().unwrap();
    let ingested = load(&write_sample(dir.path())).unwrap();
    let config = DashboardConfig {
        date_range: Some(DateRange::new(date(1, 1), date(1, 7))),
        ..DashboardConfig::default()
    };
    let view = run_view(&ingested.table, &config).unwrap();

    let records = dir.path().join("records.csv");
    let buckets = dir.path().join("buckets.csv");
    write_long_csv(&records, &view.filtered).unwrap();
    write_buckets_csv(&buckets, &view.buckets).unwrap();

    let text = fs::read_to_string(&records).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("title,variation,id,type,country,channel,date,sales,restocks")
    );
    assert_eq!(lines.count(), 12 * 7);

    let text = fs::read_to_string(&buckets).unwrap();
    assert!(text.starts_with("title,bucket_start,bucket_end,sales,restocks\n"));
    assert_eq!(text.lines().count(), 1 + view.buckets.len());
}

#[test]
fn cache_reuses_loaded_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path());

    let mut cache = LoadCache::new();
    let a = cache.get_or_load(&path).unwrap();
    let b = cache.get_or_load(&path).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 1);
}

#[test]
fn input_errors_map_to_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(&path, "title,variation,id,type,2024-01-01_sales,2024-01-01_restocks\n").unwrap();

    let err = load(&path).unwrap_err();
    assert_eq!(
        err,
        PipelineError::MissingColumns {
            missing: vec!["country".to_string(), "channel".to_string()]
        }
    );
    assert_eq!(AppError::from(err).exit_code(), 2);

    let missing = load(&dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(missing, PipelineError::FileRead { .. }));
}

#[test]
fn out_of_bounds_range_is_rejected_before_filtering() {
    let dir = tempfile::tempdir().unwrap();
    let ingested = load(&write_sample(dir.path())).unwrap();
    let config = DashboardConfig {
        date_range: Some(DateRange::new(date(1, 1), date(3, 1))),
        ..DashboardConfig::default()
    };
    let err = run_view(&ingested.table, &config).unwrap_err();
    assert!(matches!(err, PipelineError::DateRange { .. }));
    assert_eq!(AppError::from(err).exit_code(), 2);
}
