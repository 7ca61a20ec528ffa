//! CSV exports.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts:
//! - filtered long records (one row per identity and date)
//! - bucketed aggregates (one row per group and bucket)
//! - synthetic wide samples (`sales sample`)

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::aggregate::BucketedTable;
use crate::data::WideSample;
use crate::domain::{IdentifierField, LongTable};
use crate::error::PipelineError;

/// Write filtered long records to a CSV file.
pub fn write_long_csv(path: &Path, table: &LongTable) -> Result<(), PipelineError> {
    let file = create(path)?;
    write_long(file, table).map_err(|e| export_err(path, e))
}

/// Write bucketed aggregates to a CSV file.
pub fn write_buckets_csv(path: &Path, buckets: &BucketedTable) -> Result<(), PipelineError> {
    let file = create(path)?;
    write_buckets(file, buckets).map_err(|e| export_err(path, e))
}

/// Write a generated wide sample to a CSV file.
pub fn write_sample_csv(path: &Path, sample: &WideSample) -> Result<(), PipelineError> {
    let file = create(path)?;
    write_wide(file, sample).map_err(|e| export_err(path, e))
}

pub fn write_long<W: Write>(out: W, table: &LongTable) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header: Vec<&str> = IdentifierField::ALL.iter().map(|f| f.column_name()).collect();
    header.extend(["date", "sales", "restocks"]);
    writer.write_record(&header)?;

    for r in table.records() {
        let mut row: Vec<String> = IdentifierField::ALL
            .iter()
            .map(|f| r.identity.get(*f).to_string())
            .collect();
        row.push(r.date.to_string());
        row.push(r.sales.to_string());
        row.push(r.restocks.to_string());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_buckets<W: Write>(out: W, buckets: &BucketedTable) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([buckets.group_by.column_name(), "bucket_start", "bucket_end", "sales", "restocks"])?;

    for b in &buckets.buckets {
        writer.write_record([
            b.group.clone(),
            b.start.to_string(),
            b.end.to_string(),
            b.sales.to_string(),
            b.restocks.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_wide<W: Write>(out: W, sample: &WideSample) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&sample.headers)?;
    for row in &sample.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<File, PipelineError> {
    File::create(path).map_err(|e| PipelineError::Export {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn export_err(path: &Path, e: csv::Error) -> PipelineError {
    PipelineError::Export {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
