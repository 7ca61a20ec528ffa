//! CSV ingest and wide-to-long reshaping.
//!
//! This module is responsible for turning a wide sales/restock export (one
//! column per date and metric) into a clean long table with one row per
//! `(identity, date)`.
//!
//! Design goals:
//! - **Strict schema** for identifier columns (clear errors + exit code 2)
//! - **Lenient date columns**: a measurement column whose date-token does not
//!   parse is treated as "not a date column" and dropped (reported, not fatal)
//! - **Deterministic behavior**: output order does not depend on thread scheduling
//! - **Separation of concerns**: no filtering or aggregation here

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{IdentifierField, Identity, LongRecord, LongTable, MeasurementFamily};
use crate::error::PipelineError;

/// Cell spellings treated as missing values (compared case-insensitively).
const NA_VALUES: [&str; 7] = ["", "na", "n/a", "nan", "null", "none", "#n/a"];

/// A measurement column discovered in the header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementColumn {
    /// Position in the CSV record.
    pub index: usize,
    /// Normalized header name.
    pub header: String,
    pub family: MeasurementFamily,
    /// Header with the family suffix stripped.
    pub token: String,
    /// Parsed date, `None` when the token is not a calendar date.
    pub date: Option<NaiveDate>,
}

/// Result of schema inference over a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    /// Column index per identifier field, in `IdentifierField::ALL` order.
    identifiers: [usize; 6],
    sales: Vec<MeasurementColumn>,
    restocks: Vec<MeasurementColumn>,
}

impl TableSchema {
    pub fn identifier_index(&self, field: IdentifierField) -> usize {
        let pos = IdentifierField::ALL
            .iter()
            .position(|f| *f == field)
            .unwrap_or_default();
        self.identifiers[pos]
    }

    /// All columns of a family, including ones with unparseable date-tokens.
    pub fn columns(&self, family: MeasurementFamily) -> &[MeasurementColumn] {
        match family {
            MeasurementFamily::Sales => &self.sales,
            MeasurementFamily::Restocks => &self.restocks,
        }
    }

    /// Columns of a family whose date-token parsed.
    pub fn dated_columns(&self, family: MeasurementFamily) -> impl Iterator<Item = (usize, NaiveDate)> + '_ {
        self.columns(family)
            .iter()
            .filter_map(|c| c.date.map(|d| (c.index, d)))
    }

    /// Columns dropped because their date-token did not parse.
    pub fn discarded_columns(&self) -> impl Iterator<Item = &MeasurementColumn> {
        self.sales
            .iter()
            .chain(self.restocks.iter())
            .filter(|c| c.date.is_none())
    }
}

/// Diagnostics collected while loading (informational only).
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub source: PathBuf,
    pub raw_headers: Vec<String>,
    pub normalized_headers: Vec<String>,
    pub rows_read: usize,
    pub rows_dropped_missing_id: usize,
    pub sales_columns: usize,
    pub restock_columns: usize,
    /// Measurement headers whose date-token did not parse.
    pub discarded_columns: Vec<String>,
    /// Non-numeric measurement cells that were treated as 0.
    pub invalid_cells: usize,
    pub records: usize,
}

/// Ingest output: the long table plus load diagnostics.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub table: LongTable,
    pub report: IngestReport,
}

/// Load a wide CSV export from disk and reshape it to long format.
pub fn load(path: &Path) -> Result<Ingested, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    load_from_reader(file, path)
}

/// Load from any reader. `source` is only used for error messages and the report.
pub fn load_from_reader<R: Read>(reader: R, source: &Path) -> Result<Ingested, PipelineError> {
    let file_err = |message: String| PipelineError::FileRead {
        path: source.to_path_buf(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| file_err(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let raw_headers: Vec<String> = headers.iter().map(str::to_string).collect();
    let normalized_headers: Vec<String> = raw_headers.iter().map(|h| normalize_header_name(h)).collect();
    info!(source = %source.display(), columns = ?raw_headers, "raw column names");
    debug!(columns = ?normalized_headers, "normalized column names");

    let schema = infer_schema(&normalized_headers)?;

    let mut report = IngestReport {
        source: source.to_path_buf(),
        raw_headers,
        normalized_headers,
        sales_columns: schema.columns(MeasurementFamily::Sales).len(),
        restock_columns: schema.columns(MeasurementFamily::Restocks).len(),
        discarded_columns: schema.discarded_columns().map(|c| c.header.clone()).collect(),
        ..IngestReport::default()
    };

    if !report.discarded_columns.is_empty() {
        debug!(columns = ?report.discarded_columns, "ignoring measurement columns without a parseable date");
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: header line plus 1-based line numbers.
        let line = idx + 2;
        let record = result.map_err(|e| file_err(format!("CSV parse error at line {line}: {e}")))?;
        report.rows_read += 1;

        match parse_identity(&record, &schema) {
            Some(identity) => rows.push((identity, record)),
            None => report.rows_dropped_missing_id += 1,
        }
    }

    if report.rows_dropped_missing_id > 0 {
        info!(
            dropped = report.rows_dropped_missing_id,
            "dropped rows with missing identifier values"
        );
    }

    let (table, invalid_cells) = reshape(&rows, &schema);
    report.invalid_cells = invalid_cells;
    report.records = table.len();

    if invalid_cells > 0 {
        warn!(invalid_cells, "non-numeric measurement cells were treated as 0");
    }
    info!(
        rows = report.rows_read,
        records = report.records,
        sales_columns = report.sales_columns,
        restock_columns = report.restock_columns,
        "loaded long table"
    );

    Ok(Ingested { table, report })
}

/// Classify normalized header names into identifier and measurement columns.
///
/// Identifier columns are checked first, so a file missing both an identifier
/// and a measurement family reports the identifiers.
pub fn infer_schema(headers: &[String]) -> Result<TableSchema, PipelineError> {
    let mut header_map: BTreeMap<&str, usize> = BTreeMap::new();
    for (idx, name) in headers.iter().enumerate() {
        header_map.entry(name.as_str()).or_insert(idx);
    }

    let mut identifiers = [0usize; 6];
    let mut missing = Vec::new();
    for (slot, field) in identifiers.iter_mut().zip(IdentifierField::ALL) {
        match header_map.get(field.column_name()) {
            Some(idx) => *slot = *idx,
            None => missing.push(field.column_name().to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns { missing });
    }

    let mut sales = Vec::new();
    let mut restocks = Vec::new();
    for (index, header) in headers.iter().enumerate() {
        let Some(column) = classify_measurement(index, header) else {
            continue;
        };
        match column.family {
            MeasurementFamily::Sales => sales.push(column),
            MeasurementFamily::Restocks => restocks.push(column),
        }
    }

    if sales.is_empty() {
        return Err(PipelineError::MissingMeasurementFamily {
            family: MeasurementFamily::Sales,
        });
    }
    if restocks.is_empty() {
        return Err(PipelineError::MissingMeasurementFamily {
            family: MeasurementFamily::Restocks,
        });
    }

    Ok(TableSchema {
        identifiers,
        sales,
        restocks,
    })
}

fn classify_measurement(index: usize, header: &str) -> Option<MeasurementColumn> {
    MeasurementFamily::ALL.into_iter().find_map(|family| {
        let token = header.strip_suffix(family.suffix())?.trim();
        if token.is_empty() {
            return None;
        }
        Some(MeasurementColumn {
            index,
            header: header.to_string(),
            family,
            token: token.to_string(),
            date: parse_date_token(token),
        })
    })
}

pub fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿title"). If we don't strip it, schema validation will
    // incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}').trim();
    name.to_lowercase()
}

/// Parse the date embedded in a measurement column name.
///
/// ISO-like forms are tried first; for slash-separated day/month forms the
/// month-first reading wins when both are valid.
pub fn parse_date_token(token: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 6] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%Y.%m.%d", "%m/%d/%Y", "%d/%m/%Y"];

    // Tokens exported from datetime columns may carry a time part.
    let date_part = token
        .trim()
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or_default();

    FMTS.iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

fn is_missing(value: &str) -> bool {
    let value = value.trim();
    NA_VALUES.iter().any(|na| value.eq_ignore_ascii_case(na))
}

fn parse_identity(record: &StringRecord, schema: &TableSchema) -> Option<Identity> {
    let get = |field: IdentifierField| -> Option<String> {
        let value = record.get(schema.identifier_index(field))?.trim();
        if is_missing(value) {
            None
        } else {
            Some(value.to_string())
        }
    };

    Some(Identity {
        title: get(IdentifierField::Title)?,
        variation: get(IdentifierField::Variation)?,
        id: get(IdentifierField::Id)?,
        kind: get(IdentifierField::Type)?,
        country: get(IdentifierField::Country)?,
        channel: get(IdentifierField::Channel)?,
    })
}

/// Parse a measurement cell. Missing values are `Ok(None)`; garbage is `Err(())`.
fn parse_measurement(value: Option<&str>) -> Result<Option<f64>, ()> {
    let Some(value) = value else { return Ok(None) };
    if is_missing(value) {
        return Ok(None);
    }
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(()),
    }
}

/// Unpivot both families and outer-join them on `(identity, date)`.
///
/// Every dated column yields a record for every row, even when the cell is
/// empty: the missing metric is zero-filled. Returns the table and the number
/// of cells that failed to parse as numbers.
fn reshape(rows: &[(Identity, StringRecord)], schema: &TableSchema) -> (LongTable, usize) {
    let sales_cols: Vec<(usize, NaiveDate)> = schema.dated_columns(MeasurementFamily::Sales).collect();
    let restock_cols: Vec<(usize, NaiveDate)> = schema.dated_columns(MeasurementFamily::Restocks).collect();

    let per_row: Vec<(&Identity, BTreeMap<NaiveDate, (f64, f64)>, usize)> = rows
        .par_iter()
        .map(|(identity, record)| {
            let mut by_date: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
            let mut invalid = 0usize;

            for &(idx, date) in &sales_cols {
                let value = parse_measurement(record.get(idx)).unwrap_or_else(|_| {
                    invalid += 1;
                    None
                });
                by_date.entry(date).or_default().0 += value.unwrap_or(0.0);
            }
            for &(idx, date) in &restock_cols {
                let value = parse_measurement(record.get(idx)).unwrap_or_else(|_| {
                    invalid += 1;
                    None
                });
                by_date.entry(date).or_default().1 += value.unwrap_or(0.0);
            }

            (identity, by_date, invalid)
        })
        .collect();

    // Rows sharing an identity are merged so `(identity, date)` stays unique.
    let mut joined: BTreeMap<(&Identity, NaiveDate), (f64, f64)> = BTreeMap::new();
    let mut invalid_cells = 0usize;
    for (identity, by_date, invalid) in per_row {
        invalid_cells += invalid;
        for (date, (sales, restocks)) in by_date {
            let slot = joined.entry((identity, date)).or_default();
            slot.0 += sales;
            slot.1 += restocks;
        }
    }

    let records = joined
        .into_iter()
        .map(|((identity, date), (sales, restocks))| LongRecord {
            identity: identity.clone(),
            date,
            sales,
            restocks,
        })
        .collect();

    (LongTable::from_sorted(records), invalid_cells)
}
