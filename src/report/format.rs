//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (important for snapshot-style tests)

use crate::aggregate::BucketedTable;
use crate::app::pipeline::DashboardView;
use crate::domain::{DashboardConfig, IdentifierField, LongTable, MeasurementFamily};
use crate::io::ingest::IngestReport;

/// Format what was detected while loading the file.
pub fn format_ingest_summary(report: &IngestReport, table: &LongTable) -> String {
    let mut out = String::new();

    out.push_str("=== sales - Sales & Restock Insight ===\n");
    out.push_str(&format!("Source: {}\n", report.source.display()));
    out.push_str(&format!("Columns (raw): {}\n", report.raw_headers.len()));
    out.push_str(&format!(
        "Measurement columns: sales={} | restocks={}\n",
        report.sales_columns, report.restock_columns
    ));
    if !report.discarded_columns.is_empty() {
        out.push_str(&format!(
            "Ignored (no date): {}\n",
            report.discarded_columns.join(", ")
        ));
    }
    out.push_str(&format!(
        "Rows: read={} | dropped (missing id)={}\n",
        report.rows_read, report.rows_dropped_missing_id
    ));
    if report.invalid_cells > 0 {
        out.push_str(&format!("Non-numeric cells treated as 0: {}\n", report.invalid_cells));
    }

    match table.date_bounds() {
        Some((min, max)) => out.push_str(&format!(
            "Long table: records={} | items={} | dates=[{min}, {max}]\n",
            table.len(),
            table.item_count()
        )),
        None => out.push_str("Long table: empty\n"),
    }

    out
}

/// Format the active filters, range and totals of one run.
pub fn format_run_summary(view: &DashboardView, config: &DashboardConfig) -> String {
    let mut out = String::new();

    out.push_str("\nFilters:\n");
    if view.selections.is_empty() {
        out.push_str("- (none)\n");
    }
    for (field, values) in view.selections.active() {
        let values: Vec<&str> = values.iter().map(String::as_str).collect();
        out.push_str(&format!("- {}: {}\n", field.display_name(), values.join(", ")));
    }

    out.push_str(&format!(
        "Range: {} (data: {}..{}) | bucket: {} | group by: {}\n",
        view.range,
        view.bounds.0,
        view.bounds.1,
        config.bucket.label(),
        config.group_by
    ));
    out.push_str(&format!(
        "Filtered: records={} | items={} | sales={} | restocks={}\n",
        view.filtered.len(),
        view.filtered.item_count(),
        fmt_num(view.buckets.total(MeasurementFamily::Sales)),
        fmt_num(view.buckets.total(MeasurementFamily::Restocks)),
    ));

    out
}

/// Format bucketed values for one metric.
pub fn format_buckets(buckets: &BucketedTable, metric: MeasurementFamily) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<24} {:<10} {:<10} {:>12}",
            buckets.group_by.column_name(),
            "start",
            "end",
            metric.name()
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<24} {:-<10} {:-<10} {:->12}", "", "", "", "").trim_end());
    out.push('\n');

    for b in &buckets.buckets {
        out.push_str(
            format!(
                "{:<24} {:<10} {:<10} {:>12}",
                truncate(&b.group, 24),
                b.start,
                b.end,
                fmt_num(b.value(metric))
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Format the first `limit` filtered records.
pub fn format_records(table: &LongTable, limit: usize) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<20} {:<10} {:<10} {:<10} {:<8} {:<8} {:<10} {:>10} {:>10}",
            "title", "variation", "id", "type", "country", "channel", "date", "sales", "restocks"
        )
        .trim_end(),
    );
    out.push('\n');

    for r in table.records().iter().take(limit) {
        let id = &r.identity;
        out.push_str(
            format!(
                "{:<20} {:<10} {:<10} {:<10} {:<8} {:<8} {:<10} {:>10} {:>10}",
                truncate(id.get(IdentifierField::Title), 20),
                truncate(&id.variation, 10),
                truncate(&id.id, 10),
                truncate(&id.kind, 10),
                truncate(&id.country, 8),
                truncate(&id.channel, 8),
                r.date,
                fmt_num(r.sales),
                fmt_num(r.restocks),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    if table.len() > limit {
        out.push_str(&format!("... {} more\n", table.len() - limit));
    }

    out
}

/// Integers print without decimals; everything else with two.
pub fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::aggregate::aggregate;
    use crate::domain::{BucketWidth, Identity, LongRecord};

    fn table() -> LongTable {
        let mk = |d: u32, sales: f64, restocks: f64| LongRecord {
            identity: Identity {
                title: "A".to_string(),
                variation: "red".to_string(),
                id: "1".to_string(),
                kind: "shoe".to_string(),
                country: "US".to_string(),
                channel: "web".to_string(),
            },
            date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            sales,
            restocks,
        };
        LongTable::new(vec![mk(1, 10.0, -5.0), mk(2, 0.5, 2.0), mk(8, 5.0, 0.0)])
    }

    #[test]
    fn bucket_table_layout() {
        let buckets = aggregate(&table(), IdentifierField::Title, BucketWidth::Days7);
        let txt = format_buckets(&buckets, MeasurementFamily::Sales);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("title"));
        assert!(lines[0].ends_with("sales"));
        assert!(lines[2].starts_with("A"));
        assert!(lines[2].contains("2024-01-01 2024-01-08"));
        assert!(lines[2].ends_with("10.50"));
        assert!(lines[3].ends_with(" 5"));

        let txt = format_buckets(&buckets, MeasurementFamily::Restocks);
        assert!(txt.lines().nth(2).unwrap().ends_with(" 3"));
    }

    #[test]
    fn records_are_limited() {
        let txt = format_records(&table(), 2);
        assert_eq!(txt.lines().count(), 4);
        assert!(txt.ends_with("... 1 more\n"));
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }

    #[test]
    fn numbers() {
        assert_eq!(fmt_num(3.0), "3");
        assert_eq!(fmt_num(-2.5), "-2.50");
    }
}
