//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory by the filter/aggregate pipeline
//! - exported to JSON/CSV
//! - held as session state by the TUI

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The fixed identifier columns that together describe one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierField {
    #[default]
    Title,
    Variation,
    Id,
    Type,
    Country,
    Channel,
}

impl IdentifierField {
    /// Every identifier column, in canonical (header) order.
    pub const ALL: [IdentifierField; 6] = [
        IdentifierField::Title,
        IdentifierField::Variation,
        IdentifierField::Id,
        IdentifierField::Type,
        IdentifierField::Country,
        IdentifierField::Channel,
    ];

    /// Fields offered as filters. `id` identifies a row but is not filterable.
    pub const FILTERABLE: [IdentifierField; 5] = [
        IdentifierField::Title,
        IdentifierField::Variation,
        IdentifierField::Type,
        IdentifierField::Country,
        IdentifierField::Channel,
    ];

    /// Normalized (lower-case) column name.
    pub fn column_name(self) -> &'static str {
        match self {
            IdentifierField::Title => "title",
            IdentifierField::Variation => "variation",
            IdentifierField::Id => "id",
            IdentifierField::Type => "type",
            IdentifierField::Country => "country",
            IdentifierField::Channel => "channel",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            IdentifierField::Title => "Title",
            IdentifierField::Variation => "Variation",
            IdentifierField::Id => "Id",
            IdentifierField::Type => "Type",
            IdentifierField::Country => "Country",
            IdentifierField::Channel => "Channel",
        }
    }

    pub fn is_filterable(self) -> bool {
        self != IdentifierField::Id
    }

    /// Next field in canonical order (wraps).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for IdentifierField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Which measurement family a column belongs to.
///
/// Also used as the metric selector for aggregated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementFamily {
    Sales,
    Restocks,
}

impl MeasurementFamily {
    pub const ALL: [MeasurementFamily; 2] = [MeasurementFamily::Sales, MeasurementFamily::Restocks];

    /// Column-name suffix, including the separator.
    pub fn suffix(self) -> &'static str {
        match self {
            MeasurementFamily::Sales => "_sales",
            MeasurementFamily::Restocks => "_restocks",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MeasurementFamily::Sales => "sales",
            MeasurementFamily::Restocks => "restocks",
        }
    }
}

impl fmt::Display for MeasurementFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The identifier tuple of one item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub title: String,
    pub variation: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub country: String,
    pub channel: String,
}

impl Identity {
    pub fn get(&self, field: IdentifierField) -> &str {
        match field {
            IdentifierField::Title => &self.title,
            IdentifierField::Variation => &self.variation,
            IdentifierField::Id => &self.id,
            IdentifierField::Type => &self.kind,
            IdentifierField::Country => &self.country,
            IdentifierField::Channel => &self.channel,
        }
    }
}

/// One `(identity, date)` observation after reshaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    pub identity: Identity,
    pub date: NaiveDate,
    pub sales: f64,
    pub restocks: f64,
}

impl LongRecord {
    pub fn value(&self, metric: MeasurementFamily) -> f64 {
        match metric {
            MeasurementFamily::Sales => self.sales,
            MeasurementFamily::Restocks => self.restocks,
        }
    }
}

/// Long-format table: one row per `(identity, date)`, sorted by identity then date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LongTable {
    records: Vec<LongRecord>,
}

impl LongTable {
    /// Build a table, sorting records into canonical order.
    pub fn new(mut records: Vec<LongRecord>) -> Self {
        records.sort_by(|a, b| a.identity.cmp(&b.identity).then(a.date.cmp(&b.date)));
        Self { records }
    }

    /// Build a table from records already in canonical order (e.g. a filtered subset).
    pub(crate) fn from_sorted(records: Vec<LongRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[LongRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inclusive `(min, max)` date present in the table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    /// Sorted distinct values of one identifier field.
    pub fn distinct(&self, field: IdentifierField) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.identity.get(field)).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Number of distinct identities.
    pub fn item_count(&self) -> usize {
        let set: BTreeSet<&Identity> = self.records.iter().map(|r| &r.identity).collect();
        set.len()
    }

    pub fn total(&self, metric: MeasurementFamily) -> f64 {
        self.records.iter().map(|r| r.value(metric)).sum()
    }
}

/// Selected values per filterable field. An empty (or absent) set means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selections {
    fields: BTreeMap<IdentifierField, BTreeSet<String>>,
}

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current selection for a field (empty when unrestricted).
    pub fn get(&self, field: IdentifierField) -> Option<&BTreeSet<String>> {
        self.fields.get(&field).filter(|set| !set.is_empty())
    }

    pub fn is_selected(&self, field: IdentifierField, value: &str) -> bool {
        self.fields.get(&field).is_some_and(|set| set.contains(value))
    }

    pub fn select(&mut self, field: IdentifierField, value: impl Into<String>) {
        self.fields.entry(field).or_default().insert(value.into());
    }

    pub fn deselect(&mut self, field: IdentifierField, value: &str) {
        self.retain(field, |v| v != value);
    }

    pub fn toggle(&mut self, field: IdentifierField, value: &str) {
        if self.is_selected(field, value) {
            self.deselect(field, value);
        } else {
            self.select(field, value);
        }
    }

    /// Replace the selection for `field` with every offered option.
    pub fn select_all<I, S>(&mut self, field: IdentifierField, options: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = options.into_iter().map(Into::into).collect();
        if set.is_empty() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, set);
        }
    }

    pub fn deselect_all(&mut self, field: IdentifierField) {
        self.fields.remove(&field);
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Keep only the values of `field` for which `keep` returns true.
    pub fn retain(&mut self, field: IdentifierField, mut keep: impl FnMut(&str) -> bool) {
        if let Some(set) = self.fields.get_mut(&field) {
            set.retain(|v| keep(v));
            if set.is_empty() {
                self.fields.remove(&field);
            }
        }
    }

    /// Fields with a non-empty selection.
    pub fn active(&self) -> impl Iterator<Item = (IdentifierField, &BTreeSet<String>)> {
        self.fields
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(field, set)| (*field, set))
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }
}

/// Bucket width for time aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum BucketWidth {
    #[default]
    #[serde(rename = "7")]
    #[value(name = "7")]
    Days7,
    #[serde(rename = "15")]
    #[value(name = "15")]
    Days15,
    #[serde(rename = "30")]
    #[value(name = "30")]
    Days30,
}

impl BucketWidth {
    pub fn days(self) -> i64 {
        match self {
            BucketWidth::Days7 => 7,
            BucketWidth::Days15 => 15,
            BucketWidth::Days30 => 30,
        }
    }

    pub fn next(self) -> Self {
        match self {
            BucketWidth::Days7 => BucketWidth::Days15,
            BucketWidth::Days15 => BucketWidth::Days30,
            BucketWidth::Days30 => BucketWidth::Days7,
        }
    }

    pub fn label(self) -> String {
        format!("{} days", self.days())
    }
}

/// Inclusive date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Parses `YYYY-MM-DD..YYYY-MM-DD` (a single date means a one-day range).
impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (start, end) = match s.split_once("..") {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (s, s),
        };
        let parse = |v: &str| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|e| format!("Invalid date '{v}' (expected YYYY-MM-DD): {e}"))
        };
        Ok(DateRange::new(parse(start)?, parse(end)?))
    }
}

/// Explicit per-interaction configuration for the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardConfig {
    pub selections: Selections,
    /// `None` means the whole data range.
    pub date_range: Option<DateRange>,
    pub bucket: BucketWidth,
    /// Identifier field that splits the chart series.
    pub group_by: IdentifierField,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_parses_span_and_single_day() {
        let r: DateRange = "2024-01-01..2024-01-31".parse().unwrap();
        assert_eq!(r, DateRange::new(date(2024, 1, 1), date(2024, 1, 31)));

        let r: DateRange = " 2024-02-03 ".parse().unwrap();
        assert_eq!(r.start, r.end);

        assert!("2024-13-01..2024-01-02".parse::<DateRange>().is_err());
    }

    #[test]
    fn selections_toggle_and_select_all() {
        let mut s = Selections::new();
        assert!(s.is_empty());

        s.toggle(IdentifierField::Country, "US");
        assert!(s.is_selected(IdentifierField::Country, "US"));
        s.toggle(IdentifierField::Country, "US");
        assert!(s.get(IdentifierField::Country).is_none());
        assert!(s.is_empty());

        s.select_all(IdentifierField::Channel, ["web", "store"]);
        assert_eq!(s.get(IdentifierField::Channel).map(|v| v.len()), Some(2));
        s.deselect_all(IdentifierField::Channel);
        assert!(s.is_empty());
    }

    #[test]
    fn retain_drops_empty_sets() {
        let mut s = Selections::new();
        s.select(IdentifierField::Title, "A");
        s.retain(IdentifierField::Title, |v| v != "A");
        assert!(s.is_empty());
        assert_eq!(s, Selections::new());
    }

    #[test]
    fn bucket_width_cycles() {
        let b = BucketWidth::default();
        assert_eq!(b.days(), 7);
        assert_eq!(b.next().days(), 15);
        assert_eq!(b.next().next().next(), b);
    }
}
