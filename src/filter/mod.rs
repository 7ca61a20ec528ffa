//! Selection filters with cross-filtered options.
//!
//! Options offered for a field are computed against the table filtered by every
//! *other* field's selection, so picking a value in one field narrows what the
//! other fields offer.

use crate::domain::{IdentifierField, LongRecord, LongTable, Selections};

pub mod range;

pub use range::*;

/// Keep rows whose value is selected for every field with a non-empty selection.
pub fn apply(table: &LongTable, selections: &Selections) -> LongTable {
    if selections.is_empty() {
        return table.clone();
    }
    let records = table
        .records()
        .iter()
        .filter(|r| matches(r, selections, None))
        .cloned()
        .collect();
    LongTable::from_sorted(records)
}

/// Sorted distinct values of `field` under every other field's selection.
pub fn options_for(table: &LongTable, selections: &Selections, field: IdentifierField) -> Vec<String> {
    let mut values: Vec<&str> = table
        .records()
        .iter()
        .filter(|r| matches(r, selections, Some(field)))
        .map(|r| r.identity.get(field))
        .collect();
    values.sort_unstable();
    values.dedup();
    values.into_iter().map(str::to_string).collect()
}

/// Options for every filterable field, in `IdentifierField::FILTERABLE` order.
pub fn all_options(table: &LongTable, selections: &Selections) -> Vec<(IdentifierField, Vec<String>)> {
    IdentifierField::FILTERABLE
        .into_iter()
        .map(|field| (field, options_for(table, selections, field)))
        .collect()
}

/// Drop selected values that are no longer reachable.
///
/// Fields are visited in `FILTERABLE` order and each field is checked against
/// the selections as already pruned for earlier fields.
pub fn prune(table: &LongTable, selections: &Selections) -> Selections {
    let mut pruned = selections.clone();
    for field in IdentifierField::FILTERABLE {
        if pruned.get(field).is_none() {
            continue;
        }
        let options = options_for(table, &pruned, field);
        pruned.retain(field, |v| options.binary_search_by(|o| o.as_str().cmp(v)).is_ok());
    }
    pruned
}

fn matches(record: &LongRecord, selections: &Selections, skip: Option<IdentifierField>) -> bool {
    selections
        .active()
        .filter(|(field, _)| Some(*field) != skip)
        .all(|(field, values)| values.contains(record.identity.get(field)))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::Identity;

    fn record(title: &str, country: &str, channel: &str) -> LongRecord {
        LongRecord {
            identity: Identity {
                title: title.to_string(),
                variation: "v".to_string(),
                id: format!("{title}-{country}-{channel}"),
                kind: "t".to_string(),
                country: country.to_string(),
                channel: channel.to_string(),
            },
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            sales: 1.0,
            restocks: 0.0,
        }
    }

    fn table() -> LongTable {
        LongTable::new(vec![
            record("A", "US", "web"),
            record("A", "DE", "store"),
            record("B", "US", "store"),
            record("C", "FR", "web"),
        ])
    }

    #[test]
    fn empty_selection_passes_everything() {
        let t = table();
        assert_eq!(apply(&t, &Selections::new()), t);
    }

    #[test]
    fn selections_intersect_across_fields() {
        let t = table();
        let mut s = Selections::new();
        s.select(IdentifierField::Country, "US");
        s.select(IdentifierField::Channel, "store");
        let out = apply(&t, &s);
        assert_eq!(out.distinct(IdentifierField::Title), vec!["B"]);
    }

    #[test]
    fn options_ignore_own_field_selection() {
        let t = table();
        let mut s = Selections::new();
        s.select(IdentifierField::Country, "US");

        // Country still offers every country.
        assert_eq!(options_for(&t, &s, IdentifierField::Country), vec!["DE", "FR", "US"]);
        // Title is narrowed to titles sold in the US.
        assert_eq!(options_for(&t, &s, IdentifierField::Title), vec!["A", "B"]);
    }

    #[test]
    fn prune_removes_unreachable_values() {
        let t = table();
        let mut s = Selections::new();
        s.select(IdentifierField::Title, "C");
        s.select(IdentifierField::Country, "US");

        // Title C is only sold in FR, so with country=US it is unreachable.
        let pruned = prune(&t, &s);
        assert!(pruned.get(IdentifierField::Title).is_none());
        assert!(pruned.is_selected(IdentifierField::Country, "US"));
    }

    #[test]
    fn prune_drops_values_absent_from_the_table() {
        let t = table();
        let mut s = Selections::new();
        s.select(IdentifierField::Channel, "catalog");
        s.select(IdentifierField::Channel, "web");
        let pruned = prune(&t, &s);
        assert_eq!(
            pruned.get(IdentifierField::Channel).map(|v| v.iter().cloned().collect::<Vec<_>>()),
            Some(vec!["web".to_string()])
        );
    }
}
