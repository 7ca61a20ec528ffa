use std::collections::HashMap;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use sales_insight::aggregate::aggregate;
use sales_insight::domain::{BucketWidth, IdentifierField, LongTable, MeasurementFamily, Selections};
use sales_insight::filter::{apply, options_for};
use sales_insight::io::load_from_reader;

const TITLES: [&str; 3] = ["Mug", "Shirt", "Lamp"];
const COUNTRIES: [&str; 2] = ["US", "DE"];
const CHANNELS: [&str; 2] = ["web", "retail"];

type Cells = Vec<Option<i16>>;

#[derive(Debug, Clone)]
struct WideRow {
    title: usize,
    country: usize,
    channel: usize,
    sales: Cells,
    restocks: Cells,
}

#[derive(Debug, Clone)]
struct Wide {
    dates: Vec<NaiveDate>,
    rows: Vec<WideRow>,
}

impl Wide {
    fn to_csv(&self) -> String {
        let mut out = String::from("title,variation,id,type,country,channel");
        for d in &self.dates {
            out.push_str(&format!(",{d}_sales,{d}_restocks"));
        }
        out.push('\n');

        let cell = |v: Option<i16>| v.map(|v| v.to_string()).unwrap_or_default();
        for (i, row) in self.rows.iter().enumerate() {
            out.push_str(&format!(
                "{},std,{i},goods,{},{}",
                TITLES[row.title], COUNTRIES[row.country], CHANNELS[row.channel]
            ));
            for (s, r) in row.sales.iter().zip(&row.restocks) {
                out.push_str(&format!(",{},{}", cell(*s), cell(*r)));
            }
            out.push('\n');
        }
        out
    }

    fn load(&self) -> LongTable {
        load_from_reader(self.to_csv().as_bytes(), Path::new("prop.csv"))
            .expect("generated table loads")
            .table
    }
}

fn wide() -> impl Strategy<Value = Wide> {
    prop::collection::btree_set(0i64..60, 1..6).prop_flat_map(|offsets| {
        let n = offsets.len();
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = offsets.into_iter().map(|o| base + Duration::days(o)).collect();
        let cells = || prop::collection::vec(prop::option::of(-50i16..50), n);
        let row = (0..TITLES.len(), 0..COUNTRIES.len(), 0..CHANNELS.len(), cells(), cells()).prop_map(
            |(title, country, channel, sales, restocks)| WideRow {
                title,
                country,
                channel,
                sales,
                restocks,
            },
        );
        prop::collection::vec(row, 1..8).prop_map(move |rows| Wide {
            dates: dates.clone(),
            rows,
        })
    })
}

proptest! {
    #[test]
    fn reshape_matches_wide_cells(wide in wide()) {
        let table = wide.load();
        prop_assert_eq!(table.len(), wide.rows.len() * wide.dates.len());

        let date_idx: HashMap<NaiveDate, usize> =
            wide.dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        for r in table.records() {
            prop_assert!(IdentifierField::ALL.iter().all(|f| !r.identity.get(*f).is_empty()));
            prop_assert!(r.sales.is_finite() && r.restocks.is_finite());

            let row = &wide.rows[r.identity.id.parse::<usize>().unwrap()];
            let d = date_idx[&r.date];
            prop_assert_eq!(r.sales, f64::from(row.sales[d].unwrap_or(0)));
            prop_assert_eq!(r.restocks, f64::from(row.restocks[d].unwrap_or(0)));
        }
    }

    #[test]
    fn filtering_is_idempotent(wide in wide(), titles in prop::collection::vec(any::<bool>(), 3), country in 0..2usize) {
        let table = wide.load();
        let mut selections = Selections::new();
        for (i, keep) in titles.iter().enumerate() {
            if *keep {
                selections.select(IdentifierField::Title, TITLES[i]);
            }
        }
        selections.select(IdentifierField::Country, COUNTRIES[country]);

        let once = apply(&table, &selections);
        let twice = apply(&once, &selections);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn restricting_one_field_narrows_the_others(wide in wide(), country in 0..2usize) {
        let table = wide.load();
        let mut restricted = Selections::new();
        restricted.select(IdentifierField::Country, COUNTRIES[country]);

        for field in [IdentifierField::Title, IdentifierField::Channel] {
            let all = options_for(&table, &Selections::new(), field);
            let narrowed = options_for(&table, &restricted, field);
            prop_assert!(narrowed.iter().all(|v| all.contains(v)));
        }
        // A field's own selection never hides its options.
        prop_assert_eq!(
            options_for(&table, &restricted, IdentifierField::Country),
            options_for(&table, &Selections::new(), IdentifierField::Country)
        );
    }

    #[test]
    fn buckets_partition_records_and_conserve_sales(wide in wide()) {
        let table = wide.load();
        for width in [BucketWidth::Days7, BucketWidth::Days15, BucketWidth::Days30] {
            let buckets = aggregate(&table, IdentifierField::Country, width);

            for r in table.records() {
                let hits = buckets
                    .buckets
                    .iter()
                    .filter(|b| b.group == r.identity.country && b.start <= r.date && r.date < b.end)
                    .count();
                prop_assert_eq!(hits, 1);
            }
            for b in &buckets.buckets {
                prop_assert_eq!(b.end - b.start, Duration::days(width.days()));
                prop_assert!(b.restocks >= 0.0);
            }
            // Whole-number cells keep the float sums exact.
            prop_assert_eq!(
                buckets.total(MeasurementFamily::Sales),
                table.total(MeasurementFamily::Sales)
            );
        }
    }
}
