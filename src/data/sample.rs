//! Synthetic wide sales/restock export generation.
//!
//! Produces a deterministic (seeded) table in the same wide layout the
//! ingest step expects: identifier columns followed by interleaved
//! `<date>_sales` / `<date>_restocks` columns. Useful for demos and tests.

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Normal, Poisson};

use crate::domain::IdentifierField;
use crate::error::AppError;

const TITLES: [&str; 6] = [
    "Trail Runner",
    "City Sneaker",
    "Canvas Tote",
    "Rain Shell",
    "Wool Beanie",
    "Travel Mug",
];
const VARIATIONS: [&str; 4] = ["black", "navy", "olive", "sand"];
const TYPES: [&str; 3] = ["apparel", "footwear", "accessory"];
const COUNTRIES: [&str; 4] = ["US", "DE", "JP", "FR"];
const CHANNELS: [&str; 2] = ["web", "retail"];

/// Settings for a synthetic export.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// Number of item rows.
    pub items: usize,
    /// First date column.
    pub start: NaiveDate,
    /// Number of date columns per family.
    pub periods: usize,
    /// Days between consecutive date columns.
    pub step_days: i64,
    pub seed: u64,
    /// Record restocks as negative deltas (as some inventory exports do).
    pub negative_restocks: bool,
}

/// A generated wide table (header + string cells).
#[derive(Debug, Clone)]
pub struct WideSample {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn generate_sample(config: &SampleConfig) -> Result<WideSample, AppError> {
    if config.items == 0 {
        return Err(AppError::new(2, "Sample item count must be > 0."));
    }
    if config.periods == 0 {
        return Err(AppError::new(2, "Sample period count must be > 0."));
    }
    if config.step_days <= 0 {
        return Err(AppError::new(2, "Sample step must be at least one day."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, 0.25)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let dates = (0..config.periods)
        .map(|i| {
            i64::try_from(i)
                .ok()
                .and_then(|i| i.checked_mul(config.step_days))
                .and_then(Duration::try_days)
                .and_then(|offset| config.start.checked_add_signed(offset))
                .ok_or_else(|| {
                    AppError::new(
                        2,
                        format!(
                            "Sample dates overflow the calendar ({} periods of {} days from {}).",
                            config.periods, config.step_days, config.start
                        ),
                    )
                })
        })
        .collect::<Result<Vec<NaiveDate>, AppError>>()?;

    let mut headers: Vec<String> = IdentifierField::ALL
        .iter()
        .map(|f| f.column_name().to_string())
        .collect();
    for d in &dates {
        headers.push(format!("{d}_sales"));
        headers.push(format!("{d}_restocks"));
    }

    let mut rows = Vec::with_capacity(config.items);
    for i in 0..config.items {
        let title = TITLES[i % TITLES.len()];
        let variation = VARIATIONS[(i / TITLES.len()) % VARIATIONS.len()];
        let kind = TYPES[i % TYPES.len()];
        let country = *COUNTRIES.choose(&mut rng).unwrap_or(&COUNTRIES[0]);
        let channel = *CHANNELS.choose(&mut rng).unwrap_or(&CHANNELS[0]);

        let mut row = vec![
            title.to_string(),
            variation.to_string(),
            format!("SKU-{:04}", i + 1),
            kind.to_string(),
            country.to_string(),
            channel.to_string(),
        ];

        // Per-item base demand with a mild trend; restock roughly every 4 periods.
        let base = rng.gen_range(2.0..20.0_f64);
        let trend = rng.gen_range(-0.03..0.05_f64);
        let mut stock_gap = 0.0_f64;
        for p in 0..config.periods {
            let level = (base * (1.0 + trend * p as f64)).max(0.5);
            let lambda = (level * (1.0 + noise.sample(&mut rng))).max(0.1);
            let demand = Poisson::new(lambda)
                .map_err(|e| AppError::new(4, format!("Demand distribution error: {e}")))?;
            let sales: f64 = demand.sample(&mut rng);
            stock_gap += sales;

            let restock = if p % 4 == 3 || rng.gen_bool(0.1) {
                let qty = stock_gap.round();
                stock_gap = 0.0;
                if config.negative_restocks { -qty } else { qty }
            } else {
                0.0
            };

            row.push(format!("{sales}"));
            // Leave some restock cells empty, as real exports do.
            row.push(if restock == 0.0 && rng.gen_bool(0.3) {
                String::new()
            } else {
                format!("{restock}")
            });
        }
        rows.push(row);
    }

    Ok(WideSample { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SampleConfig {
        SampleConfig {
            items: 8,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            periods: 10,
            step_days: 1,
            seed: 7,
            negative_restocks: true,
        }
    }

    #[test]
    fn layout_is_interleaved_wide() {
        let sample = generate_sample(&config()).unwrap();
        assert_eq!(sample.headers.len(), 6 + 2 * 10);
        assert_eq!(sample.headers[6], "2024-01-01_sales");
        assert_eq!(sample.headers[7], "2024-01-01_restocks");
        assert_eq!(sample.rows.len(), 8);
        assert!(sample.rows.iter().all(|r| r.len() == sample.headers.len()));
    }

    #[test]
    fn same_seed_same_output() {
        let a = generate_sample(&config()).unwrap();
        let b = generate_sample(&config()).unwrap();
        assert_eq!(a.rows, b.rows);
    }

    #[test]
    fn dates_past_the_calendar_are_an_error() {
        let mut c = config();
        c.step_days = i64::MAX / 2;
        let err = generate_sample(&c).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("Sample dates overflow"));
    }

    #[test]
    fn rejects_empty_config() {
        let mut c = config();
        c.items = 0;
        assert!(generate_sample(&c).is_err());
    }
}
