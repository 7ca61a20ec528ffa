//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - identifier/measurement vocabulary (`IdentifierField`, `MeasurementFamily`)
//! - the reshaped long table (`Identity`, `LongRecord`, `LongTable`)
//! - per-interaction configuration (`Selections`, `DateRange`, `BucketWidth`, `DashboardConfig`)

pub mod types;

pub use types::*;
