//! Input/output helpers.
//!
//! - CSV ingest + wide-to-long reshape (`ingest`)
//! - per-path load cache (`cache`)
//! - CSV exports (`export`)

pub mod cache;
pub mod export;
pub mod ingest;

pub use cache::*;
pub use export::*;
pub use ingest::*;
