//! Data sources other than user-supplied exports.
//!
//! - synthetic wide exports for demos and tests (`sample`)

pub mod sample;

pub use sample::*;
