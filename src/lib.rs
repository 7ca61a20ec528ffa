//! `sales-insight` library crate.
//!
//! The binary (`sales`) is a thin wrapper around this library so that the
//! load/filter/aggregate pipeline is testable without spawning processes or
//! a terminal.

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod filter;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod tui;
