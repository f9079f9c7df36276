//! Terminal output for simulation results.
//!
//! # Modules
//!
//! - [`display`]: Text report for a single run, table for a sweep
//! - [`progress`]: Progress bar while a sweep runs

pub mod display;
pub mod progress;
