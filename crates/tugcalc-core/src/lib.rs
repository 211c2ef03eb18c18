//! Core library for tugcalc.
//!
//! Looks up the minimum number of tugs required to berth or unberth a
//! vessel, given a location and the vessel's length overall (LOA), from a
//! hand-maintained reference table. The table and the application shell
//! stay available offline through a versioned asset cache.

pub mod config;
pub mod dataset;
pub mod lookup;
pub mod models;
pub mod offline;
pub mod service;
pub mod utils;

pub use config::Config;
pub use dataset::{Dataset, ParseError};
pub use lookup::{compute_result, lookup, ValidationError};
pub use models::{Band, LookupOutcome, Operation, TugRequirement};
pub use service::{LoadError, TugCalc};
